use crate::types::PalFx;

impl PalFx {
    /// Layers `other` (usually the scene wide effect) on top of this one.
    ///
    /// `blend == -2` is subtractive drawing: adds become subtractions and
    /// eat into the multipliers.
    pub fn synthesize(&mut self, other: &PalFx, blend: i32) {
        let eff = &mut self.eff;
        let o = &other.eff;

        if blend == -2 {
            for i in 0..3 {
                eff.add[i] = (eff.add[i] - o.add[i].abs()).clamp(0, 255);
                eff.mul[i] = (eff.mul[i] - o.add[i]).clamp(0, 255);
            }
        } else {
            for i in 0..3 {
                eff.add[i] += o.add[i];
            }
        }

        for i in 0..3 {
            eff.mul[i] = eff.mul[i].wrapping_mul(o.mul[i]) / 256;
        }

        eff.hue += o.hue;
        eff.color *= o.color;
        eff.invertall = eff.invertall != o.invertall;

        if !other.def.invertall {
            return;
        }

        let invertall = self.def.invertall;
        let invertblend = self.def.invertblend;

        // character blend inverse
        if other.def.invertblend == 1 {
            if blend != 0 && invertblend > -3 {
                eff.invertall = invertall;
            }

            match invertblend {
                0 => eff.invertblend = 1,
                1 => eff.invertblend = 0,
                -2 => {
                    if eff.invertall {
                        eff.invertall = false;
                        eff.invertblend = -2;
                    } else {
                        eff.invertblend = 3;
                    }
                }
                2 => {
                    eff.invertall = invertall;
                    eff.invertblend = -1;
                }
                -1 => {
                    eff.invertall = invertall;
                    eff.invertblend = 2;
                }
                _ => (),
            }
        }

        // background blend inverse
        if invertblend == -3 {
            if eff.invertall {
                eff.invertblend = 3;
            } else {
                eff.invertall = false;
                eff.invertblend = -3;
            }
        }
    }
}

/// The effect actually drawn with: `fx` combined with the scene wide `global`.
///
/// A missing or stopped `fx` draws with `global` alone, except in subtractive
/// blending where a neutral effect is synthesized with it instead. Neither
/// input is modified.
pub fn get_syn_fx(fx: Option<&PalFx>, global: &PalFx, blend: i32) -> PalFx {
    let base = match fx {
        Some(fx) if fx.eff.enable => fx.clone(),
        _ if blend == -2 && global.eff.enable => {
            let mut res = fx.cloned().unwrap_or_default();
            res.clear();

            res.eff.enable = true;
            res.eff.mul = res.def.mul;
            res.eff.add = res.def.add;
            res.eff.color = res.def.color;
            res.eff.hue = res.def.hue;

            res
        }
        _ => return global.clone(),
    };

    if !global.eff.enable {
        return base;
    }

    let mut res = base;
    res.synthesize(global, blend);
    res
}
