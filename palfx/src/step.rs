use std::f64::consts::PI;

use crate::types::{PalFx, PalFxDef};

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

impl PalFx {
    pub fn new() -> Self {
        Self::default()
    }

    /// A stopped effect that starts running on the next [`PalFx::step`].
    pub fn from_def(def: PalFxDef) -> Self {
        Self {
            def,
            ..Default::default()
        }
    }

    pub fn clear(&mut self) {
        self.clear_with_neg_type(false);
    }

    /// Back to the neutral definition with all phases at 0.
    pub fn clear_with_neg_type(&mut self, neg_type: bool) {
        self.def = PalFxDef::default();
        self.neg_type = neg_type;
        self.sintime = [0; 4];
        self.eff.i_time = 0;
    }

    /// Enables a plain color multiply, each channel 0 to 255.
    pub fn set_color(&mut self, r: i32, g: i32, b: i32) {
        let [r, g, b] = [r, g, b].map(|c| c.clamp(0, 255));

        self.eff.enable = true;
        self.eff.color = 1.;
        self.eff.hue = 0.;
        self.eff.mul = [256 * r >> 8, 256 * g >> 8, 256 * b >> 8];
    }

    /// Sine of the phase of sinusoid `which`, or `None` when it does not oscillate.
    fn sin(&self, which: usize) -> Option<f64> {
        let cycle = self.def.cycletime[which];

        if cycle <= 1 {
            return None;
        }

        let mut st = 2. * PI * self.sintime[which] as f64;

        // a 2 tick cycle would only sample the zero crossings
        if cycle == 2 {
            st += PI / 2.;
        }

        Some((st / cycle as f64).sin())
    }

    fn interpolation_update(&mut self) {
        let def = &self.def;
        let eff = &mut self.eff;

        if eff.i_time < def.itime {
            eff.i_time += 1;
        }

        let t = if def.itime <= 0 {
            1.
        } else {
            eff.i_time as f32 / def.itime as f32
        };

        for i in 0..3 {
            eff.i_mul[i] = lerp(def.imul[i + 3] as f32, def.imul[i] as f32, t) as i32;
            eff.mul[i] = (eff.i_mul[i] as f32 * def.mul[i] as f32 / 256.) as i32;
            eff.i_add[i] = lerp(def.iadd[i + 3] as f32, def.iadd[i] as f32, t) as i32;
            eff.add[i] = eff.i_add[i] + def.add[i];
        }

        eff.i_color = lerp(def.icolor[1], def.icolor[0], t);
        eff.color = eff.i_color * def.color;
        eff.i_hue = lerp(def.ihue[1], def.ihue[0], t);
        eff.hue = eff.i_hue + def.hue;
    }

    /// Recomputes the effective values. `tick_frame` advances the sinusoid
    /// phases and the remaining time.
    pub fn step(&mut self, tick_frame: bool) {
        self.eff.enable = self.def.time != 0;

        if !self.eff.enable {
            return;
        }

        self.eff.interpolate = self.def.interpolate;

        if self.eff.interpolate {
            self.interpolation_update();
        } else {
            self.eff.mul = self.def.mul;
            self.eff.add = self.def.add;
            self.eff.color = self.def.color;
            self.eff.hue = self.def.hue;
        }

        self.eff.invertall = self.def.invertall;
        self.eff.invertblend = if self.def.invertblend <= -2 && self.eff.invertall {
            3
        } else {
            self.def.invertblend
        };
        self.eff.neg_type = self.neg_type;

        if let Some(sin) = self.sin(0) {
            for i in 0..3 {
                self.eff.add[i] += (sin * self.def.sinadd[i] as f64) as i32;
            }
        }

        if let Some(sin) = self.sin(1) {
            for i in 0..3 {
                self.eff.mul[i] += (sin * self.def.sinmul[i] as f64) as i32;
            }
        }

        if let Some(sin) = self.sin(2) {
            self.eff.color += (sin * (self.def.sincolor as f64 / 256.)) as f32;
        }

        if let Some(sin) = self.sin(3) {
            self.eff.hue += (sin * (self.def.sinhue as f64 / 256.)) as f32;
        }

        if tick_frame {
            for i in 0..4 {
                if self.def.cycletime[i] > 0 {
                    self.sintime[i] = (self.sintime[i] + 1) % self.def.cycletime[i];
                }
            }

            if self.def.time > 0 {
                self.def.time -= 1;
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.eff.enable
    }
}
