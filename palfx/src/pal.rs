use std::{borrow::Cow, f32::consts::PI};

use crate::{
    synth::get_syn_fx,
    types::{FcPalFx, PalFx},
};

/// `pal` as drawn with `fx` and the scene wide `global` effect.
///
/// Colors are packed `a << 24 | b << 16 | g << 8 | r`. Returns `pal` itself
/// when no effect is active. `negate` applies to effects of the negative type:
/// adds turn into subtractions and each multiplier becomes the average of the
/// other two.
pub fn get_fx_pal<'a>(
    fx: Option<&PalFx>,
    pal: &'a [u32],
    negate: bool,
    global: &PalFx,
) -> Cow<'a, [u32]> {
    let p = get_syn_fx(fx, global, 0);

    if !p.eff.enable {
        return Cow::Borrowed(pal);
    }

    let neg = negate && p.eff.neg_type;

    let mut m = if neg {
        [0, 1, 2].map(|i| (p.eff.mul[(i + 1) % 3] + p.eff.mul[(i + 2) % 3]) >> 1)
    } else {
        p.eff.mul
    };

    let mut a = p.eff.add;
    let mut sub = 0u32;

    for i in 0..3 {
        if neg {
            a[i] = -a[i];
        }

        let mut su = 0u32;
        if a[i] < 0 {
            su = (-a[i].max(-255)) as u32;
            a[i] = 0;
        }

        m[i] = m[i].clamp(0, 255 * 256);
        a[i] = a[i].min(255 * 256 * 256 / m[i].max(1));
        sub |= su << (i * 8);
    }

    let grayscale = 1. - p.eff.color;
    let desaturate = |channel: u32, average: f32| -> u32 {
        let channel = channel as f32;
        (channel + (average - channel) * grayscale) as u32
    };

    let res = pal
        .iter()
        .map(|&c| {
            let alpha = c & 0xff000000;
            let c = if p.eff.invertall { !c } else { c };

            let average = ((c & 0xff) + (c >> 8 & 0xff) + (c >> 16 & 0xff)) as f32 / 3.;
            let c = desaturate(c & 0xff, average)
                | desaturate(c >> 8 & 0xff, average) << 8
                | desaturate(c >> 16 & 0xff, average) << 16;

            // per byte saturating c - sub
            let tmp = ((!c & sub) << 1).wrapping_add((!c ^ sub) & 0xfefefefe) & 0x01010100;
            let c = c.wrapping_sub(sub).wrapping_add(tmp) & !tmp.wrapping_sub(tmp >> 8);

            let channel = |shift: u32, i: usize| {
                ((c >> shift & 0xff).wrapping_add(a[i] as u32)).wrapping_mul(m[i] as u32) >> 8
            };

            let mut tmp = channel(0, 0);
            tmp = ((tmp | overflow_mask(tmp & 0xff00, 0xffffffff)) & 0xff) | channel(8, 1) << 8;
            tmp = ((tmp | overflow_mask(tmp & 0xff0000, 0xffffff00)) & 0xffff) | channel(16, 2) << 16;

            tmp | overflow_mask(tmp & 0xff000000, 0xffff0000) | alpha
        })
        .collect::<Vec<u32>>();

    Cow::Owned(res)
}

fn overflow_mask(bits: u32, mask: u32) -> u32 {
    if bits != 0 {
        mask
    } else {
        0
    }
}

/// Shader parameters for drawing with `fx` and the scene wide `global` effect.
///
/// Without an active effect this is the identity: no inversion, no add, unit multipliers.
pub fn get_fc_pal_fx(fx: Option<&PalFx>, trans_neg: bool, blend: i32, global: &PalFx) -> FcPalFx {
    let p = get_syn_fx(fx, global, blend);

    if !p.eff.enable {
        return FcPalFx::default();
    }

    let trans_neg = trans_neg && p.eff.neg_type;

    let add = p.eff.add.map(|v| v as f32 / 255.);
    let mul = [0, 1, 2].map(|i| {
        if trans_neg {
            (p.eff.mul[(i + 1) % 3] + p.eff.mul[(i + 2) % 3]) as f32 / 512.
        } else {
            p.eff.mul[i] as f32 / 256.
        }
    });

    FcPalFx {
        invert: p.eff.invertall,
        grayscale: 1. - p.eff.color,
        add,
        mul,
        invertblend: p.eff.invertblend,
        hue: -(p.eff.hue * 180.) * (PI / 180.),
    }
}
