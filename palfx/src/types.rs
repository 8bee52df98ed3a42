use serde::Deserialize;

/// What an animation asks for. Every field is optional when read from a config.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PalFxDef {
    /// Ticks left. Negative runs forever, 0 is off.
    pub time: i32,
    /// Saturation, 1 keeps the colors, 0 is grayscale.
    pub color: f32,
    pub add: [i32; 3],
    /// 256 is 1.0
    pub mul: [i32; 3],
    pub sinadd: [i32; 3],
    pub sinmul: [i32; 3],
    pub sincolor: i32,
    pub sinhue: i32,
    /// Periods of sinadd, sinmul, sincolor and sinhue.
    pub cycletime: [i32; 4],
    pub invertall: bool,
    pub invertblend: i32,
    pub hue: f32,
    pub interpolate: bool,
    /// Target values first, start values last.
    pub iadd: [i32; 6],
    pub imul: [i32; 6],
    pub icolor: [f32; 2],
    pub ihue: [f32; 2],
    pub itime: i32,
}

impl Default for PalFxDef {
    fn default() -> Self {
        Self {
            time: 0,
            color: 1.,
            add: [0; 3],
            mul: [256; 3],
            sinadd: [0; 3],
            sinmul: [0; 3],
            sincolor: 0,
            sinhue: 0,
            cycletime: [0; 4],
            invertall: false,
            invertblend: 0,
            hue: 0.,
            interpolate: false,
            iadd: [0; 6],
            imul: [256; 6],
            icolor: [1.; 2],
            ihue: [0.; 2],
            itime: 0,
        }
    }
}

/// Values derived from the definition on every [`PalFx::step`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PalFxEffective {
    pub enable: bool,
    pub neg_type: bool,
    pub invertall: bool,
    pub invertblend: i32,
    pub add: [i32; 3],
    pub mul: [i32; 3],
    pub color: f32,
    pub hue: f32,
    pub interpolate: bool,
    pub i_add: [i32; 3],
    pub i_mul: [i32; 3],
    pub i_color: f32,
    pub i_hue: f32,
    /// Interpolation ticks done so far.
    pub i_time: i32,
}

/// A palette effect instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PalFx {
    pub def: PalFxDef,
    /// Negative add flips to subtraction when drawn with a negated blend.
    pub neg_type: bool,
    /// Sinusoid phases, one per cycle time.
    pub sintime: [i32; 4],
    pub eff: PalFxEffective,
}

/// Shader parameters for a palette effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FcPalFx {
    pub invert: bool,
    pub grayscale: f32,
    pub add: [f32; 3],
    pub mul: [f32; 3],
    pub invertblend: i32,
    /// Radians
    pub hue: f32,
}

impl Default for FcPalFx {
    fn default() -> Self {
        Self {
            invert: false,
            grayscale: 0.,
            add: [0.; 3],
            mul: [1.; 3],
            invertblend: 0,
            hue: 0.,
        }
    }
}
