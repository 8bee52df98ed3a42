//! Palette effects
//!
//! A [`PalFx`] is stepped once per tick and combined with the scene wide
//! effect at draw time, either into a transformed palette ([`get_fx_pal`]) or
//! into shader parameters ([`get_fc_pal_fx`]).
mod pal;
mod step;
mod synth;
mod types;

pub use pal::{get_fc_pal_fx, get_fx_pal};
pub use synth::get_syn_fx;
pub use types::*;

#[cfg(test)]
mod test {
    use std::borrow::Cow;

    use crate::*;

    fn pack(r: u32, g: u32, b: u32, a: u32) -> u32 {
        a << 24 | b << 16 | g << 8 | r
    }

    fn running(def: PalFxDef) -> PalFx {
        let mut fx = PalFx::from_def(PalFxDef { time: -1, ..def });
        fx.step(false);
        fx
    }

    fn additive(add: [i32; 3]) -> PalFx {
        running(PalFxDef {
            add,
            ..Default::default()
        })
    }

    #[test]
    fn default_def() {
        let def = PalFxDef::default();

        assert_eq!(def.color, 1.);
        assert_eq!(def.mul, [256; 3]);
        assert_eq!(def.imul, [256; 6]);
        assert_eq!(def.icolor, [1.; 2]);
        assert_eq!(def.time, 0);
    }

    #[test]
    fn time_runs_out() {
        let mut fx = PalFx::from_def(PalFxDef {
            time: 2,
            ..Default::default()
        });

        fx.step(true);
        assert!(fx.is_enabled());
        fx.step(true);
        assert!(fx.is_enabled());
        fx.step(true);
        assert!(!fx.is_enabled());
    }

    #[test]
    fn indefinite_time_stays() {
        let mut fx = additive([1, 2, 3]);

        for _ in 0..100 {
            fx.step(true);
        }

        assert!(fx.is_enabled());
        assert_eq!(fx.def.time, -1);
        assert_eq!(fx.eff.add, [1, 2, 3]);
    }

    #[test]
    fn sinadd_is_periodic() {
        let cycle = 8;
        let mut fx = PalFx::from_def(PalFxDef {
            time: -1,
            add: [10, 0, 0],
            sinadd: [32, 16, -32],
            cycletime: [cycle, 0, 0, 0],
            ..Default::default()
        });

        let adds = (0..cycle * 3)
            .map(|_| {
                fx.step(true);
                fx.eff.add
            })
            .collect::<Vec<_>>();

        for t in 0..(cycle * 2) as usize {
            assert_eq!(adds[t], adds[t + cycle as usize]);
        }

        // quarter period is the peak
        assert_eq!(adds[0], [10, 0, 0]);
        assert_eq!(adds[2], [42, 16, -32]);
    }

    #[test]
    fn two_tick_cycle_is_shifted() {
        let mut fx = PalFx::from_def(PalFxDef {
            time: -1,
            sinmul: [100, 0, 0],
            cycletime: [0, 2, 0, 0],
            ..Default::default()
        });

        fx.step(true);
        assert_eq!(fx.eff.mul[0], 326);
        fx.step(true);
        assert_eq!(fx.eff.mul[0], 186);
    }

    #[test]
    fn interpolation() {
        let mut fx = PalFx::from_def(PalFxDef {
            time: -1,
            interpolate: true,
            itime: 4,
            iadd: [40, 0, 0, 0, 0, 0],
            imul: [128, 256, 256, 256, 256, 256],
            ..Default::default()
        });

        fx.step(true);
        assert_eq!(fx.eff.add, [10, 0, 0]);
        assert_eq!(fx.eff.mul, [224, 256, 256]);

        for _ in 0..10 {
            fx.step(true);
        }

        assert_eq!(fx.eff.add, [40, 0, 0]);
        assert_eq!(fx.eff.mul, [128, 256, 256]);
        assert_eq!(fx.eff.color, 1.);
    }

    #[test]
    fn clear_resets_phases() {
        let mut fx = PalFx::from_def(PalFxDef {
            time: 5,
            cycletime: [4, 4, 4, 4],
            ..Default::default()
        });
        fx.step(true);
        assert_eq!(fx.sintime, [1; 4]);

        fx.clear_with_neg_type(true);

        assert_eq!(fx.def, PalFxDef::default());
        assert_eq!(fx.sintime, [0; 4]);
        assert!(fx.neg_type);
    }

    #[test]
    fn additive_synthesis_is_associative() {
        let a = additive([10, -20, 30]);
        let b = additive([5, 5, 5]);
        let c = additive([-1, 2, 100]);

        let mut left = a.clone();
        left.synthesize(&b, 0);
        left.synthesize(&c, 0);

        let mut bc = b.clone();
        bc.synthesize(&c, 0);
        let mut right = a.clone();
        right.synthesize(&bc, 0);

        assert_eq!(left.eff.add, [14, -13, 135]);
        assert_eq!(left.eff, right.eff);
    }

    #[test]
    fn subtractive_synthesis() {
        let mut fx = additive([100, 50, 10]);
        let global = additive([30, -60, 20]);

        fx.synthesize(&global, -2);

        assert_eq!(fx.eff.add, [70, 0, 0]);
        assert_eq!(fx.eff.mul, [226, 255, 236]);
    }

    #[test]
    fn multipliers_compose() {
        let mut fx = running(PalFxDef {
            mul: [128, 256, 512],
            ..Default::default()
        });
        let global = running(PalFxDef {
            mul: [128, 128, 128],
            ..Default::default()
        });

        fx.synthesize(&global, 0);
        assert_eq!(fx.eff.mul, [64, 128, 256]);
    }

    /// (invertall, invertblend) an effect steps to on its own.
    fn stepped_inversion(invertblend: i32, invertall: bool) -> (bool, i32) {
        if invertblend <= -2 && invertall {
            (invertall, 3)
        } else {
            (invertall, invertblend)
        }
    }

    /// (invertall, invertblend) of an effect synthesized with a global
    /// "invert everything, character blend" effect.
    fn char_blend_inversion(blend: i32, invertblend: i32, invertall: bool) -> (bool, i32) {
        let x = invertall;

        match (invertblend, blend) {
            (-3, _) => {
                if x {
                    (false, -3)
                } else {
                    (true, 3)
                }
            }
            (-2, 0) => {
                if x {
                    (false, 3)
                } else {
                    (false, -2)
                }
            }
            (-2, _) => {
                if x {
                    (false, -2)
                } else {
                    (false, 3)
                }
            }
            (-1, _) => (x, 2),
            (0, 0) => (!x, 1),
            (0, _) => (x, 1),
            (1, 0) => (!x, 0),
            (1, _) => (x, 0),
            (2, _) => (x, -1),
            (3, 0) => (!x, 3),
            (3, _) => (x, 3),
            _ => unreachable!(),
        }
    }

    fn expected_inversion(
        blend: i32,
        (global_invertall, global_invertblend): (bool, i32),
        (invertall, invertblend): (bool, i32),
    ) -> (bool, i32) {
        let (own_invertall, own_invertblend) = stepped_inversion(invertblend, invertall);
        let combined = own_invertall != global_invertall;

        if !global_invertall {
            return (combined, own_invertblend);
        }

        if global_invertblend == 1 {
            return char_blend_inversion(blend, invertblend, invertall);
        }

        // only the background rule applies
        match (invertblend, combined) {
            (-3, true) => (true, 3),
            (-3, false) => (false, -3),
            _ => (combined, own_invertblend),
        }
    }

    #[test]
    fn invert_blend_table() {
        for global_invertall in [false, true] {
            for global_invertblend in -3..=3 {
                let global = running(PalFxDef {
                    invertall: global_invertall,
                    invertblend: global_invertblend,
                    ..Default::default()
                });

                for blend in [0, 1, -2] {
                    for invertblend in -3..=3 {
                        for invertall in [false, true] {
                            let mut fx = running(PalFxDef {
                                invertall,
                                invertblend,
                                ..Default::default()
                            });
                            fx.synthesize(&global, blend);

                            assert_eq!(
                                (fx.eff.invertall, fx.eff.invertblend),
                                expected_inversion(
                                    blend,
                                    (global_invertall, global_invertblend),
                                    (invertall, invertblend)
                                ),
                                "global ({global_invertall}, {global_invertblend}), \
                                 blend {blend}, invertblend {invertblend}, invertall {invertall}"
                            );
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn bg_blend_inverse_under_other_global_codes() {
        let global = running(PalFxDef {
            invertall: true,
            invertblend: 0,
            ..Default::default()
        });

        for (invertall, expected) in [(false, (true, 3)), (true, (false, -3))] {
            let mut fx = running(PalFxDef {
                invertall,
                invertblend: -3,
                ..Default::default()
            });
            fx.synthesize(&global, 0);

            assert_eq!((fx.eff.invertall, fx.eff.invertblend), expected);
        }
    }

    #[test]
    fn global_without_invertall_keeps_invertblend() {
        let global = running(PalFxDef {
            invertblend: 1,
            ..Default::default()
        });
        let mut fx = running(PalFxDef {
            invertall: true,
            invertblend: 0,
            ..Default::default()
        });

        fx.synthesize(&global, 0);
        assert_eq!((fx.eff.invertall, fx.eff.invertblend), (true, 0));
    }

    #[test]
    fn syn_fx_falls_back_to_global() {
        let global = additive([1, 1, 1]);
        let stopped = PalFx::from_def(PalFxDef {
            add: [5, 5, 5],
            ..Default::default()
        });

        assert_eq!(get_syn_fx(None, &global, 0), global);
        assert_eq!(get_syn_fx(Some(&stopped), &global, 0), global);
    }

    #[test]
    fn syn_fx_without_global() {
        let global = PalFx::new();
        let fx = additive([5, 5, 5]);

        assert_eq!(get_syn_fx(Some(&fx), &global, 0), fx);
        assert!(!get_syn_fx(None, &global, -2).is_enabled());
    }

    #[test]
    fn syn_fx_subtractive_uses_neutral_effect() {
        let global = running(PalFxDef {
            mul: [128; 3],
            ..Default::default()
        });
        let stopped = PalFx::from_def(PalFxDef {
            add: [5, 5, 5],
            ..Default::default()
        });
        let before = stopped.clone();

        let res = get_syn_fx(Some(&stopped), &global, -2);

        assert!(res.is_enabled());
        assert_eq!(res.eff.add, [0; 3]);
        assert_eq!(res.eff.mul, [127; 3]);
        assert_eq!(stopped, before);
    }

    #[test]
    fn syn_fx_does_not_touch_inputs() {
        let global = additive([3, 3, 3]);
        let fx = additive([5, 5, 5]);
        let (fx_before, global_before) = (fx.clone(), global.clone());

        let res = get_syn_fx(Some(&fx), &global, 0);

        assert_eq!(res.eff.add, [8; 3]);
        assert_eq!(fx, fx_before);
        assert_eq!(global, global_before);
    }

    #[test]
    fn disabled_fx_pal_is_identity() {
        let pal = [0xff112233u32; 256];
        let global = PalFx::new();

        let res = get_fx_pal(None, &pal, false, &global);
        assert!(matches!(res, Cow::Borrowed(_)));
        assert_eq!(&*res, &pal);

        let stopped = PalFx::from_def(PalFxDef {
            add: [5, 5, 5],
            ..Default::default()
        });
        let res = get_fx_pal(Some(&stopped), &pal, false, &global);
        assert!(matches!(res, Cow::Borrowed(_)));
    }

    #[test]
    fn fx_pal_add_and_saturate() {
        let global = PalFx::new();
        let pal = [pack(100, 50, 200, 255), pack(0, 0, 250, 7)];

        let fx = additive([16, 0, 0]);
        let res = get_fx_pal(Some(&fx), &pal, false, &global);
        assert_eq!(res[0], pack(116, 50, 200, 255));

        let fx = additive([200, 0, 60]);
        let res = get_fx_pal(Some(&fx), &pal, false, &global);
        assert_eq!(res[0], pack(255, 50, 255, 255));
        // blue overflow spills into the alpha byte
        assert_eq!(res[1], pack(200, 0, 255, 255));
    }

    #[test]
    fn fx_pal_subtract_clamps_at_zero() {
        let global = PalFx::new();
        let pal = [pack(20, 50, 200, 255), pack(100, 50, 200, 255)];

        let fx = additive([-30, 0, 0]);
        let res = get_fx_pal(Some(&fx), &pal, false, &global);

        assert_eq!(res[0], pack(0, 50, 200, 255));
        assert_eq!(res[1], pack(70, 50, 200, 255));
    }

    #[test]
    fn fx_pal_grayscale_and_invert() {
        let global = PalFx::new();
        let pal = [pack(30, 60, 90, 255)];

        let fx = running(PalFxDef {
            color: 0.,
            ..Default::default()
        });
        let res = get_fx_pal(Some(&fx), &pal, false, &global);
        assert_eq!(res[0], pack(60, 60, 60, 255));

        let fx = running(PalFxDef {
            invertall: true,
            ..Default::default()
        });
        let res = get_fx_pal(Some(&fx), &pal, false, &global);
        assert_eq!(res[0], pack(225, 195, 165, 255));
    }

    #[test]
    fn fx_pal_negate() {
        let global = PalFx::new();
        let pal = [pack(100, 100, 100, 255)];

        let mut fx = PalFx::from_def(PalFxDef {
            time: -1,
            add: [20, 0, 0],
            mul: [256, 128, 64],
            ..Default::default()
        });
        fx.neg_type = true;
        fx.step(false);

        let res = get_fx_pal(Some(&fx), &pal, true, &global);
        assert_eq!(res[0], pack(30, 62, 75, 255));

        let res = get_fx_pal(Some(&fx), &pal, false, &global);
        assert_eq!(res[0], pack(120, 50, 25, 255));

        // only effects of the negative type negate
        fx.neg_type = false;
        fx.step(false);
        let res = get_fx_pal(Some(&fx), &pal, true, &global);
        assert_eq!(res[0], pack(120, 50, 25, 255));
    }

    #[test]
    fn fc_pal_fx_disabled_is_identity() {
        let global = PalFx::new();
        assert_eq!(get_fc_pal_fx(None, true, 0, &global), FcPalFx::default());
    }

    #[test]
    fn fc_pal_fx() {
        let global = PalFx::new();
        let mut fx = PalFx::from_def(PalFxDef {
            time: -1,
            add: [255, 0, 51],
            mul: [256, 128, 512],
            color: 0.5,
            hue: 0.5,
            invertall: true,
            invertblend: 2,
            ..Default::default()
        });
        fx.neg_type = true;
        fx.step(false);

        let res = get_fc_pal_fx(Some(&fx), false, 0, &global);

        assert!(res.invert);
        assert_eq!(res.grayscale, 0.5);
        assert_eq!(res.add, [1., 0., 0.2]);
        assert_eq!(res.mul, [1., 0.5, 2.]);
        assert_eq!(res.invertblend, 2);
        assert!((res.hue + std::f32::consts::FRAC_PI_2).abs() < 1e-6);

        let res = get_fc_pal_fx(Some(&fx), true, 0, &global);
        assert_eq!(res.mul, [1.25, 1.5, 0.75]);
    }

    #[test]
    fn set_color() {
        let global = PalFx::new();
        let mut fx = PalFx::new();
        fx.set_color(300, 128, -5);

        assert!(fx.is_enabled());
        assert_eq!(fx.eff.mul, [255, 128, 0]);

        let res = get_fc_pal_fx(Some(&fx), false, 0, &global);
        assert_eq!(res.mul, [255. / 256., 0.5, 0.]);
        assert_eq!(res.grayscale, 0.);
    }

    #[test]
    fn def_from_toml() {
        let def: PalFxDef = toml::from_str(
            r#"
            time = -1
            add = [64, 64, 64]
            cycletime = [8, 0, 0, 0]
            "#,
        )
        .unwrap();

        assert_eq!(def.add, [64; 3]);
        assert_eq!(def.mul, [256; 3]);
        assert_eq!(def.color, 1.);
    }
}
