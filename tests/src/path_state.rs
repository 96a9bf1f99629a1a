#[cfg(test)]
mod tests {
    use hikari::{
        closure::Label,
        config::{KernelConfig, KernelFeatures, RouletteEstimator},
        math::Spectrum,
        path_state::{Lobe, PathRayFlag, PathState, RayVisibility, ScatterCategory},
        rng::PRNG_BOUNCE_NUM,
        shader::{LobeCounts, ShaderData, ShaderFlags, ShaderInfo},
    };

    fn config(max_bounce: u32, min_bounce: u32) -> KernelConfig {
        let mut config = KernelConfig::default();
        config.integrator.max_bounce = max_bounce;
        config.integrator.min_bounce = min_bounce;
        config.integrator.max_diffuse_bounce = 16;
        config.integrator.max_glossy_bounce = 16;
        config.integrator.max_transmission_bounce = 16;
        config
    }

    const THROUGHPUTS: [f32; 4] = [0.0, 0.25, 1.0, 100.0];

    #[test]
    fn next_counts_one_bounce() {
        let config = config(32, 0);
        let labels = [
            Label::REFLECT | Label::DIFFUSE,
            Label::REFLECT | Label::GLOSSY,
            Label::REFLECT | Label::SINGULAR,
            Label::TRANSMIT | Label::DIFFUSE,
            Label::TRANSMIT | Label::GLOSSY,
            Label::TRANSMIT | Label::SINGULAR,
            Label::VOLUME_SCATTER,
        ];

        let mut state = PathState::new(&config, 7, 0);
        for (i, label) in labels.iter().enumerate() {
            let rng_offset = state.rng_offset;
            state.next(&config, *label);
            assert_eq!(state.bounce, i as u32 + 1);
            assert_eq!(state.rng_offset, rng_offset + PRNG_BOUNCE_NUM);
            assert!(!state.flags.transparent);

            let bits = state.flags.bits();
            let categories = [
                PathRayFlag::REFLECT,
                PathRayFlag::TRANSMIT,
                PathRayFlag::VOLUME_SCATTER,
            ];
            assert_eq!(
                categories.iter().filter(|c| bits.contains(**c)).count(),
                1,
                "{:?}",
                label
            );
            if label.contains(Label::VOLUME_SCATTER) {
                assert_eq!(state.flags.category, ScatterCategory::VolumeScatter);
                assert_eq!(state.flags.lobe, Lobe::None);
            } else {
                assert_ne!(state.flags.lobe, Lobe::None);
            }
        }
        assert_eq!(state.diffuse_bounce, 1);
        assert_eq!(state.glossy_bounce, 2);
        assert_eq!(state.transmission_bounce, 3);
        assert_eq!(state.volume_bounce, 1);
        assert!(state.flags.diffuse_ancestor);
    }

    #[test]
    fn transparent_keeps_bounce_and_offset() {
        let config = config(8, 0);
        let mut state = PathState::new(&config, 7, 0);
        state.next(&config, Label::REFLECT | Label::GLOSSY);
        let bounce = state.bounce;
        let rng_offset = state.rng_offset;
        let category = state.flags.category;

        for i in 1..=3 {
            state.next(&config, Label::TRANSMIT | Label::TRANSPARENT);
            assert_eq!(state.bounce, bounce);
            assert_eq!(state.rng_offset, rng_offset);
            assert_eq!(state.transparent_bounce, i);
            assert!(state.flags.transparent);
            assert_eq!(state.flags.category, category);
        }
    }

    #[test]
    fn max_bounce_terminates() {
        let config = config(4, 0);
        let sd = ShaderData::new(&config);
        let mut state = PathState::new(&config, 0, 0);
        for _ in 0..4 {
            state.next(&config, Label::REFLECT | Label::DIFFUSE);
        }
        assert_eq!(state.bounce, 4);
        for t in THROUGHPUTS {
            assert_eq!(
                state.terminate_probability(&config, &sd, Spectrum::from(t)),
                0.0
            );
        }
    }

    #[test]
    fn lobe_limits_terminate() {
        let mut config = config(32, 0);
        config.integrator.max_glossy_bounce = 2;
        let sd = ShaderData::new(&config);
        let mut state = PathState::new(&config, 0, 0);
        state.next(&config, Label::REFLECT | Label::GLOSSY);
        assert_eq!(
            state.terminate_probability(&config, &sd, Spectrum::ones()),
            1.0
        );
        state.next(&config, Label::REFLECT | Label::GLOSSY);
        assert_eq!(
            state.terminate_probability(&config, &sd, Spectrum::ones()),
            0.0
        );
    }

    #[test]
    fn shader_bounce_overrides() {
        let config = config(32, 0);
        let mut sd = ShaderData::new(&config);
        sd.shader_info = ShaderInfo {
            flags: ShaderFlags::OVERRIDE_BOUNCES,
            bounces: LobeCounts {
                diffuse: 1,
                glossy: 16,
                transmission: 16,
            },
            ..ShaderInfo::default()
        };
        let mut state = PathState::new(&config, 0, 0);
        state.next(&config, Label::REFLECT | Label::DIFFUSE);
        assert_eq!(
            state.terminate_probability(&config, &sd, Spectrum::ones()),
            0.0
        );

        sd.shader_info = ShaderInfo::default();
        assert_eq!(
            state.terminate_probability(&config, &sd, Spectrum::ones()),
            1.0
        );
    }

    #[test]
    fn volume_bounce_limit() {
        let mut config = config(32, 0);
        config.integrator.max_volume_bounce = 1;
        let sd = ShaderData::new(&config);
        let mut state = PathState::new(&config, 0, 0);
        state.next(&config, Label::VOLUME_SCATTER);
        assert_eq!(state.volume_bounce, 1);
        assert_eq!(
            state.terminate_probability(&config, &sd, Spectrum::ones()),
            0.0
        );

        // Turning volumes off for the scene doesn't lift the limit
        config.integrator.use_volumes = false;
        assert_eq!(
            state.terminate_probability(&config, &sd, Spectrum::ones()),
            0.0
        );

        // Without volume support the counter isn't tracked against a maximum
        config.features.remove(KernelFeatures::VOLUME);
        assert_eq!(
            state.terminate_probability(&config, &sd, Spectrum::ones()),
            1.0
        );
    }

    #[test]
    fn min_bounce_always_continues() {
        let config = config(8, 3);
        let sd = ShaderData::new(&config);
        let mut state = PathState::new(&config, 0, 0);
        for _ in 0..3 {
            state.next(&config, Label::REFLECT | Label::DIFFUSE);
            for t in THROUGHPUTS {
                assert_eq!(
                    state.terminate_probability(&config, &sd, Spectrum::from(t)),
                    1.0
                );
            }
        }
    }

    #[test]
    fn roulette_estimators() {
        let mut config = config(8, 0);
        let sd = ShaderData::new(&config);
        let mut state = PathState::new(&config, 0, 0);
        state.next(&config, Label::REFLECT | Label::DIFFUSE);

        let throughput = Spectrum::new(0.1, 0.2, 0.6);
        config.integrator.roulette = RouletteEstimator::Average;
        approx::assert_abs_diff_eq!(
            state.terminate_probability(&config, &sd, throughput),
            0.3,
            epsilon = 1e-6
        );
        config.integrator.roulette = RouletteEstimator::Max;
        assert_eq!(state.terminate_probability(&config, &sd, throughput), 0.6);
    }

    #[test]
    fn transparent_limits() {
        let mut config = config(8, 0);
        config.integrator.transparent_min_bounce = 2;
        config.integrator.transparent_max_bounce = 4;
        let sd = ShaderData::new(&config);
        let mut state = PathState::new(&config, 0, 0);

        for i in 1..=4 {
            state.next(&config, Label::TRANSMIT | Label::TRANSPARENT);
            for t in THROUGHPUTS {
                let p = state.terminate_probability(&config, &sd, Spectrum::from(t));
                if i <= 2 {
                    assert_eq!(p, 1.0);
                } else if i >= 4 {
                    assert_eq!(p, 0.0);
                } else {
                    assert_eq!(p, t);
                }
            }
        }
    }

    #[test]
    fn transmit_visibility_drops_lobes() {
        let config = config(8, 0);
        let mut state = PathState::new(&config, 0, 0);
        state.next(&config, Label::TRANSMIT | Label::GLOSSY);
        assert!(state.flags.bits().contains(PathRayFlag::GLOSSY));
        let visibility = state.ray_visibility();
        assert!(visibility.contains(RayVisibility::TRANSMIT));
        assert!(!visibility.intersects(RayVisibility::DIFFUSE | RayVisibility::GLOSSY));

        state.next(&config, Label::REFLECT | Label::GLOSSY);
        assert!(state.ray_visibility().contains(RayVisibility::GLOSSY));
    }

    #[test]
    fn paired_bounce_modification() {
        let config = config(8, 0);
        let mut state = PathState::new(&config, 0, 0);
        state.next(&config, Label::REFLECT | Label::DIFFUSE);
        state.modify_bounce(true);
        assert_eq!(state.bounce, 2);
        state.modify_bounce(false);
        assert_eq!(state.bounce, 1);
    }

    #[test]
    fn volume_bounds_walk_gets_stuck() {
        let mut config = config(8, 0);
        config.limits.volume_bounds_max = 3;
        let mut state = PathState::new(&config, 0, 0);
        let rng_offset = state.rng_offset;
        assert!(state.volume_next(&config));
        // The first crossing keeps the offset of the bounce
        assert_eq!(state.rng_offset, rng_offset);
        assert!(state.volume_next(&config));
        assert!(state.volume_next(&config));
        assert_eq!(state.rng_offset, rng_offset + 2 * PRNG_BOUNCE_NUM);
        assert!(!state.volume_next(&config));
    }

    #[test]
    fn denoising_weight_controls_shadow_info() {
        let mut config = config(8, 0);
        config.film.pass_denoising = true;
        let mut state = PathState::new(&config, 0, 0);
        assert!(state.flags.store_shadow_info);
        assert_eq!(state.denoising_feature_weight, 1.0);
        state.next(&config, Label::REFLECT | Label::DIFFUSE);
        assert!(state.flags.store_shadow_info);
        state.denoising_feature_weight = 0.0;
        state.next(&config, Label::REFLECT | Label::DIFFUSE);
        assert!(!state.flags.store_shadow_info);
    }
}
