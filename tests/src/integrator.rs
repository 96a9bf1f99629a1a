#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use hikari::{
        config::KernelConfig,
        geometry::ObjectFlags,
        integrators::{Integrator, PathIntegrator},
        math::{vec3, Ray, Spectrum, Vec2},
        shader::{ShaderData, ShaderId},
    };

    use std::sync::atomic::AtomicBool;

    use crate::common::{TestKernel, TestScene, TestShader};

    fn config() -> KernelConfig {
        let mut config = KernelConfig::default();
        config.integrator.aa_samples = 4;
        config
    }

    // Floor at z = 0 under a white sky
    fn floor_kernel(floor: TestShader, sheet: Option<TestShader>) -> TestKernel {
        let mut scene = TestScene::new();
        let o = scene.add_object(ObjectFlags::empty());
        scene.add_quad(o, 0.0, 100.0, true, ShaderId::new(1));

        let mut shaders = vec![TestShader::Background(Spectrum::ones()), floor];
        if let Some(sheet) = sheet {
            let o = scene.add_object(ObjectFlags::empty());
            scene.add_quad(o, 1.0, 100.0, true, ShaderId::new(2));
            shaders.push(sheet);
        }
        TestKernel::new(config(), scene, shaders)
    }

    fn down_ray(p_film: Vec2<f32>, time: f32) -> Ray {
        let mut ray = Ray::new(
            vec3(p_film.x * 0.3 - 0.2, p_film.y * 0.3 - 0.1, 5.0),
            vec3(0.0, 0.0, -1.0),
            f32::INFINITY,
        );
        ray.time = time;
        ray
    }

    fn trace(k: &TestKernel, sample: u32) -> (Spectrum<f32>, usize) {
        let kg = k.context();
        let mut sd = ShaderData::new(&k.config);
        let result = PathIntegrator::default().li(
            &kg,
            &mut sd,
            down_ray(Vec2::new(0.5, 0.5), 0.5),
            1234,
            sample,
        );
        (result.li, result.ray_scene_intersections)
    }

    #[test]
    fn diffuse_floor_under_sky() {
        let k = floor_kernel(TestShader::Diffuse(Spectrum::from(0.5)), None);
        for sample in 0..8 {
            let (li, rays) = trace(&k, sample);
            assert_abs_diff_eq!(li, Spectrum::from(0.5), epsilon = 1e-4);
            // Floor, then the sky
            assert_eq!(rays, 2);
        }
    }

    #[test]
    fn emission_is_gathered() {
        let k = floor_kernel(
            TestShader::Emissive(Spectrum::from(0.5), Spectrum::from(2.0)),
            None,
        );
        let (li, _) = trace(&k, 0);
        assert_abs_diff_eq!(li, Spectrum::from(2.5), epsilon = 1e-4);
    }

    #[test]
    fn holdout_stops_the_path() {
        let k = floor_kernel(TestShader::Holdout, None);
        let (li, rays) = trace(&k, 0);
        assert!(li.is_black());
        assert_eq!(rays, 1);
    }

    #[test]
    fn transparent_sheet_is_invisible() {
        let k = floor_kernel(
            TestShader::Diffuse(Spectrum::from(0.5)),
            Some(TestShader::Transparent(Spectrum::ones())),
        );
        for sample in 0..8 {
            let (li, rays) = trace(&k, sample);
            assert_abs_diff_eq!(li, Spectrum::from(0.5), epsilon = 1e-4);
            assert!(rays >= 3);
        }
    }

    #[test]
    fn indirect_clamp() {
        let k = floor_kernel(TestShader::Diffuse(Spectrum::from(0.5)), None);
        let kg = k.context();
        let mut sd = ShaderData::new(&k.config);
        let result = PathIntegrator::new(Some(0.25)).li(
            &kg,
            &mut sd,
            down_ray(Vec2::new(0.5, 0.5), 0.5),
            1234,
            0,
        );
        assert_abs_diff_eq!(result.li, Spectrum::from(0.25), epsilon = 1e-4);
    }

    #[test]
    fn render_film() {
        let k = floor_kernel(TestShader::Diffuse(Spectrum::from(0.5)), None);
        let kg = k.context();

        let mut pixels = vec![Spectrum::zeros(); 4];
        let cancel = AtomicBool::new(false);
        let rays = PathIntegrator::default().render(&kg, &down_ray, 2, &mut pixels, &cancel);

        assert_eq!(rays, 4 * 4 * 2);
        for p in &pixels {
            assert_abs_diff_eq!(*p, Spectrum::from(0.5), epsilon = 1e-4);
        }
    }

    #[test]
    fn cancelled_render_leaves_film() {
        let k = floor_kernel(TestShader::Diffuse(Spectrum::from(0.5)), None);
        let kg = k.context();

        let mut pixels = vec![Spectrum::from(7.0); 6];
        let cancel = AtomicBool::new(true);
        let rays = PathIntegrator::default().render(&kg, &down_ray, 3, &mut pixels, &cancel);

        assert_eq!(rays, 0);
        assert!(pixels.iter().all(|p| *p == Spectrum::from(7.0)));
    }
}
