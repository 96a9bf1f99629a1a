#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use hikari::{
        config::{KernelConfig, KernelFeatures},
        geometry::{
            CurveGeometry, Intersection, ObjectFlags, ObjectId, PrimId, PrimitiveType,
            TriangleGeometry,
        },
        math::{vec3, Differential3, Ray, Spectrum, Transform},
        shader::{SamplePoint, ShaderData, ShaderFlags, ShaderId, ShaderInfo},
    };

    use crate::common::{TestKernel, TestScene, TestShader};

    fn triangle(shader: ShaderId) -> TriangleGeometry {
        TriangleGeometry::new(
            [
                vec3(1.0, 0.0, 0.0),
                vec3(0.0, 1.0, 0.0),
                vec3(0.0, 0.0, 0.0),
            ],
            shader,
        )
    }

    fn kernel(config: KernelConfig, flags: ObjectFlags, tri: TriangleGeometry) -> TestKernel {
        let mut scene = TestScene::new();
        let object = scene.add_object(flags);
        scene.triangles.push((object, tri));
        let info = vec![
            ShaderInfo::default(),
            ShaderInfo {
                flags: ShaderFlags::HAS_TRANSPARENT_SHADOW,
                ao_alpha: 0.5,
                ..ShaderInfo::default()
            },
        ];
        TestKernel::with_info(
            config,
            scene,
            info,
            vec![
                TestShader::Background(Spectrum::ones()),
                TestShader::Diffuse(Spectrum::from(0.5)),
            ],
        )
    }

    fn hit(t: f32) -> Intersection {
        Intersection {
            t,
            u: 0.25,
            v: 0.25,
            prim: PrimId(0),
            object: None,
            prim_type: PrimitiveType::Triangle,
        }
    }

    #[test]
    fn ray_hit_from_front() {
        let k = kernel(
            KernelConfig::default(),
            ObjectFlags::empty(),
            triangle(ShaderId::new(1)),
        );
        let kg = k.context();
        let mut sd = ShaderData::new(&k.config);

        let mut ray = Ray::new(vec3(0.5, 0.25, 2.0), vec3(0.0, 0.0, -1.0), f32::INFINITY);
        ray.dd = Differential3 {
            dx: vec3(0.01, 0.0, 0.0),
            dy: vec3(0.0, 0.01, 0.0),
        };
        sd.setup_from_ray(&kg, &hit(2.0), &ray);

        assert_abs_diff_eq!(sd.p, vec3(0.5, 0.25, 0.0));
        assert_eq!(sd.ng, vec3(0.0, 0.0, 1.0));
        assert_eq!(sd.n, sd.ng);
        assert_eq!(sd.i, vec3(0.0, 0.0, 1.0));
        assert!(!sd.is_backfacing());
        assert_eq!(sd.object, Some(ObjectId(0)));
        assert_eq!(sd.prim, Some(PrimId(0)));
        assert_eq!(sd.lamp, None);
        assert_eq!(sd.ray_length, 2.0);
        assert_eq!(sd.shader_info.ao_alpha, 0.5);
        assert!(sd
            .shader_info
            .flags
            .contains(ShaderFlags::HAS_TRANSPARENT_SHADOW));

        // The footprint grows with distance and maps directly to barycentrics here
        assert_abs_diff_eq!(sd.dp.dx, vec3(0.02, 0.0, 0.0), epsilon = 1e-6);
        assert_abs_diff_eq!(sd.dp.dy, vec3(0.0, 0.02, 0.0), epsilon = 1e-6);
        assert_abs_diff_eq!(sd.du.dx, 0.02, epsilon = 1e-6);
        assert_abs_diff_eq!(sd.dv.dy, 0.02, epsilon = 1e-6);
        assert_abs_diff_eq!(sd.du.dy, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(sd.di.dx, vec3(-0.01, 0.0, 0.0));
    }

    #[test]
    fn ray_hit_from_back_flips() {
        let k = kernel(
            KernelConfig::default(),
            ObjectFlags::empty(),
            triangle(ShaderId::new(1)),
        );
        let kg = k.context();
        let mut sd = ShaderData::new(&k.config);

        let ray = Ray::new(vec3(0.5, 0.25, -1.0), vec3(0.0, 0.0, 1.0), f32::INFINITY);
        sd.setup_from_ray(&kg, &hit(1.0), &ray);

        assert!(sd.is_backfacing());
        assert_eq!(sd.ng, vec3(0.0, 0.0, -1.0));
        assert_eq!(sd.n, vec3(0.0, 0.0, -1.0));
        assert!(sd.ng.dot(sd.i) > 0.0);
        assert_eq!(sd.dpdu, vec3(-1.0, 0.0, 0.0));

        // Reusing the shading point for a front hit clears the flag
        let ray = Ray::new(vec3(0.5, 0.25, 1.0), vec3(0.0, 0.0, -1.0), f32::INFINITY);
        sd.setup_from_ray(&kg, &hit(1.0), &ray);
        assert!(!sd.is_backfacing());
    }

    #[test]
    fn smooth_normals_need_the_flag() {
        let normals = [
            vec3(1.0, 0.0, 1.0).normalized(),
            vec3(0.0, 0.0, 1.0),
            vec3(0.0, 0.0, 1.0),
        ];
        let ray = Ray::new(vec3(0.25, 0.25, 1.0), vec3(0.0, 0.0, -1.0), f32::INFINITY);

        let k = kernel(
            KernelConfig::default(),
            ObjectFlags::empty(),
            triangle(ShaderId::new(1)).with_normals(normals),
        );
        let mut sd = ShaderData::new(&k.config);
        sd.setup_from_ray(&k.context(), &hit(1.0), &ray);
        assert_eq!(sd.n, sd.ng);

        let k = kernel(
            KernelConfig::default(),
            ObjectFlags::empty(),
            triangle(ShaderId::new(1).with_smooth_normal()).with_normals(normals),
        );
        sd.setup_from_ray(&k.context(), &hit(1.0), &ray);
        assert_ne!(sd.n, sd.ng);
        assert!(sd.n.x > 0.0);
        assert_abs_diff_eq!(sd.n.len(), 1.0, epsilon = 1e-6);
        // Shader info is looked up without the packed flags
        assert_eq!(sd.shader_info.ao_alpha, 0.5);
    }

    #[test]
    fn instanced_hit_is_transformed() {
        let mut k = kernel(
            KernelConfig::default(),
            ObjectFlags::empty(),
            triangle(ShaderId::new(1)),
        );
        k.scene.objects[0].flags = ObjectFlags::empty();
        k.scene.objects[0].transform = Transform::scale(vec3(2.0, 2.0, 2.0));
        let kg = k.context();
        let mut sd = ShaderData::new(&k.config);

        let ray = Ray::new(vec3(1.0, 0.5, 3.0), vec3(0.0, 0.0, -1.0), f32::INFINITY);
        let isect = Intersection {
            object: Some(ObjectId(0)),
            ..hit(3.0)
        };
        sd.setup_from_ray(&kg, &isect, &ray);

        assert_abs_diff_eq!(sd.p, vec3(1.0, 0.5, 0.0));
        assert_abs_diff_eq!(sd.ng, vec3(0.0, 0.0, 1.0), epsilon = 1e-6);
        assert_abs_diff_eq!(sd.dpdu, vec3(2.0, 0.0, 0.0), epsilon = 1e-6);
        assert_abs_diff_eq!(sd.dpdv, vec3(0.0, 2.0, 0.0), epsilon = 1e-6);
    }

    #[test]
    fn differentials_follow_the_feature() {
        let mut config = KernelConfig::default();
        config.features.remove(KernelFeatures::RAY_DIFFERENTIALS);
        let k = kernel(config, ObjectFlags::empty(), triangle(ShaderId::new(1)));
        let mut sd = ShaderData::new(&k.config);

        let mut ray = Ray::new(vec3(0.25, 0.25, 1.0), vec3(0.0, 0.0, -1.0), f32::INFINITY);
        ray.dd = Differential3 {
            dx: vec3(0.01, 0.0, 0.0),
            dy: vec3(0.0, 0.01, 0.0),
        };
        sd.setup_from_ray(&k.context(), &hit(1.0), &ray);
        assert!(sd.dp.is_zero());
        assert!(sd.di.is_zero());
        assert_eq!(sd.du.dx, 0.0);
    }

    #[test]
    fn curve_faces_the_ray() {
        let mut k = kernel(
            KernelConfig::default(),
            ObjectFlags::empty(),
            triangle(ShaderId::new(1)),
        );
        k.scene.curves.push(CurveGeometry::new(
            [vec3(0.0, -1.0, 0.0), vec3(0.0, 1.0, 0.0)],
            ShaderId::new(1),
        ));
        let kg = k.context();
        let mut sd = ShaderData::new(&k.config);

        let ray = Ray::new(vec3(0.0, 0.0, 2.0), vec3(0.0, 0.0, -2.0), f32::INFINITY);
        let isect = Intersection {
            prim_type: PrimitiveType::Curve,
            ..hit(1.0)
        };
        sd.setup_from_ray(&kg, &isect, &ray);

        assert_eq!(sd.prim_type, PrimitiveType::Curve);
        assert_abs_diff_eq!(sd.p, vec3(0.0, 0.0, 0.0));
        assert_abs_diff_eq!(sd.ng, vec3(0.0, 0.0, 1.0));
        assert_eq!(sd.n, sd.ng);
        assert!(!sd.is_backfacing());
        assert_eq!(sd.dpdu, vec3(0.0, 2.0, 0.0));
        assert_abs_diff_eq!(sd.dpdv.dot(sd.ng), 0.0);
    }

    #[test]
    fn subsurface_exit_keeps_side_and_time() {
        let k = kernel(
            KernelConfig::default(),
            ObjectFlags::empty(),
            triangle(ShaderId::new(1)),
        );
        let kg = k.context();
        let mut sd = ShaderData::new(&k.config);

        let mut ray = Ray::new(vec3(0.25, 0.25, -1.0), vec3(0.0, 0.0, 1.0), f32::INFINITY);
        ray.time = 0.2;
        sd.setup_from_ray(&kg, &hit(1.0), &ray);
        assert!(sd.is_backfacing());

        // Probe ray from the other side would be front facing on its own
        let mut probe = Ray::new(vec3(0.5, 0.1, 1.0), vec3(0.0, 0.0, -1.0), 2.0);
        probe.time = 0.9;
        sd.setup_from_subsurface(&kg, &hit(1.0), &probe);

        assert!(sd.is_backfacing());
        assert_eq!(sd.time, 0.2);
        assert_eq!(sd.ng, vec3(0.0, 0.0, -1.0));
        assert_eq!(sd.i, sd.n);
        assert_abs_diff_eq!(sd.p, vec3(0.5, 0.1, 0.0));
        assert_eq!(sd.shader_info.ao_alpha, 0.5);
    }

    #[test]
    fn sampled_point_in_object_space() {
        let mut k = kernel(
            KernelConfig::default(),
            ObjectFlags::empty(),
            triangle(ShaderId::new(1)),
        );
        k.scene.objects[0].flags = ObjectFlags::empty();
        k.scene.objects[0].transform = Transform::translation(vec3(0.0, 0.0, 5.0));
        let kg = k.context();
        let mut sd = ShaderData::new(&k.config);

        let sample = SamplePoint {
            object: Some(ObjectId(0)),
            prim: Some(PrimId(0)),
            u: 0.25,
            v: 0.25,
            object_space: true,
            ..SamplePoint::new(
                vec3(0.5, 0.25, 0.0),
                vec3(0.0, 0.0, 1.0),
                vec3(0.0, 0.0, 1.0),
                ShaderId::new(1),
            )
        };
        sd.setup_from_sample(&kg, &sample);

        assert_abs_diff_eq!(sd.p, vec3(0.5, 0.25, 5.0));
        assert_abs_diff_eq!(sd.ng, vec3(0.0, 0.0, 1.0));
        assert_eq!(sd.prim_type, PrimitiveType::Triangle);
        assert!(!sd.is_backfacing());
        assert!(sd.dp.is_zero());
        assert_eq!(sd.shader_info.ao_alpha, 0.5);

        // Looking at the back
        let sample = SamplePoint {
            i: vec3(0.0, 0.0, -1.0),
            ..sample
        };
        sd.setup_from_sample(&kg, &sample);
        assert!(sd.is_backfacing());
        assert_abs_diff_eq!(sd.ng, vec3(0.0, 0.0, -1.0));
    }

    #[test]
    fn lamp_point_has_no_backface() {
        let k = kernel(
            KernelConfig::default(),
            ObjectFlags::empty(),
            triangle(ShaderId::new(1)),
        );
        let kg = k.context();
        let mut sd = ShaderData::new(&k.config);

        let sample = SamplePoint {
            lamp: Some(hikari::geometry::LampId(0)),
            ..SamplePoint::new(
                vec3(0.0, 0.0, 3.0),
                vec3(0.0, 0.0, 1.0),
                vec3(0.0, 0.0, -1.0),
                ShaderId::new(1),
            )
        };
        sd.setup_from_sample(&kg, &sample);
        assert_eq!(sd.prim_type, PrimitiveType::Lamp);
        assert!(!sd.is_backfacing());
        assert_eq!(sd.dpdu, vec3(1.0, 0.0, 0.0));
        assert_eq!(sd.object, None);
    }

    #[test]
    fn displacement_point() {
        let k = kernel(
            KernelConfig::default(),
            ObjectFlags::empty(),
            triangle(ShaderId::new(1)),
        );
        let kg = k.context();
        let mut sd = ShaderData::new(&k.config);

        sd.setup_from_displace(&kg, ObjectId(0), PrimId(0), 0.25, 0.5);
        assert_abs_diff_eq!(sd.p, vec3(0.25, 0.5, 0.0));
        assert!(sd.shader.smooth_normal());
        assert_eq!(sd.shader.index(), 1);
        assert_eq!(sd.time, 0.5);
        assert!(sd.i.is_zero());
        assert!(!sd.is_backfacing());
    }

    #[test]
    fn background_point() {
        let k = kernel(
            KernelConfig::default(),
            ObjectFlags::empty(),
            triangle(ShaderId::new(1)),
        );
        let kg = k.context();
        let mut sd = ShaderData::new(&k.config);
        sd.setup_from_ray(
            &kg,
            &hit(1.0),
            &Ray::new(vec3(0.25, 0.25, 1.0), vec3(0.0, 0.0, -1.0), f32::INFINITY),
        );

        let d = vec3(0.0, 1.0, 0.0);
        let mut ray = Ray::new(vec3(1.0, 2.0, 3.0), d, f32::INFINITY);
        ray.dd = Differential3 {
            dx: vec3(0.1, 0.0, 0.0),
            dy: vec3(0.0, 0.0, 0.1),
        };
        sd.setup_from_background(&kg, &ray);

        assert_eq!(sd.p, d);
        assert_eq!(sd.n, -d);
        assert_eq!(sd.i, -d);
        assert_eq!(sd.shader, k.config.background.surface_shader);
        assert_eq!(sd.prim, None);
        assert_eq!(sd.object, None);
        assert_eq!(sd.prim_type, PrimitiveType::None);
        assert!(!sd.is_backfacing());
        assert_eq!(sd.dp, ray.dd);
        assert_eq!(sd.di.dx, vec3(-0.1, 0.0, 0.0));
        assert_eq!(sd.du.dx, 0.0);
    }

    #[test]
    fn volume_point() {
        let k = kernel(
            KernelConfig::default(),
            ObjectFlags::empty(),
            triangle(ShaderId::new(1)),
        );
        let kg = k.context();
        let mut sd = ShaderData::new(&k.config);
        sd.shader = ShaderId::new(1);

        let ray = Ray::new(vec3(1.0, 2.0, 3.0), vec3(1.0, 0.0, 0.0), 4.0);
        sd.setup_from_volume(&kg, &ray);

        assert_eq!(sd.p, ray.o);
        assert_eq!(sd.i, vec3(-1.0, 0.0, 0.0));
        assert_eq!(sd.shader, ShaderId::default());
        assert_eq!(sd.prim, None);
        assert_eq!(sd.ray_p, ray.o);
    }
}
