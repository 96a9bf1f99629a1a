#[cfg(test)]
mod tests {
    use hikari::{
        config::KernelConfig,
        geometry::{ObjectFlags, ObjectId},
        math::{vec3, Ray, Spectrum},
        shader::{ShaderData, ShaderId},
        volume_stack::VolumeStack,
    };

    use crate::common::{TestKernel, TestScene, TestShader};

    const SHADERS: [TestShader; 4] = [
        TestShader::Background(Spectrum { r: 1.0, g: 1.0, b: 1.0 }),
        TestShader::Volume(Spectrum { r: 0.5, g: 0.5, b: 0.5 }, 0.0),
        TestShader::Volume(Spectrum { r: 0.2, g: 0.2, b: 0.2 }, 0.0),
        TestShader::Volume(Spectrum { r: 0.1, g: 0.1, b: 0.1 }, 0.0),
    ];

    // Camera at the origin looking up +z.
    //   A: volume the camera is inside, only its top at z = 1 is in front
    //   B: volume fully in front, spans z = 2..3
    //   C: surface without a volume at z = 1.5
    fn nested_scene(config: KernelConfig) -> (TestKernel, ObjectId, ObjectId) {
        let mut scene = TestScene::new();
        let a = scene.add_object(ObjectFlags::HAS_VOLUME);
        scene.add_quad(a, 1.0, 10.0, true, ShaderId::new(1));
        scene.add_quad(a, -1.0, 10.0, false, ShaderId::new(1));

        let b = scene.add_object(ObjectFlags::HAS_VOLUME);
        scene.add_quad(b, 2.0, 10.0, false, ShaderId::new(2));
        scene.add_quad(b, 3.0, 10.0, true, ShaderId::new(2));

        let c = scene.add_object(ObjectFlags::empty());
        scene.add_quad(c, 1.5, 10.0, false, ShaderId::new(3));

        (TestKernel::new(config, scene, SHADERS.to_vec()), a, b)
    }

    fn camera_ray() -> Ray {
        Ray::new(vec3(0.1, 0.2, 0.0), vec3(0.0, 0.0, 1.0), f32::INFINITY)
    }

    #[test]
    fn camera_inside_volume() {
        let mut config = KernelConfig::default();
        config.camera.is_inside_volume = true;
        let (k, a, b) = nested_scene(config);
        let kg = k.context();
        let mut stack_sd = ShaderData::new(&k.config);

        let mut stack = VolumeStack::new(k.config.limits.volume_stack_size);
        stack.init(&kg, &mut stack_sd, &camera_ray());

        assert_eq!(stack.len(), 1);
        let entry = stack.entries()[0];
        assert_eq!(entry.object, Some(a));
        assert_eq!(entry.shader.index(), 1);
        assert!(!stack.contains_object(Some(b)));
    }

    #[test]
    fn camera_outside_volumes() {
        let (k, _, _) = nested_scene(KernelConfig::default());
        let kg = k.context();
        let mut stack_sd = ShaderData::new(&k.config);

        let mut stack = VolumeStack::new(k.config.limits.volume_stack_size);
        stack.init(&kg, &mut stack_sd, &camera_ray());
        assert!(stack.is_empty());

        // Only the world volume applies
        let mut config = KernelConfig::default();
        config.background.volume_shader = Some(ShaderId::new(3));
        let (k, _, _) = nested_scene(config);
        stack.init(&k.context(), &mut stack_sd, &camera_ray());
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.entries()[0].object, None);
        assert_eq!(stack.entries()[0].shader, ShaderId::new(3));
    }

    #[test]
    fn world_volume_when_nothing_encloses() {
        let mut config = KernelConfig::default();
        config.camera.is_inside_volume = true;
        config.background.volume_shader = Some(ShaderId::new(3));
        let (k, _, _) = nested_scene(config);
        let kg = k.context();
        let mut stack_sd = ShaderData::new(&k.config);

        // Looking down from above everything, every boundary is entered before it's exited
        let ray = Ray::new(vec3(0.1, 0.2, 5.0), vec3(0.0, 0.0, -1.0), f32::INFINITY);
        let mut stack = VolumeStack::new(k.config.limits.volume_stack_size);
        stack.init(&kg, &mut stack_sd, &ray);

        assert_eq!(stack.len(), 1);
        assert_eq!(stack.entries()[0].object, None);
    }

    #[test]
    fn walk_respects_capacity() {
        let mut config = KernelConfig::default();
        config.camera.is_inside_volume = true;
        config.limits.volume_stack_size = 2;

        let mut scene = TestScene::new();
        for i in 0..4 {
            let o = scene.add_object(ObjectFlags::HAS_VOLUME);
            scene.add_quad(o, 1.0 + i as f32, 10.0, true, ShaderId::new(1));
        }
        let k = TestKernel::new(config, scene, SHADERS.to_vec());
        let kg = k.context();
        let mut stack_sd = ShaderData::new(&k.config);

        let mut stack = VolumeStack::new(k.config.limits.volume_stack_size);
        stack.init(&kg, &mut stack_sd, &camera_ray());
        assert_eq!(stack.len(), 1);
        assert!(stack.is_full());
        assert_eq!(stack.entries()[0].object, Some(ObjectId(0)));
    }
}
