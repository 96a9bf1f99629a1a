mod path;

pub use path::PathIntegrator;

use rayon::prelude::*;

use crate::{
    hikari_debug,
    math::{Ray, Spectrum, Vec2},
    rng::{camera, path_rng_1d, path_rng_2d, pixel_rng_hash},
    shader::{KernelContext, ShaderData},
};

use std::sync::atomic::{AtomicBool, Ordering};

pub struct RadianceResult {
    pub li: Spectrum<f32>,
    pub ray_scene_intersections: usize,
}

impl Default for RadianceResult {
    fn default() -> Self {
        Self {
            li: Spectrum::zeros(),
            ray_scene_intersections: 0,
        }
    }
}

/// Generates the primary ray through film position `p_film` at shutter time `time`.
pub trait CameraRays: Sync {
    fn ray(&self, p_film: Vec2<f32>, time: f32) -> Ray;
}

impl<F> CameraRays for F
where
    F: Fn(Vec2<f32>, f32) -> Ray + Sync,
{
    fn ray(&self, p_film: Vec2<f32>, time: f32) -> Ray {
        self(p_film, time)
    }
}

// Public interface for kernel integrators.
pub trait Integrator: Sync {
    /// Evaluates the incoming radiance along `ray`. Also returns the number of rays intersected with the scene.
    ///
    /// `sd` is scratch space owned by the calling thread.
    fn li(
        &self,
        kg: &KernelContext,
        sd: &mut ShaderData,
        ray: Ray,
        rng_hash: u32,
        sample: u32,
    ) -> RadianceResult;

    /// Renders `pixels`, laid out in rows of `width`, with the configured sample count.
    ///
    /// Stops early once `cancel` is set. Returns the number of rays intersected with the scene.
    fn render(
        &self,
        kg: &KernelContext,
        camera: &dyn CameraRays,
        width: u32,
        pixels: &mut [Spectrum<f32>],
        cancel: &AtomicBool,
    ) -> usize {
        assert!(width > 0, "Zero width film");

        let sample_count = kg.config.integrator.aa_samples.max(1);
        let shutter = kg.config.camera.shutter_time.is_some();

        hikari_debug!(
            "Rendering {} pixels with {} samples each",
            pixels.len(),
            sample_count
        );

        pixels
            .par_iter_mut()
            .enumerate()
            .map_init(
                || ShaderData::new(kg.config),
                |sd, (i, pixel)| {
                    let x = (i as u32) % width;
                    let y = (i as u32) / width;
                    let rng_hash = pixel_rng_hash(x, y);

                    let mut color = Spectrum::zeros();
                    let mut ray_count = 0;
                    let mut samples_taken = 0;
                    for sample in 0..sample_count {
                        if cancel.load(Ordering::Relaxed) {
                            break;
                        }

                        let p_film = Vec2::new(x as f32, y as f32)
                            + path_rng_2d(rng_hash, sample, camera::FILTER_U);
                        let time = if shutter {
                            path_rng_1d(rng_hash, sample, camera::TIME)
                        } else {
                            0.5
                        };
                        let ray = camera.ray(p_film, time);

                        let result = self.li(kg, sd, ray, rng_hash, sample);
                        color += result.li;
                        ray_count += result.ray_scene_intersections;
                        samples_taken += 1;
                    }

                    if samples_taken > 0 {
                        *pixel = color / (samples_taken as f32);
                    }
                    ray_count
                },
            )
            .sum()
    }
}
