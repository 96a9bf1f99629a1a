use super::{Integrator, RadianceResult};
use crate::{
    closure::{ClosureFlags, Label},
    geometry::ray_offset,
    hikari_trace,
    math::{Ray, Spectrum},
    path_state::PathState,
    rng::bounce,
    shader::{KernelContext, ShaderData},
};

// Based on Physically Based Rendering 3rd ed.
// https://www.pbr-book.org/3ed-2018/Light_Transport_I_Surface_Reflection/Path_Tracing

/// Unidirectional path tracer that only gathers emission hit by bsdf samples.
#[derive(Copy, Clone, Debug, Default)]
pub struct PathIntegrator {
    /// Clamp for the contribution of indirect hits, `None` to disable
    pub indirect_clamp: Option<f32>,
}

impl PathIntegrator {
    pub fn new(indirect_clamp: Option<f32>) -> Self {
        Self { indirect_clamp }
    }

    fn clamp_indirect(&self, state: &PathState, radiance: Spectrum<f32>) -> Spectrum<f32> {
        match self.indirect_clamp {
            Some(max) if state.bounce > 0 => {
                let peak = radiance.max_comp();
                if peak > max {
                    radiance * (max / peak)
                } else {
                    radiance
                }
            }
            _ => radiance,
        }
    }
}

impl Integrator for PathIntegrator {
    fn li(
        &self,
        kg: &KernelContext,
        sd: &mut ShaderData,
        mut ray: Ray,
        rng_hash: u32,
        sample: u32,
    ) -> RadianceResult {
        let config = kg.config;
        let mut state = PathState::init(kg, sd, rng_hash, sample, &ray);

        let mut incoming_radiance = Spectrum::zeros();
        let mut throughput = Spectrum::ones();
        let mut ray_count = 0;
        loop {
            ray_count += 1;
            let isect = match kg.scene.intersect(&ray, state.ray_visibility()) {
                Some(isect) => isect,
                None => {
                    sd.setup_from_background(kg, &ray);
                    let background = sd.eval_background(kg, &state, state.flags.bits());
                    incoming_radiance +=
                        self.clamp_indirect(&state, throughput * background);
                    break;
                }
            };

            sd.setup_from_ray(kg, &isect, &ray);
            let randb = state.rng_1d(bounce::BSDF);
            sd.eval_surface(kg, &state, randb, state.flags.bits());

            let closure_flags = sd.closures.flags();
            if closure_flags.contains(ClosureFlags::HOLDOUT) {
                let holdout = sd.holdout_eval();
                if holdout.max_comp() >= 1.0 {
                    break;
                }
                throughput *= Spectrum::ones() - holdout;
            }

            if closure_flags.contains(ClosureFlags::EMISSION) {
                let emission = sd.emissive_eval();
                incoming_radiance += self.clamp_indirect(&state, throughput * emission);
            }

            let probability = state.terminate_probability(config, sd, throughput);
            if probability == 0.0 {
                break;
            } else if probability != 1.0 {
                let terminate = state.rng_1d_for_decision(bounce::TERMINATE);
                if terminate >= probability {
                    break;
                }
                throughput *= 1.0 / probability;
            }

            let sample = sd.bsdf_sample(config, state.rng_2d(bounce::BSDF_U));
            if sample.is_none() {
                break;
            }

            let value = if sample.label.contains(Label::TRANSPARENT) && sample.eval.use_light_pass
            {
                sample.eval.transparent
            } else {
                sample.eval.sum() + sample.eval.transparent
            };
            throughput *= value * (1.0 / sample.pdf);
            if throughput.is_black() {
                break;
            }

            if !sample.label.contains(Label::TRANSPARENT) {
                state.ray_pdf = sample.pdf;
                state.ray_t = 0.0;
                state.min_ray_pdf = state.min_ray_pdf.min(sample.pdf);
            } else {
                state.ray_t += sd.ray_length;
            }

            state.next(config, sample.label);

            let transmit = sample.label.contains(Label::TRANSMIT);
            if transmit && config.use_volumes() {
                state.volume_stack.enter_exit(sd);
            }

            let origin = ray_offset(sd.p, if transmit { -sd.ng } else { sd.ng });
            ray = Ray {
                o: origin,
                d: sample.omega_in,
                t_max: f32::INFINITY,
                time: ray.time,
                dp: sd.dp,
                dd: sample.domega_in,
            };

            hikari_trace!(
                "Bounce {} with {:?}, throughput {:?}",
                state.bounce,
                sample.label,
                throughput
            );
        }

        RadianceResult {
            li: incoming_radiance,
            ray_scene_intersections: ray_count,
        }
    }
}
