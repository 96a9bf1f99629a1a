use bitflags::bitflags;
use strum::Display;

use crate::{
    closure::Label,
    config::{KernelConfig, KernelFeatures, RouletteEstimator},
    math::{Ray, Spectrum, Vec2},
    rng::{path_rng_1d, path_rng_2d, PRNG_BASE_NUM, PRNG_BOUNCE_NUM},
    shader::{KernelContext, ShaderData, ShaderFlags},
    volume_stack::VolumeStack,
};

bitflags! {
    /// Which kinds of rays a primitive is visible to.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct RayVisibility: u32 {
        const CAMERA = 1 << 0;
        const REFLECT = 1 << 1;
        const TRANSMIT = 1 << 2;
        const DIFFUSE = 1 << 3;
        const GLOSSY = 1 << 4;
        const SINGULAR = 1 << 5;
        const TRANSPARENT = 1 << 6;
        const SHADOW = 1 << 7;
    }
}

bitflags! {
    /// Flat view of [`PathFlags`] as seen by shader graphs.
    ///
    /// The low bits match [`RayVisibility`].
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct PathRayFlag: u32 {
        const CAMERA = 1 << 0;
        const REFLECT = 1 << 1;
        const TRANSMIT = 1 << 2;
        const DIFFUSE = 1 << 3;
        const GLOSSY = 1 << 4;
        const SINGULAR = 1 << 5;
        const TRANSPARENT = 1 << 6;
        const SHADOW = 1 << 7;
        const VOLUME_SCATTER = 1 << 8;
        const MIS_SKIP = 1 << 9;
        const DIFFUSE_ANCESTOR = 1 << 10;
        const STORE_SHADOW_INFO = 1 << 11;
    }
}

/// Event that spawned the current ray.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum ScatterCategory {
    Camera,
    Reflect,
    Transmit,
    VolumeScatter,
}

/// Lobe the last surface bounce was sampled from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum Lobe {
    None,
    Diffuse,
    Glossy,
    Singular,
}

/// Transport state of a path.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PathFlags {
    pub category: ScatterCategory,
    pub lobe: Lobe,
    /// Last event was a pass through a transparent surface
    pub transparent: bool,
    /// Light sampling MIS is skipped for the next hit
    pub mis_skip: bool,
    /// Set once any diffuse bounce has happened on the path
    pub diffuse_ancestor: bool,
    pub store_shadow_info: bool,
}

impl PathFlags {
    pub fn camera() -> Self {
        Self {
            category: ScatterCategory::Camera,
            lobe: Lobe::None,
            transparent: false,
            mis_skip: true,
            diffuse_ancestor: false,
            store_shadow_info: false,
        }
    }

    pub fn bits(&self) -> PathRayFlag {
        let mut ret = match self.category {
            ScatterCategory::Camera => PathRayFlag::CAMERA,
            ScatterCategory::Reflect => PathRayFlag::REFLECT,
            ScatterCategory::Transmit => PathRayFlag::TRANSMIT,
            ScatterCategory::VolumeScatter => PathRayFlag::VOLUME_SCATTER,
        };
        ret |= match self.lobe {
            Lobe::None => PathRayFlag::empty(),
            Lobe::Diffuse => PathRayFlag::DIFFUSE,
            Lobe::Glossy => PathRayFlag::GLOSSY,
            // Singular bounces also count as glossy for visibility
            Lobe::Singular => PathRayFlag::GLOSSY | PathRayFlag::SINGULAR,
        };
        ret.set(PathRayFlag::TRANSPARENT, self.transparent);
        ret.set(PathRayFlag::MIS_SKIP, self.mis_skip);
        ret.set(PathRayFlag::DIFFUSE_ANCESTOR, self.diffuse_ancestor);
        ret.set(PathRayFlag::STORE_SHADOW_INFO, self.store_shadow_info);
        ret
    }
}

impl Default for PathFlags {
    fn default() -> Self {
        Self::camera()
    }
}

/// State of one path, advanced once per scattering event.
#[derive(Clone, Debug)]
pub struct PathState {
    pub flags: PathFlags,

    pub rng_hash: u32,
    /// First random dimension of the current bounce
    pub rng_offset: u32,
    pub sample: u32,
    pub num_samples: u32,

    pub bounce: u32,
    pub diffuse_bounce: u32,
    pub glossy_bounce: u32,
    pub transmission_bounce: u32,
    pub transparent_bounce: u32,
    pub volume_bounce: u32,
    /// Volume bounding mesh crossings
    pub volume_bounds_bounce: u32,

    /// Smallest bsdf pdf along the path
    pub min_ray_pdf: f32,
    /// Pdf of the last bsdf sample
    pub ray_pdf: f32,
    /// Distance since the last bsdf sample, used for lamp MIS
    pub ray_t: f32,

    /// Weight of denoising features, they stop being written once it reaches zero
    pub denoising_feature_weight: f32,

    pub volume_stack: VolumeStack,
}

impl PathState {
    /// Creates the state of a camera path with an empty volume stack.
    pub fn new(config: &KernelConfig, rng_hash: u32, sample: u32) -> Self {
        let mut flags = PathFlags::camera();
        let denoising_feature_weight = if config.film.pass_denoising {
            flags.store_shadow_info = true;
            1.0
        } else {
            0.0
        };

        Self {
            flags,
            rng_hash,
            rng_offset: PRNG_BASE_NUM,
            sample,
            num_samples: config.integrator.aa_samples,
            bounce: 0,
            diffuse_bounce: 0,
            glossy_bounce: 0,
            transmission_bounce: 0,
            transparent_bounce: 0,
            volume_bounce: 0,
            volume_bounds_bounce: 0,
            min_ray_pdf: f32::INFINITY,
            ray_pdf: 0.0,
            ray_t: 0.0,
            denoising_feature_weight,
            volume_stack: VolumeStack::new(config.limits.volume_stack_size),
        }
    }

    /// Creates the state of a camera path, filling the volume stack with the volumes `ray` starts in.
    ///
    /// `stack_sd` is scratch space for the volume walk.
    pub fn init(
        kg: &KernelContext,
        stack_sd: &mut ShaderData,
        rng_hash: u32,
        sample: u32,
        ray: &Ray,
    ) -> Self {
        let mut state = Self::new(kg.config, rng_hash, sample);
        if kg.config.use_volumes() {
            state.volume_stack.init(kg, stack_sd, ray);
        }
        state
    }

    /// Advances the state past a scattering event classified by `label`.
    pub fn next(&mut self, config: &KernelConfig, label: Label) {
        // Transparent passes keep the flags of the previous ray and don't count as a bounce
        if label.contains(Label::TRANSPARENT) {
            self.flags.transparent = true;
            self.transparent_bounce += 1;

            // Keeping the rng offset avoids correlation between the layers, see
            // rng_1d_for_decision
            if !config.integrator.transparent_shadows {
                self.flags.mis_skip = true;
            }
            return;
        }

        self.bounce += 1;

        if label.contains(Label::VOLUME_SCATTER) {
            self.flags.category = ScatterCategory::VolumeScatter;
            self.flags.transparent = false;
            self.flags.lobe = Lobe::None;
            self.flags.mis_skip = false;
            self.volume_bounce += 1;
        } else {
            if label.contains(Label::REFLECT) {
                self.flags.category = ScatterCategory::Reflect;
                if label.contains(Label::DIFFUSE) {
                    self.diffuse_bounce += 1;
                } else {
                    self.glossy_bounce += 1;
                }
            } else {
                debug_assert!(
                    label.contains(Label::TRANSMIT),
                    "Unexpected scatter label {:?}",
                    label
                );
                self.flags.category = ScatterCategory::Transmit;
                self.transmission_bounce += 1;
            }
            self.flags.transparent = false;

            if label.contains(Label::DIFFUSE) {
                self.flags.lobe = Lobe::Diffuse;
                self.flags.diffuse_ancestor = true;
                self.flags.mis_skip = false;
            } else if label.contains(Label::GLOSSY) {
                self.flags.lobe = Lobe::Glossy;
                self.flags.mis_skip = false;
            } else {
                debug_assert!(
                    label.contains(Label::SINGULAR),
                    "Unexpected lobe label {:?}",
                    label
                );
                self.flags.lobe = Lobe::Singular;
                self.flags.mis_skip = true;
            }
        }

        self.rng_offset += PRNG_BOUNCE_NUM;

        if self.denoising_feature_weight == 0.0 {
            self.flags.store_shadow_info = false;
        }
    }

    /// Counts a pass through a volume bounding mesh.
    ///
    /// Returns `false` once the path has crossed so many boundaries that it's
    /// likely stuck on self intersections.
    pub fn volume_next(&mut self, config: &KernelConfig) -> bool {
        self.volume_bounds_bounce += 1;
        if self.volume_bounds_bounce > config.limits.volume_bounds_max {
            return false;
        }

        if self.volume_bounds_bounce > 1 {
            self.rng_offset += PRNG_BOUNCE_NUM;
        }

        true
    }

    /// Visibility mask for rays spawned from the current state.
    pub fn ray_visibility(&self) -> RayVisibility {
        let flags = self.flags.bits();
        let mut ret = RayVisibility::from_bits_truncate(flags.bits());

        // Diffuse and glossy visibility only apply to reflection
        if ret.contains(RayVisibility::TRANSMIT) {
            ret.remove(RayVisibility::DIFFUSE | RayVisibility::GLOSSY);
        }
        // Volume scatter doesn't have its own visibility yet
        if flags.contains(PathRayFlag::VOLUME_SCATTER) {
            ret.insert(RayVisibility::DIFFUSE);
        }

        ret
    }

    /// Probability of continuing the path at the shading point `sd`.
    pub fn terminate_probability(
        &self,
        config: &KernelConfig,
        sd: &ShaderData,
        throughput: Spectrum<f32>,
    ) -> f32 {
        let integrator = &config.integrator;
        if self.flags.transparent {
            if self.transparent_bounce >= integrator.transparent_max_bounce {
                return 0.0;
            } else if self.transparent_bounce <= integrator.transparent_min_bounce {
                return 1.0;
            }
        } else {
            let (max_diffuse, max_glossy, max_transmission) =
                if sd.shader_info.flags.contains(ShaderFlags::OVERRIDE_BOUNCES) {
                    let bounces = &sd.shader_info.bounces;
                    (bounces.diffuse, bounces.glossy, bounces.transmission)
                } else {
                    (
                        integrator.max_diffuse_bounce,
                        integrator.max_glossy_bounce,
                        integrator.max_transmission_bounce,
                    )
                };

            if self.bounce >= integrator.max_bounce
                || self.diffuse_bounce >= max_diffuse
                || self.glossy_bounce >= max_glossy
                || (config.features.contains(KernelFeatures::VOLUME)
                    && self.volume_bounce >= integrator.max_volume_bounce)
                || self.transmission_bounce >= max_transmission
            {
                return 0.0;
            } else if self.bounce <= integrator.min_bounce {
                return 1.0;
            }
        }

        match integrator.roulette {
            RouletteEstimator::Average => throughput.average(),
            RouletteEstimator::Max => throughput.max_comp(),
        }
    }

    /// Temporarily shifts the bounce count for a nested shader evaluation.
    ///
    /// Calls have to be paired.
    pub fn modify_bounce(&mut self, increase: bool) {
        if increase {
            self.bounce += 1;
        } else {
            debug_assert!(self.bounce > 0, "Unpaired bounce decrease");
            self.bounce -= 1;
        }
    }

    /// Random number for `dimension` of the current bounce.
    pub fn rng_1d(&self, dimension: u32) -> f32 {
        path_rng_1d(self.rng_hash, self.sample, self.rng_offset + dimension)
    }

    pub fn rng_2d(&self, dimension: u32) -> Vec2<f32> {
        path_rng_2d(self.rng_hash, self.sample, self.rng_offset + dimension)
    }

    /// Random number for a decision that shouldn't correlate between transparent layers.
    pub fn rng_1d_for_decision(&self, dimension: u32) -> f32 {
        let offset = self.rng_offset + self.transparent_bounce * PRNG_BOUNCE_NUM;
        path_rng_1d(self.rng_hash, self.sample, offset + dimension)
    }
}
