use super::{KernelContext, RuntimeFlags, ShaderData, ShaderFlags, ShaderInfo, ShaderType};
use crate::{
    closure::{emissive_simple_eval, BsdfEval, ClosureData, ClosureType, Label, ShaderClosure},
    config::KernelConfig,
    geometry::{Intersection, ObjectFlags},
    math::{safe_divide, Differential3, Spectrum, Vec2, Vec3},
    path_state::{PathRayFlag, PathState},
    rng::{lcg_state_init, LCG_SCRAMBLE},
    volume_stack::VolumeStack,
};

/// Result of sampling the closures at a shading point.
///
/// An empty `label` and zero `pdf` mean no scattering event, `omega_in` is
/// meaningless then.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BsdfSample {
    pub label: Label,
    pub eval: BsdfEval,
    pub omega_in: Vec3<f32>,
    pub domega_in: Differential3,
    pub pdf: f32,
}

impl Default for BsdfSample {
    fn default() -> Self {
        Self {
            label: Label::empty(),
            eval: BsdfEval::default(),
            omega_in: Vec3::zeros(),
            domega_in: Differential3::zeros(),
            pdf: 0.0,
        }
    }
}

impl BsdfSample {
    pub fn is_none(&self) -> bool {
        self.pdf == 0.0
    }
}

impl ShaderData {
    /// Folds closures that only differ by weight.
    pub fn merge_closures(&mut self) {
        self.closures.merge();
    }

    /// Picks a closure matching `filter` proportionally to its sample weight using `randb_closure`.
    fn pick_closure(&self, filter: impl Fn(ClosureType) -> bool) -> Option<usize> {
        if self.closures.len() <= 1 {
            return if self.closures.is_empty() { None } else { Some(0) };
        }

        let sum: f32 = self
            .closures
            .iter()
            .filter(|sc| filter(sc.ty()))
            .map(|sc| sc.sample_weight)
            .sum();

        let r = self.randb_closure * sum;
        let mut partial_sum = 0.0;
        for (i, sc) in self.closures.iter().enumerate() {
            if filter(sc.ty()) {
                partial_sum += sc.sample_weight;
                if r <= partial_sum {
                    return Some(i);
                }
            }
        }

        // Rounding pushed r past the last closure
        None
    }

    /// One-sample model with balance weights, some pdf factors cancel out.
    ///
    /// Returns the combined pdf.
    fn bsdf_multi_eval(
        &self,
        omega_in: Vec3<f32>,
        skip: Option<usize>,
        result: &mut BsdfEval,
        mut sum_pdf: f32,
        mut sum_sample_weight: f32,
    ) -> f32 {
        for (i, sc) in self.closures.iter().enumerate() {
            if Some(i) == skip || !sc.ty().is_bsdf() {
                continue;
            }

            let (eval, bsdf_pdf) = sc.bsdf_eval(self.ng, self.i, omega_in);
            if bsdf_pdf != 0.0 {
                result.accum(sc.ty(), eval * sc.weight, 1.0);
                sum_pdf += bsdf_pdf * sc.sample_weight;
            }
            sum_sample_weight += sc.sample_weight;
        }

        if sum_sample_weight > 0.0 {
            sum_pdf / sum_sample_weight
        } else {
            0.0
        }
    }

    fn bsdf_multi_eval_branched(
        &self,
        config: &KernelConfig,
        omega_in: Vec3<f32>,
        result: &mut BsdfEval,
        light_pdf: f32,
        use_mis: bool,
    ) {
        for sc in self.closures.iter().filter(|sc| sc.ty().is_bsdf()) {
            let (eval, bsdf_pdf) = sc.bsdf_eval(self.ng, self.i, omega_in);
            if bsdf_pdf != 0.0 {
                let mis_weight = if use_mis {
                    config.mis_weight(light_pdf, bsdf_pdf)
                } else {
                    1.0
                };
                result.accum(sc.ty(), eval * sc.weight, mis_weight);
            }
        }
    }

    /// Evaluates all bsdfs for light arriving from `omega_in`.
    ///
    /// With `use_mis`, the result is weighted against a light sample of `light_pdf`.
    pub fn bsdf_eval(
        &self,
        config: &KernelConfig,
        omega_in: Vec3<f32>,
        light_pdf: f32,
        use_mis: bool,
    ) -> BsdfEval {
        let mut eval = BsdfEval::init(None, Spectrum::zeros(), config.film.use_light_pass);

        if config.use_branched() {
            self.bsdf_multi_eval_branched(config, omega_in, &mut eval, light_pdf, use_mis);
        } else {
            let pdf = self.bsdf_multi_eval(omega_in, None, &mut eval, 0.0, 0.0);
            if use_mis {
                eval.mis(config.mis_weight(light_pdf, pdf));
            }
        }

        eval
    }

    /// Samples an incoming direction from one of the bsdfs.
    ///
    /// The closure is picked with `randb_closure` and the pdf accounts for
    /// the other bsdfs reaching the sampled direction.
    pub fn bsdf_sample(&self, config: &KernelConfig, u: Vec2<f32>) -> BsdfSample {
        let sampled = match self.pick_closure(ClosureType::is_bsdf) {
            Some(i) => i,
            None => return BsdfSample::default(),
        };
        let sc = &self.closures.as_slice()[sampled];

        let mut ret = self.bsdf_sample_closure(config, sc, u);
        if ret.pdf != 0.0 && self.closures.len() > 1 {
            let sweight = sc.sample_weight;
            ret.pdf = self.bsdf_multi_eval(
                ret.omega_in,
                Some(sampled),
                &mut ret.eval,
                ret.pdf * sweight,
                sweight,
            );
        }

        ret
    }

    /// Samples an incoming direction from `sc` only.
    pub fn bsdf_sample_closure(
        &self,
        config: &KernelConfig,
        sc: &ShaderClosure,
        u: Vec2<f32>,
    ) -> BsdfSample {
        let sample = sc.bsdf_sample(self.ng, self.i, &self.di, u);
        if sample.pdf == 0.0 {
            return BsdfSample {
                label: sample.label,
                ..BsdfSample::default()
            };
        }

        BsdfSample {
            label: sample.label,
            eval: BsdfEval::init(
                Some(sc.ty()),
                sample.eval * sc.weight,
                config.film.use_light_pass,
            ),
            omega_in: sample.omega_in,
            domega_in: sample.domega_in,
            pdf: sample.pdf,
        }
    }

    /// Widens glossy lobes to at least `roughness`.
    pub fn bsdf_blur(&mut self, roughness: f32) {
        for sc in self.closures.iter_mut().filter(|sc| sc.ty().is_bsdf()) {
            sc.blur(roughness);
        }
    }

    pub fn transparency(&self) -> Spectrum<f32> {
        if self.shader_info.flags.contains(ShaderFlags::HAS_ONLY_VOLUME) {
            return Spectrum::ones();
        }
        self.closure_weight_sum(|ty| ty == ClosureType::Transparent)
    }

    /// Zeroes transparent closures so they no longer pass or get picked.
    pub fn disable_transparency(&mut self) {
        for sc in self
            .closures
            .iter_mut()
            .filter(|sc| sc.ty() == ClosureType::Transparent)
        {
            sc.weight = Spectrum::zeros();
            sc.sample_weight = 0.0;
        }
    }

    pub fn alpha(&self) -> Spectrum<f32> {
        (Spectrum::ones() - self.transparency()).clamped(0.0, 1.0)
    }

    pub fn diffuse(&self) -> Spectrum<f32> {
        self.closure_weight_sum(ClosureType::is_bsdf_diffuse)
    }

    pub fn glossy(&self) -> Spectrum<f32> {
        self.closure_weight_sum(ClosureType::is_bsdf_glossy)
    }

    pub fn transmission(&self) -> Spectrum<f32> {
        self.closure_weight_sum(ClosureType::is_bsdf_transmission)
    }

    pub fn subsurface(&self) -> Spectrum<f32> {
        self.closure_weight_sum(|ty| ty.is_bssrdf() || ty.is_bsdf_bssrdf())
    }

    /// Ambient occlusion weight and the normal to gather it around.
    ///
    /// Diffuse closures count with `ao_factor`, the normal blends theirs by weight.
    pub fn ao(&self, ao_factor: f32) -> (Spectrum<f32>, Vec3<f32>) {
        let mut eval = Spectrum::zeros();
        let mut n = Vec3::zeros();

        for sc in &self.closures {
            if sc.ty().is_bsdf_diffuse() {
                eval += sc.weight * ao_factor;
                n += sc.normal().unwrap_or(self.n) * sc.weight.average();
            } else if sc.ty().is_ambient_occlusion() {
                eval += sc.weight;
                n += self.n * sc.weight.average();
            }
        }

        let n = if n.is_zero() { self.n } else { n.normalized() };
        (eval, n)
    }

    /// Total subsurface weight with the weighted normal and texture blur of the subsurface closures.
    pub fn bssrdf_sum(&self) -> (Spectrum<f32>, Vec3<f32>, f32) {
        let mut eval = Spectrum::zeros();
        let mut n = Vec3::zeros();
        let mut texture_blur = 0.0;
        let mut weight_sum = 0.0;

        for sc in &self.closures {
            if let (true, ClosureData::Bssrdf(bssrdf)) = (sc.ty().is_bssrdf(), sc.data()) {
                let avg_weight = sc.weight.average().abs();
                n += bssrdf.n * avg_weight;
                eval += sc.weight;
                texture_blur += bssrdf.texture_blur * avg_weight;
                weight_sum += avg_weight;
            }
        }

        let n = if n.is_zero() { self.n } else { n.normalized() };
        (eval, n, safe_divide(texture_blur, weight_sum))
    }

    pub fn emissive_eval(&self) -> Spectrum<f32> {
        let mut eval = Spectrum::zeros();
        for sc in self.closures.iter().filter(|sc| sc.ty().is_emission()) {
            eval += emissive_simple_eval(self.ng, self.i) * sc.weight;
        }
        eval
    }

    pub fn holdout_eval(&self) -> Spectrum<f32> {
        self.closure_weight_sum(ClosureType::is_holdout)
    }

    fn closure_weight_sum(&self, filter: impl Fn(ClosureType) -> bool) -> Spectrum<f32> {
        let mut sum = Spectrum::zeros();
        for sc in self.closures.iter().filter(|sc| filter(sc.ty())) {
            sum += sc.weight;
        }
        sum
    }

    /// Runs the surface shader, `randb` picks the closure for later sampling.
    pub fn eval_surface(
        &mut self,
        kg: &KernelContext,
        state: &PathState,
        randb: f32,
        path_flags: PathRayFlag,
    ) {
        self.closures.clear();
        self.randb_closure = randb;

        kg.graph
            .eval_nodes(kg, self, state, ShaderType::Surface, path_flags);

        self.lcg_state =
            lcg_state_init(state.rng_hash, state.rng_offset, state.sample, LCG_SCRAMBLE);
    }

    /// Runs the background shader and returns its radiance.
    pub fn eval_background(
        &mut self,
        kg: &KernelContext,
        state: &PathState,
        path_flags: PathRayFlag,
    ) -> Spectrum<f32> {
        self.closures.clear();
        self.randb_closure = 0.0;

        kg.graph
            .eval_nodes(kg, self, state, ShaderType::Surface, path_flags);

        self.closure_weight_sum(ClosureType::is_background)
    }

    /// Runs the ambient occlusion variant of the background shader.
    ///
    /// Shaders without an AO output give white.
    pub fn eval_ao_env(
        &mut self,
        kg: &KernelContext,
        state: &PathState,
        path_flags: PathRayFlag,
    ) -> Spectrum<f32> {
        self.closures.clear();
        self.randb_closure = 0.0;

        kg.graph
            .eval_nodes(kg, self, state, ShaderType::AoSurface, path_flags);

        if self.closures.is_empty() {
            Spectrum::ones()
        } else {
            self.closure_weight_sum(ClosureType::is_background)
        }
    }

    /// Runs the displacement shader, which moves `p`.
    pub fn eval_displacement(&mut self, kg: &KernelContext, state: &PathState) {
        self.closures.clear();
        self.randb_closure = 0.0;

        kg.graph.eval_nodes(
            kg,
            self,
            state,
            ShaderType::Displacement,
            PathRayFlag::empty(),
        );
    }

    /// Runs the volume shaders of every medium in `stack` that covers the
    /// current distance, gathering their closures into one list.
    ///
    /// `randb_closure` is reset, callers set it before [`ShaderData::phase_sample`].
    pub fn eval_volume(
        &mut self,
        kg: &KernelContext,
        state: &PathState,
        stack: &VolumeStack,
        path_flags: PathRayFlag,
    ) {
        self.closures.clear();
        self.randb_closure = 0.0;
        self.runtime_flags = RuntimeFlags::empty();
        self.shader_info = ShaderInfo::default();
        self.object_flags = ObjectFlags::empty();

        let p = self.p;
        for (i, entry) in stack.iter().enumerate() {
            if !entry.contains(self.ray_length) {
                continue;
            }

            self.object = entry.object;
            self.shader = entry.shader;
            self.fetch_shader_info(kg);

            self.object_flags = ObjectFlags::empty();
            if let Some(object) = entry.object {
                self.object_flags = kg.scene.object_flags(object);
                self.setup_object_transforms(kg, self.time);
            }

            self.p = p - self.volume_motion_offset(kg, p);

            kg.graph
                .eval_nodes(kg, self, state, ShaderType::Volume, path_flags);

            // Stacked media would otherwise run out of closure slots
            if i > 0 {
                self.merge_closures();
            }
        }
        self.p = p;
    }

    /// Offset that moves the shading point back to where a moving volume was at mid-shutter.
    fn volume_motion_offset(&self, kg: &KernelContext, p: Vec3<f32>) -> Vec3<f32> {
        let camera = &kg.config.camera;
        let (shutter_time, object) = match (camera.shutter_time, self.object) {
            (Some(shutter_time), Some(object)) => (shutter_time, object),
            _ => return Vec3::zeros(),
        };

        match kg.scene.volume_velocity(object, p) {
            Some(velocity) => {
                let velocity_scale =
                    self.shader_info.velocity_scale * shutter_time * camera.inv_fps;
                let velocity = velocity * velocity_scale;
                velocity * (self.time - 0.5 + camera.motion_offset * velocity_scale)
            }
            None => Vec3::zeros(),
        }
    }

    /// Evaluates the phase functions for light arriving from `omega_in`.
    pub fn phase_eval(&self, config: &KernelConfig, omega_in: Vec3<f32>) -> (BsdfEval, f32) {
        let mut eval = BsdfEval::init(None, Spectrum::zeros(), config.film.use_light_pass);
        let pdf = self.phase_multi_eval(omega_in, None, &mut eval, 0.0, 0.0);
        (eval, pdf)
    }

    fn phase_multi_eval(
        &self,
        omega_in: Vec3<f32>,
        skip: Option<usize>,
        result: &mut BsdfEval,
        mut sum_pdf: f32,
        mut sum_sample_weight: f32,
    ) -> f32 {
        for (i, sc) in self.closures.iter().enumerate() {
            if Some(i) == skip || !sc.ty().is_phase() {
                continue;
            }

            let (eval, phase_pdf) = sc.phase_eval(self.i, omega_in);
            if phase_pdf != 0.0 {
                // Scattering coefficients are applied by the volume integrator
                result.accum(sc.ty(), eval, 1.0);
                sum_pdf += phase_pdf * sc.sample_weight;
            }
            sum_sample_weight += sc.sample_weight;
        }

        if sum_sample_weight > 0.0 {
            sum_pdf / sum_sample_weight
        } else {
            0.0
        }
    }

    /// Samples an incoming direction from one of the phase functions.
    ///
    /// Unlike [`ShaderData::bsdf_sample`], the pdf is that of the picked closure alone.
    pub fn phase_sample(&self, config: &KernelConfig, u: Vec2<f32>) -> BsdfSample {
        match self.pick_closure(ClosureType::is_phase) {
            Some(i) => self.phase_sample_closure(config, &self.closures.as_slice()[i], u),
            None => BsdfSample::default(),
        }
    }

    /// Samples an incoming direction from the phase function `sc` only.
    pub fn phase_sample_closure(
        &self,
        config: &KernelConfig,
        sc: &ShaderClosure,
        u: Vec2<f32>,
    ) -> BsdfSample {
        let sample = sc.phase_sample(self.i, &self.di, u);
        if sample.pdf == 0.0 {
            return BsdfSample {
                label: sample.label,
                ..BsdfSample::default()
            };
        }

        BsdfSample {
            label: sample.label,
            eval: BsdfEval::init(Some(sc.ty()), sample.eval, config.film.use_light_pass),
            omega_in: sample.omega_in,
            domega_in: sample.domega_in,
            pdf: sample.pdf,
        }
    }
}

/// Checks if shadow rays may pass through the surface hit by `isect`.
pub fn transparent_shadow(kg: &KernelContext, isect: &Intersection) -> bool {
    let shader = if isect.prim_type.is_curve() {
        kg.scene.curve(isect.prim).shader
    } else {
        kg.scene.triangle(isect.prim).shader
    };

    kg.shaders
        .flags(shader)
        .intersects(ShaderFlags::HAS_TRANSPARENT_SHADOW | ShaderFlags::USE_UNIFORM_ALPHA)
}
