mod array;
mod bssrdf;
mod diffuse;
mod emissive;
mod eval;
mod microfacet;
mod oren_nayar;
mod phase;
mod singular;

pub use array::ClosureArray;
pub use bssrdf::{Bssrdf, Falloff, BSSRDF_MIN_RADIUS};
pub use diffuse::DiffuseBsdf;
pub use emissive::emissive_simple_eval;
pub use eval::BsdfEval;
pub use microfacet::{MicrofacetBsdf, SINGULAR_ALPHA};
pub use oren_nayar::OrenNayarBsdf;
pub use phase::HenyeyGreenstein;
pub use singular::{fresnel_dielectric, FresnelDielectric, SINGULAR_PDF};

use bitflags::bitflags;
use strum::{Display, EnumIter};

use crate::math::{Differential3, Spectrum, Vec2, Vec3};

/// Closures with a smaller average weight are not stored.
pub const CLOSURE_WEIGHT_CUTOFF: f32 = 1e-5;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ClosureType {
    Diffuse,
    OrenNayar,
    Translucent,
    /// Diffuse lobe used in place of a subsurface closure
    SubsurfaceDiffuse,
    Reflection,
    GgxReflection,
    Refraction,
    GgxRefraction,
    Transparent,
    CubicBssrdf,
    GaussianBssrdf,
    BurleyBssrdf,
    Emission,
    Background,
    Holdout,
    AmbientOcclusion,
    VolumeAbsorption,
    HenyeyGreenstein,
}

impl ClosureType {
    pub fn is_bsdf(self) -> bool {
        self.is_bsdf_diffuse()
            || self.is_bsdf_glossy()
            || self.is_bsdf_transmission()
            || self.is_bsdf_bssrdf()
            || self == ClosureType::Transparent
    }

    pub fn is_bsdf_diffuse(self) -> bool {
        matches!(self, ClosureType::Diffuse | ClosureType::OrenNayar)
    }

    pub fn is_bsdf_glossy(self) -> bool {
        matches!(self, ClosureType::Reflection | ClosureType::GgxReflection)
    }

    pub fn is_bsdf_transmission(self) -> bool {
        matches!(
            self,
            ClosureType::Translucent | ClosureType::Refraction | ClosureType::GgxRefraction
        )
    }

    pub fn is_bsdf_bssrdf(self) -> bool {
        self == ClosureType::SubsurfaceDiffuse
    }

    /// Delta lobes that can only be sampled, never evaluated.
    pub fn is_bsdf_singular(self) -> bool {
        matches!(
            self,
            ClosureType::Reflection | ClosureType::Refraction | ClosureType::Transparent
        )
    }

    pub fn is_bssrdf(self) -> bool {
        matches!(
            self,
            ClosureType::CubicBssrdf | ClosureType::GaussianBssrdf | ClosureType::BurleyBssrdf
        )
    }

    pub fn is_emission(self) -> bool {
        self == ClosureType::Emission
    }

    pub fn is_background(self) -> bool {
        self == ClosureType::Background
    }

    pub fn is_holdout(self) -> bool {
        self == ClosureType::Holdout
    }

    pub fn is_ambient_occlusion(self) -> bool {
        self == ClosureType::AmbientOcclusion
    }

    pub fn is_phase(self) -> bool {
        self == ClosureType::HenyeyGreenstein
    }

    pub fn is_volume(self) -> bool {
        matches!(
            self,
            ClosureType::VolumeAbsorption | ClosureType::HenyeyGreenstein
        )
    }

    /// What having a closure of this type tells about the shading point.
    pub fn flags(self) -> ClosureFlags {
        match self {
            ClosureType::Reflection | ClosureType::Refraction => ClosureFlags::BSDF,
            ClosureType::Transparent => ClosureFlags::BSDF | ClosureFlags::TRANSPARENT,
            t if t.is_bsdf() => ClosureFlags::BSDF | ClosureFlags::BSDF_HAS_EVAL,
            t if t.is_bssrdf() => ClosureFlags::BSSRDF,
            ClosureType::Emission => ClosureFlags::EMISSION,
            ClosureType::Background => ClosureFlags::BACKGROUND,
            ClosureType::Holdout => ClosureFlags::HOLDOUT,
            ClosureType::AmbientOcclusion => ClosureFlags::AO,
            ClosureType::VolumeAbsorption => ClosureFlags::ABSORPTION,
            ClosureType::HenyeyGreenstein => ClosureFlags::SCATTER,
            _ => ClosureFlags::empty(),
        }
    }
}

bitflags! {
    /// Classification of a scattering event.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct Label: u32 {
        const TRANSMIT = 1 << 0;
        const REFLECT = 1 << 1;
        const DIFFUSE = 1 << 2;
        const GLOSSY = 1 << 3;
        const SINGULAR = 1 << 4;
        const TRANSPARENT = 1 << 5;
        const VOLUME_SCATTER = 1 << 6;
    }
}

bitflags! {
    /// Kinds of closures present at a shading point.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct ClosureFlags: u32 {
        const BSDF = 1 << 0;
        /// Has a bsdf that can be evaluated for light sampling
        const BSDF_HAS_EVAL = 1 << 1;
        const BSSRDF = 1 << 2;
        const EMISSION = 1 << 3;
        const BACKGROUND = 1 << 4;
        const HOLDOUT = 1 << 5;
        const AO = 1 << 6;
        const ABSORPTION = 1 << 7;
        const SCATTER = 1 << 8;
        const TRANSPARENT = 1 << 9;
    }
}

/// Type specific parameters of a closure.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ClosureData {
    None,
    Diffuse(DiffuseBsdf),
    OrenNayar(OrenNayarBsdf),
    Microfacet(MicrofacetBsdf),
    Bssrdf(Bssrdf),
    Phase(HenyeyGreenstein),
}

/// A direction sampled from a single closure.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ClosureSample {
    /// Empty if nothing was sampled
    pub label: Label,
    /// Unweighted value including the cosine term
    pub eval: Spectrum<f32>,
    pub omega_in: Vec3<f32>,
    pub domega_in: Differential3,
    pub pdf: f32,
}

impl Default for ClosureSample {
    fn default() -> Self {
        Self {
            label: Label::empty(),
            eval: Spectrum::zeros(),
            omega_in: Vec3::zeros(),
            domega_in: Differential3::zeros(),
            pdf: 0.0,
        }
    }
}

/// One weighted term of the shading result.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShaderClosure {
    ty: ClosureType,
    pub weight: Spectrum<f32>,
    /// Selection weight for sampling, average of the weight magnitude
    pub sample_weight: f32,
    data: ClosureData,
}

impl ShaderClosure {
    fn new(ty: ClosureType, weight: Spectrum<f32>, data: ClosureData) -> Self {
        Self {
            ty,
            weight,
            sample_weight: weight.average().abs(),
            data,
        }
    }

    pub fn diffuse(weight: Spectrum<f32>, n: Vec3<f32>) -> Self {
        Self::new(
            ClosureType::Diffuse,
            weight,
            ClosureData::Diffuse(DiffuseBsdf::new(n)),
        )
    }

    /// Falls back to [`ShaderClosure::diffuse`] for zero roughness.
    pub fn oren_nayar(weight: Spectrum<f32>, n: Vec3<f32>, roughness: f32) -> Self {
        if roughness == 0.0 {
            return Self::diffuse(weight, n);
        }
        Self::new(
            ClosureType::OrenNayar,
            weight,
            ClosureData::OrenNayar(OrenNayarBsdf::new(n, roughness)),
        )
    }

    pub fn translucent(weight: Spectrum<f32>, n: Vec3<f32>) -> Self {
        Self::new(
            ClosureType::Translucent,
            weight,
            ClosureData::Diffuse(DiffuseBsdf::new(n)),
        )
    }

    pub fn subsurface_diffuse(weight: Spectrum<f32>, n: Vec3<f32>) -> Self {
        Self::new(
            ClosureType::SubsurfaceDiffuse,
            weight,
            ClosureData::Diffuse(DiffuseBsdf::new(n)),
        )
    }

    pub fn reflection(weight: Spectrum<f32>, n: Vec3<f32>) -> Self {
        Self::new(
            ClosureType::Reflection,
            weight,
            ClosureData::Microfacet(MicrofacetBsdf::new(n, 0.0, 1.0)),
        )
    }

    pub fn refraction(weight: Spectrum<f32>, n: Vec3<f32>, ior: f32) -> Self {
        Self::new(
            ClosureType::Refraction,
            weight,
            ClosureData::Microfacet(MicrofacetBsdf::new(n, 0.0, ior)),
        )
    }

    /// GGX reflection with `alpha = roughness^2`, singular below [`SINGULAR_ALPHA`].
    pub fn ggx_reflection(weight: Spectrum<f32>, n: Vec3<f32>, roughness: f32) -> Self {
        let bsdf = MicrofacetBsdf::new(n, roughness * roughness, 1.0);
        if bsdf.is_singular() {
            return Self::reflection(weight, n);
        }
        Self::new(
            ClosureType::GgxReflection,
            weight,
            ClosureData::Microfacet(bsdf),
        )
    }

    /// GGX refraction with `alpha = roughness^2`, singular below [`SINGULAR_ALPHA`].
    pub fn ggx_refraction(weight: Spectrum<f32>, n: Vec3<f32>, roughness: f32, ior: f32) -> Self {
        let bsdf = MicrofacetBsdf::new(n, roughness * roughness, ior);
        if bsdf.is_singular() {
            return Self::refraction(weight, n, ior);
        }
        Self::new(
            ClosureType::GgxRefraction,
            weight,
            ClosureData::Microfacet(bsdf),
        )
    }

    pub fn transparent(weight: Spectrum<f32>) -> Self {
        Self::new(ClosureType::Transparent, weight, ClosureData::None)
    }

    pub fn bssrdf(weight: Spectrum<f32>, bssrdf: Bssrdf) -> Self {
        let ty = match bssrdf.falloff {
            Falloff::Cubic => ClosureType::CubicBssrdf,
            Falloff::Gaussian => ClosureType::GaussianBssrdf,
            Falloff::Burley => ClosureType::BurleyBssrdf,
        };
        Self::new(ty, weight, ClosureData::Bssrdf(bssrdf))
    }

    pub fn emission(weight: Spectrum<f32>) -> Self {
        Self::new(ClosureType::Emission, weight, ClosureData::None)
    }

    pub fn background(weight: Spectrum<f32>) -> Self {
        Self::new(ClosureType::Background, weight, ClosureData::None)
    }

    pub fn holdout(weight: Spectrum<f32>) -> Self {
        Self::new(ClosureType::Holdout, weight, ClosureData::None)
    }

    pub fn ambient_occlusion(weight: Spectrum<f32>) -> Self {
        Self::new(ClosureType::AmbientOcclusion, weight, ClosureData::None)
    }

    pub fn absorption(weight: Spectrum<f32>) -> Self {
        Self::new(ClosureType::VolumeAbsorption, weight, ClosureData::None)
    }

    pub fn henyey_greenstein(weight: Spectrum<f32>, g: f32) -> Self {
        Self::new(
            ClosureType::HenyeyGreenstein,
            weight,
            ClosureData::Phase(HenyeyGreenstein::new(g)),
        )
    }

    pub fn ty(&self) -> ClosureType {
        self.ty
    }

    pub fn data(&self) -> &ClosureData {
        &self.data
    }

    /// Shading normal of closures that have one.
    pub fn normal(&self) -> Option<Vec3<f32>> {
        match &self.data {
            ClosureData::Diffuse(d) => Some(d.n),
            ClosureData::OrenNayar(o) => Some(o.n),
            ClosureData::Microfacet(m) => Some(m.n),
            ClosureData::Bssrdf(b) => Some(b.n),
            ClosureData::None | ClosureData::Phase(_) => None,
        }
    }

    /// Checks if `other` can be folded into this closure by summing the weights.
    ///
    /// Closures without parameters always merge with their own type as every
    /// query over them is linear in the weight.
    pub fn can_merge(&self, other: &Self) -> bool {
        if self.ty != other.ty {
            return false;
        }
        match (&self.data, &other.data) {
            (ClosureData::None, ClosureData::None) => true,
            (ClosureData::Diffuse(a), ClosureData::Diffuse(b)) => a.merge(b),
            (ClosureData::OrenNayar(a), ClosureData::OrenNayar(b)) => a.merge(b),
            (ClosureData::Microfacet(a), ClosureData::Microfacet(b)) => a.merge(b),
            (ClosureData::Bssrdf(a), ClosureData::Bssrdf(b)) => a.merge(b),
            (ClosureData::Phase(a), ClosureData::Phase(b)) => a.merge(b),
            _ => false,
        }
    }

    /// Widens glossy lobes to at least `roughness`.
    pub fn blur(&mut self, roughness: f32) {
        if let (ClosureType::GgxReflection | ClosureType::GgxRefraction, ClosureData::Microfacet(m)) =
            (self.ty, &mut self.data)
        {
            m.blur(roughness);
        }
    }

    /// Evaluates the bsdf for light arriving from `omega_in`.
    ///
    /// Returns the unweighted value and the pdf of sampling `omega_in` from this closure.
    pub fn bsdf_eval(
        &self,
        ng: Vec3<f32>,
        i: Vec3<f32>,
        omega_in: Vec3<f32>,
    ) -> (Spectrum<f32>, f32) {
        let reflect = ng.dot(omega_in) >= 0.0;
        match (self.ty, &self.data, reflect) {
            (ClosureType::Diffuse | ClosureType::SubsurfaceDiffuse, ClosureData::Diffuse(d), true) => {
                d.eval_reflect(omega_in)
            }
            (ClosureType::Translucent, ClosureData::Diffuse(d), false) => d.eval_translucent(omega_in),
            (ClosureType::OrenNayar, ClosureData::OrenNayar(o), true) => o.eval_reflect(i, omega_in),
            (ClosureType::GgxReflection, ClosureData::Microfacet(m), true) => {
                m.eval_reflect(i, omega_in)
            }
            (ClosureType::GgxRefraction, ClosureData::Microfacet(m), false) => {
                m.eval_transmit(i, omega_in)
            }
            _ => (Spectrum::zeros(), 0.0),
        }
    }

    /// Samples an incoming direction from the bsdf.
    pub fn bsdf_sample(
        &self,
        ng: Vec3<f32>,
        i: Vec3<f32>,
        di: &Differential3,
        u: Vec2<f32>,
    ) -> ClosureSample {
        match (self.ty, &self.data) {
            (ClosureType::Diffuse | ClosureType::SubsurfaceDiffuse, ClosureData::Diffuse(d)) => {
                d.sample(ng, di, u)
            }
            (ClosureType::Translucent, ClosureData::Diffuse(d)) => d.sample_translucent(ng, di, u),
            (ClosureType::OrenNayar, ClosureData::OrenNayar(o)) => o.sample(ng, i, di, u),
            (ClosureType::Reflection, ClosureData::Microfacet(m)) => {
                singular::sample_reflection(m.n, ng, i, di)
            }
            (ClosureType::Refraction, ClosureData::Microfacet(m)) => {
                singular::sample_refraction(m.n, m.ior, i, di)
            }
            (ClosureType::GgxReflection, ClosureData::Microfacet(m)) => {
                m.sample_reflect(ng, i, di, u)
            }
            (ClosureType::GgxRefraction, ClosureData::Microfacet(m)) => {
                m.sample_refract(ng, i, di, u)
            }
            (ClosureType::Transparent, _) => singular::sample_transparent(i, di),
            _ => ClosureSample::default(),
        }
    }

    /// Evaluates the phase function, zero for other closures.
    pub fn phase_eval(&self, i: Vec3<f32>, omega_in: Vec3<f32>) -> (Spectrum<f32>, f32) {
        match &self.data {
            ClosureData::Phase(hg) => hg.eval(i, omega_in),
            _ => (Spectrum::zeros(), 0.0),
        }
    }

    pub fn phase_sample(&self, i: Vec3<f32>, di: &Differential3, u: Vec2<f32>) -> ClosureSample {
        match &self.data {
            ClosureData::Phase(hg) => hg.sample(i, di, u),
            _ => ClosureSample::default(),
        }
    }
}
