use super::ClosureType;
use crate::math::Spectrum;

/// Accumulated BSDF value, split per lobe when light passes are written.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct BsdfEval {
    pub use_light_pass: bool,
    pub diffuse: Spectrum<f32>,
    pub glossy: Spectrum<f32>,
    pub transmission: Spectrum<f32>,
    pub transparent: Spectrum<f32>,
    pub subsurface: Spectrum<f32>,
    pub scatter: Spectrum<f32>,
}

impl BsdfEval {
    /// Starts an accumulation with `value` attributed to the lobe of `ty`.
    ///
    /// Everything goes to `diffuse` when light passes are off.
    pub fn init(ty: Option<ClosureType>, value: Spectrum<f32>, use_light_pass: bool) -> Self {
        let mut ret = Self {
            use_light_pass,
            ..Self::default()
        };
        *ret.channel_mut(ty) = value;
        ret
    }

    fn channel_mut(&mut self, ty: Option<ClosureType>) -> &mut Spectrum<f32> {
        if !self.use_light_pass {
            return &mut self.diffuse;
        }
        match ty {
            Some(ClosureType::Transparent) => &mut self.transparent,
            Some(t) if t.is_bsdf_diffuse() => &mut self.diffuse,
            Some(t) if t.is_bsdf_glossy() => &mut self.glossy,
            Some(t) if t.is_bsdf_transmission() => &mut self.transmission,
            Some(t) if t.is_bsdf_bssrdf() => &mut self.subsurface,
            Some(t) if t.is_phase() => &mut self.scatter,
            _ => &mut self.diffuse,
        }
    }

    /// Adds `value * mis_weight` to the lobe of `ty`.
    pub fn accum(&mut self, ty: ClosureType, value: Spectrum<f32>, mis_weight: f32) {
        *self.channel_mut(Some(ty)) += value * mis_weight;
    }

    /// Scales every lobe by `weight`.
    pub fn mis(&mut self, weight: f32) {
        self.diffuse *= weight;
        self.glossy *= weight;
        self.transmission *= weight;
        self.transparent *= weight;
        self.subsurface *= weight;
        self.scatter *= weight;
    }

    /// Total of the scattering lobes, transparency is not part of it.
    pub fn sum(&self) -> Spectrum<f32> {
        self.diffuse + self.glossy + self.transmission + self.subsurface + self.scatter
    }

    pub fn is_zero(&self) -> bool {
        self.diffuse.is_black()
            && self.glossy.is_black()
            && self.transmission.is_black()
            && self.transparent.is_black()
            && self.subsurface.is_black()
            && self.scatter.is_black()
    }
}
