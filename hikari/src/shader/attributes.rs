use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::hikari_warn;

/// Packed shader reference: the table index in the low bits and per-use flags on top.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ShaderId(u32);

impl ShaderId {
    pub const SMOOTH_NORMAL: u32 = 1 << 31;
    pub const CAST_SHADOW: u32 = 1 << 30;
    pub const AREA_LIGHT: u32 = 1 << 29;
    pub const USE_MIS: u32 = 1 << 28;
    pub const MASK: u32 = !(Self::SMOOTH_NORMAL | Self::CAST_SHADOW | Self::AREA_LIGHT | Self::USE_MIS);

    /// Creates a reference to shader `index` with no flags set.
    pub fn new(index: u32) -> Self {
        debug_assert!(index & !Self::MASK == 0, "Shader index {} overlaps flag bits", index);
        Self(index & Self::MASK)
    }

    /// Creates a reference from raw packed bits.
    pub fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    /// Index into the [`ShaderTable`].
    pub fn index(self) -> usize {
        (self.0 & Self::MASK) as usize
    }

    pub fn smooth_normal(self) -> bool {
        self.0 & Self::SMOOTH_NORMAL != 0
    }

    pub fn with_smooth_normal(self) -> Self {
        Self(self.0 | Self::SMOOTH_NORMAL)
    }

    pub fn with_flags(self, flags: u32) -> Self {
        Self(self.0 | (flags & !Self::MASK))
    }
}

bitflags! {
    /// Compile-time properties of a shader, fetched per shading point.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
    pub struct ShaderFlags: u32 {
        const USE_MIS = 1 << 0;
        const HAS_TRANSPARENT_SHADOW = 1 << 1;
        const HAS_VOLUME = 1 << 2;
        const HAS_ONLY_VOLUME = 1 << 3;
        const HETEROGENEOUS_VOLUME = 1 << 4;
        const HAS_BSSRDF_BUMP = 1 << 5;
        const VOLUME_EQUIANGULAR = 1 << 6;
        const VOLUME_MIS = 1 << 7;
        const VOLUME_CUBIC = 1 << 8;
        const HAS_BUMP = 1 << 9;
        const HAS_DISPLACEMENT = 1 << 10;
        const HAS_CONSTANT_EMISSION = 1 << 11;
        const USE_UNIFORM_ALPHA = 1 << 12;
        const OVERRIDE_BOUNCES = 1 << 13;
    }
}

/// Per-lobe counts, used both for branched sample counts and bounce overrides.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct LobeCounts {
    pub diffuse: u32,
    pub glossy: u32,
    pub transmission: u32,
}

/// Metadata of one shader.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ShaderInfo {
    pub flags: ShaderFlags,
    pub ao_alpha: f32,
    pub shadow_alpha: f32,
    /// Branched integrator samples per lobe
    pub samples: LobeCounts,
    /// Max bounces per lobe, used when `OVERRIDE_BOUNCES` is set
    pub bounces: LobeCounts,
    pub cryptomatte_name: f32,
    pub cryptomatte_pass: f32,
    pub velocity_scale: f32,
}

impl Default for ShaderInfo {
    fn default() -> Self {
        Self {
            flags: ShaderFlags::empty(),
            ao_alpha: 0.0,
            shadow_alpha: 0.0,
            samples: LobeCounts {
                diffuse: 1,
                glossy: 1,
                transmission: 1,
            },
            bounces: LobeCounts::default(),
            cryptomatte_name: 0.0,
            cryptomatte_pass: 0.0,
            velocity_scale: 1.0,
        }
    }
}

/// Read-only table of [`ShaderInfo`]s shared by every ray.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct ShaderTable {
    shaders: Vec<ShaderInfo>,
}

impl ShaderTable {
    pub fn new(shaders: Vec<ShaderInfo>) -> Self {
        Self { shaders }
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    /// Returns the info for `shader`, or defaults if the index is out of range.
    pub fn get(&self, shader: ShaderId) -> ShaderInfo {
        match self.shaders.get(shader.index()) {
            Some(info) => *info,
            None => {
                hikari_warn!("Unknown shader {}, using default attributes", shader.index());
                ShaderInfo::default()
            }
        }
    }

    pub fn flags(&self, shader: ShaderId) -> ShaderFlags {
        self.get(shader).flags
    }

    pub fn cryptomatte_name(&self, shader: ShaderId) -> f32 {
        self.get(shader).cryptomatte_name
    }

    pub fn cryptomatte_pass(&self, shader: ShaderId) -> f32 {
        self.get(shader).cryptomatte_pass
    }
}
