use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{shader::ShaderId, hikari_debug};

use std::{fmt, path::Path};

/// Weighting used to combine light and BSDF sampling.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, Display)]
pub enum MisHeuristic {
    #[default]
    Balance,
    Power,
}

/// Continuation probability estimator for russian roulette.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize, Display)]
pub enum RouletteEstimator {
    /// Mean of the throughput channels
    #[default]
    Average,
    /// Largest throughput channel
    Max,
}

bitflags! {
    /// Kernel capabilities that are toggled at runtime.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
    pub struct KernelFeatures: u32 {
        const VOLUME = 1 << 0;
        const SUBSURFACE = 1 << 1;
        const BRANCHED_PATH = 1 << 2;
        const OBJECT_MOTION = 1 << 3;
        const RAY_DIFFERENTIALS = 1 << 4;
        const HAIR = 1 << 5;
        const INSTANCING = 1 << 6;
    }
}

impl Default for KernelFeatures {
    fn default() -> Self {
        Self::all()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct IntegratorConfig {
    /// Samples per pixel
    pub aa_samples: u32,
    pub min_bounce: u32,
    pub max_bounce: u32,
    pub max_diffuse_bounce: u32,
    pub max_glossy_bounce: u32,
    pub max_transmission_bounce: u32,
    pub max_volume_bounce: u32,
    pub transparent_min_bounce: u32,
    pub transparent_max_bounce: u32,
    pub transparent_shadows: bool,
    /// Evaluates every closure separately instead of one-sample MIS
    pub branched: bool,
    pub use_mis: bool,
    pub use_volumes: bool,
    pub mis_heuristic: MisHeuristic,
    pub roulette: RouletteEstimator,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            aa_samples: 128,
            min_bounce: 3,
            max_bounce: 12,
            max_diffuse_bounce: 4,
            max_glossy_bounce: 4,
            max_transmission_bounce: 12,
            max_volume_bounce: 1,
            transparent_min_bounce: 8,
            transparent_max_bounce: 8,
            transparent_shadows: true,
            branched: false,
            use_mis: true,
            use_volumes: true,
            mis_heuristic: MisHeuristic::default(),
            roulette: RouletteEstimator::default(),
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct FilmConfig {
    /// Accumulate denoising feature passes
    pub pass_denoising: bool,
    /// Keep per-lobe BSDF contributions separate
    pub use_light_pass: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Shutter open time in frames, `None` disables motion blur
    pub shutter_time: Option<f32>,
    pub inv_fps: f32,
    pub motion_offset: f32,
    /// Set when the camera sits inside a volume so the stack needs to be walked
    pub is_inside_volume: bool,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            shutter_time: None,
            inv_fps: 1.0 / 24.0,
            motion_offset: 0.0,
            is_inside_volume: false,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BackgroundConfig {
    pub surface_shader: ShaderId,
    /// World volume, `None` if the world is empty space
    pub volume_shader: Option<ShaderId>,
}

#[derive(Copy, Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct KernelLimits {
    /// Closures one shading point can hold
    pub closure_capacity: usize,
    /// Volume stack slots, one of them is kept free as the terminator
    pub volume_stack_size: usize,
    /// Volume bounding mesh crossings before a path is considered stuck
    pub volume_bounds_max: u32,
}

impl Default for KernelLimits {
    fn default() -> Self {
        Self {
            closure_capacity: 64,
            volume_stack_size: 16,
            volume_bounds_max: 1024,
        }
    }
}

/// Immutable kernel-wide settings passed to every core operation.
#[derive(Copy, Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct KernelConfig {
    pub integrator: IntegratorConfig,
    pub film: FilmConfig,
    pub camera: CameraConfig,
    pub background: BackgroundConfig,
    pub limits: KernelLimits,
    pub features: KernelFeatures,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_yaml::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(why) => write!(f, "Failed to read kernel config: {}", why),
            ConfigError::Parse(why) => write!(f, "Failed to parse kernel config: {}", why),
            ConfigError::Invalid(why) => write!(f, "Invalid kernel config: {}", why),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(why) => Some(why),
            ConfigError::Parse(why) => Some(why),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl KernelConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, ConfigError> {
        hikari_debug!("Loading kernel config from '{}'", path.display());
        let yaml = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_yaml_str(&yaml)
    }

    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(ConfigError::Parse)
    }

    /// Checks the limits and bounce ranges are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let integrator = &self.integrator;
        if self.limits.closure_capacity == 0 {
            return Err(ConfigError::Invalid(
                "closure_capacity has to be at least 1".into(),
            ));
        }
        if self.limits.volume_stack_size < 2 {
            return Err(ConfigError::Invalid(
                "volume_stack_size has to be at least 2".into(),
            ));
        }
        if integrator.min_bounce > integrator.max_bounce {
            return Err(ConfigError::Invalid(format!(
                "min_bounce {} is larger than max_bounce {}",
                integrator.min_bounce, integrator.max_bounce
            )));
        }
        if integrator.transparent_min_bounce > integrator.transparent_max_bounce {
            return Err(ConfigError::Invalid(format!(
                "transparent_min_bounce {} is larger than transparent_max_bounce {}",
                integrator.transparent_min_bounce, integrator.transparent_max_bounce
            )));
        }
        if let Some(shutter_time) = self.camera.shutter_time {
            if shutter_time < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "Negative shutter_time {}",
                    shutter_time
                )));
            }
        }
        Ok(())
    }

    /// Checks if volumes are both compiled in and enabled for the scene.
    pub fn use_volumes(&self) -> bool {
        self.features.contains(KernelFeatures::VOLUME) && self.integrator.use_volumes
    }

    /// Checks if the branched integrator is both available and requested.
    pub fn use_branched(&self) -> bool {
        self.features.contains(KernelFeatures::BRANCHED_PATH) && self.integrator.branched
    }

    /// Applies the configured MIS heuristic.
    pub fn mis_weight(&self, f_pdf: f32, g_pdf: f32) -> f32 {
        match self.integrator.mis_heuristic {
            MisHeuristic::Balance => crate::sampling::balance_heuristic(f_pdf, g_pdf),
            MisHeuristic::Power => crate::sampling::power_heuristic(f_pdf, g_pdf),
        }
    }
}
