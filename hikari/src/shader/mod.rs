mod attributes;
mod eval;
mod graph;
mod setup;

pub use attributes::{LobeCounts, ShaderFlags, ShaderId, ShaderInfo, ShaderTable};
pub use eval::{transparent_shadow, BsdfSample};
pub use graph::{ConstantDiffuse, ShaderGraph};
pub use setup::SamplePoint;

use bitflags::bitflags;
use strum::Display;

use crate::{
    closure::ClosureArray,
    config::{KernelConfig, KernelFeatures},
    geometry::{LampId, ObjectFlags, ObjectId, PrimId, PrimitiveType, SceneData},
    math::{Differential, Differential3, Transform, Vec3},
};

bitflags! {
    /// Properties of a shading point found during setup.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct RuntimeFlags: u32 {
        /// Hit from behind, normals have been flipped to face the ray
        const BACKFACING = 1 << 0;
    }
}

/// Which output of a shader is evaluated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Display)]
pub enum ShaderType {
    Surface,
    Volume,
    Displacement,
    AoSurface,
}

/// Read-only data shared by every ray of a render.
#[derive(Copy, Clone)]
pub struct KernelContext<'a> {
    pub config: &'a KernelConfig,
    pub shaders: &'a ShaderTable,
    pub scene: &'a dyn SceneData,
    pub graph: &'a dyn ShaderGraph,
}

impl<'a> KernelContext<'a> {
    pub fn new(
        config: &'a KernelConfig,
        shaders: &'a ShaderTable,
        scene: &'a dyn SceneData,
        graph: &'a dyn ShaderGraph,
    ) -> Self {
        Self {
            config,
            shaders,
            scene,
            graph,
        }
    }
}

/// A shading point and the closures its shader produced.
///
/// One is kept per ray slot and set up again for every hit.
#[derive(Clone, Debug)]
pub struct ShaderData {
    /// Position
    pub p: Vec3<f32>,
    /// Shading normal
    pub n: Vec3<f32>,
    /// Geometric normal
    pub ng: Vec3<f32>,
    /// Direction back towards the ray origin
    pub i: Vec3<f32>,

    pub shader: ShaderId,
    pub shader_info: ShaderInfo,
    pub object_flags: ObjectFlags,
    pub runtime_flags: RuntimeFlags,

    pub prim_type: PrimitiveType,
    pub object: Option<ObjectId>,
    pub prim: Option<PrimId>,
    pub lamp: Option<LampId>,
    /// Primitive parametric coordinates
    pub u: f32,
    pub v: f32,
    /// Distance from the ray origin
    pub ray_length: f32,
    /// Shutter time in `[0, 1]`
    pub time: f32,
    pub object_to_world: Transform,

    pub dp: Differential3,
    pub di: Differential3,
    pub du: Differential,
    pub dv: Differential,
    pub dpdu: Vec3<f32>,
    pub dpdv: Vec3<f32>,
    pub dndx: Vec3<f32>,
    pub dndy: Vec3<f32>,

    /// Origin of the ray that entered the volume
    pub ray_p: Vec3<f32>,
    pub ray_dp: Differential3,

    /// Picks the closure that is sampled
    pub randb_closure: f32,
    /// Seed for nodes that need extra random numbers
    pub lcg_state: u32,

    pub closures: ClosureArray,
}

impl ShaderData {
    pub fn new(config: &KernelConfig) -> Self {
        Self {
            p: Vec3::zeros(),
            n: Vec3::zeros(),
            ng: Vec3::zeros(),
            i: Vec3::zeros(),
            shader: ShaderId::default(),
            shader_info: ShaderInfo::default(),
            object_flags: ObjectFlags::empty(),
            runtime_flags: RuntimeFlags::empty(),
            prim_type: PrimitiveType::None,
            object: None,
            prim: None,
            lamp: None,
            u: 0.0,
            v: 0.0,
            ray_length: 0.0,
            time: 0.5,
            object_to_world: Transform::identity(),
            dp: Differential3::zeros(),
            di: Differential3::zeros(),
            du: Differential::default(),
            dv: Differential::default(),
            dpdu: Vec3::zeros(),
            dpdv: Vec3::zeros(),
            dndx: Vec3::zeros(),
            dndy: Vec3::zeros(),
            ray_p: Vec3::zeros(),
            ray_dp: Differential3::zeros(),
            randb_closure: 0.0,
            lcg_state: 0,
            closures: ClosureArray::new(config.limits.closure_capacity),
        }
    }

    pub fn is_backfacing(&self) -> bool {
        self.runtime_flags.contains(RuntimeFlags::BACKFACING)
    }

    /// Fetches the attributes of the current shader.
    pub(crate) fn fetch_shader_info(&mut self, kg: &KernelContext) {
        self.shader_info = kg.shaders.get(self.shader);
    }

    /// Fetches the object-to-world transform of the current object at `time`.
    pub fn setup_object_transforms(&mut self, kg: &KernelContext, time: f32) {
        self.object_to_world = match self.object {
            Some(object)
                if self.object_flags.contains(ObjectFlags::OBJECT_MOTION)
                    && kg.config.features.contains(KernelFeatures::OBJECT_MOTION) =>
            {
                kg.scene.object_motion_transform(object, time)
            }
            Some(object) => kg.scene.object_transform(object),
            None => Transform::identity(),
        };
    }

    /// Transforms an object space normal to world space.
    pub fn object_normal_to_world(&self, n: Vec3<f32>) -> Vec3<f32> {
        self.object_to_world.normal(n).safe_normalized()
    }

    /// Transforms an object space direction to world space.
    pub fn object_dir_to_world(&self, d: Vec3<f32>) -> Vec3<f32> {
        self.object_to_world.direction(d)
    }

    pub(crate) fn flip_to_backface(&mut self) {
        self.runtime_flags.insert(RuntimeFlags::BACKFACING);
        self.ng = -self.ng;
        self.n = -self.n;
        self.dpdu = -self.dpdu;
        self.dpdv = -self.dpdv;
    }
}
