mod triangle;

pub use triangle::TriangleGeometry;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::{
    math::{Ray, Transform, Vec3},
    path_state::RayVisibility,
    shader::ShaderId,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct ObjectId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct PrimId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct LampId(pub u32);

/// What kind of primitive a shading point lies on.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PrimitiveType {
    #[default]
    None,
    Triangle,
    MotionTriangle,
    Curve,
    MotionCurve,
    Lamp,
}

impl PrimitiveType {
    pub fn is_triangle(self) -> bool {
        matches!(self, PrimitiveType::Triangle | PrimitiveType::MotionTriangle)
    }

    pub fn is_curve(self) -> bool {
        matches!(self, PrimitiveType::Curve | PrimitiveType::MotionCurve)
    }
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct ObjectFlags: u32 {
        const HOLDOUT_MASK = 1 << 0;
        /// Object transform is animated over the shutter
        const OBJECT_MOTION = 1 << 1;
        /// Geometry is already in world space
        const TRANSFORM_APPLIED = 1 << 2;
        const NEGATIVE_SCALE_APPLIED = 1 << 3;
        const HAS_VOLUME = 1 << 4;
        const INTERSECTS_VOLUME = 1 << 5;
        const HAS_VERTEX_MOTION = 1 << 6;
    }
}

/// A ray hit as returned by the scene.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Intersection {
    /// Distance along the ray
    pub t: f32,
    /// Barycentric or curve parameter
    pub u: f32,
    pub v: f32,
    pub prim: PrimId,
    /// Set for instanced geometry whose data is in object space
    pub object: Option<ObjectId>,
    pub prim_type: PrimitiveType,
}

/// One hair segment, endpoints in object space.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CurveGeometry {
    pub p: [Vec3<f32>; 2],
    pub shader: ShaderId,
}

impl CurveGeometry {
    pub fn new(p: [Vec3<f32>; 2], shader: ShaderId) -> Self {
        Self { p, shader }
    }

    /// Derivative of the position along the curve parameter.
    pub fn dpdu(&self) -> Vec3<f32> {
        self.p[1] - self.p[0]
    }
}

/// Read-only scene access needed by the shading core.
///
/// Implemented by the scene/BVH layer. Everything here is immutable while
/// rendering so it can be shared between all render threads.
pub trait SceneData: Send + Sync {
    /// Returns the closest hit along `ray` among primitives matching `visibility`.
    fn intersect(&self, ray: &Ray, visibility: RayVisibility) -> Option<Intersection>;

    /// Like [`SceneData::intersect`] but only considers objects that bound a volume.
    fn intersect_volume(&self, ray: &Ray, visibility: RayVisibility) -> Option<Intersection>;

    /// Object that owns a non-instanced primitive.
    fn prim_object(&self, prim: PrimId) -> ObjectId;

    fn object_flags(&self, object: ObjectId) -> ObjectFlags;

    /// Object-to-world transform.
    fn object_transform(&self, object: ObjectId) -> Transform;

    /// Object-to-world transform at `time` for objects flagged with `OBJECT_MOTION`.
    fn object_motion_transform(&self, object: ObjectId, _time: f32) -> Transform {
        self.object_transform(object)
    }

    fn triangle(&self, prim: PrimId) -> TriangleGeometry;

    /// Triangle with its vertices interpolated to `time`.
    fn motion_triangle(&self, _object: ObjectId, prim: PrimId, _time: f32) -> TriangleGeometry {
        self.triangle(prim)
    }

    fn curve(&self, prim: PrimId) -> CurveGeometry;

    /// Lamp-to-world transform.
    fn lamp_transform(&self, lamp: LampId) -> Transform;

    /// Position derivatives of a lamp surface at `(u, v)`.
    fn lamp_dpdudv(&self, lamp: LampId, u: f32, v: f32) -> (Vec3<f32>, Vec3<f32>);

    /// Velocity attribute of a volume object at `p`, in world units per second.
    fn volume_velocity(&self, _object: ObjectId, _p: Vec3<f32>) -> Option<Vec3<f32>> {
        None
    }
}

/// Offsets `p` along `ng` to avoid self intersection when spawning a ray.
pub fn ray_offset(p: Vec3<f32>, ng: Vec3<f32>) -> Vec3<f32> {
    const EPSILON: f32 = 1e-4;
    let scale = p.abs().max_comp().max(1.0);
    p + ng * (EPSILON * scale)
}
