use super::{KernelContext, RuntimeFlags, ShaderData, ShaderId, ShaderInfo};
use crate::{
    config::KernelFeatures,
    geometry::{Intersection, LampId, ObjectFlags, ObjectId, PrimId, PrimitiveType, TriangleGeometry},
    math::{
        differential_dudv, differential_incoming, differential_transfer, Differential,
        Differential3, Ray, Transform, Vec3,
    },
};

/// A point picked on a surface or lamp without tracing a ray to it.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SamplePoint {
    pub p: Vec3<f32>,
    pub ng: Vec3<f32>,
    pub i: Vec3<f32>,
    /// Position differentials at the origin of `i`
    pub dp: Differential3,
    /// Differentials of `i`, the point gets none if `None`
    pub di: Option<Differential3>,
    pub shader: ShaderId,
    pub object: Option<ObjectId>,
    pub prim: Option<PrimId>,
    pub lamp: Option<LampId>,
    pub u: f32,
    pub v: f32,
    /// Distance from the origin of `i`
    pub t: f32,
    pub time: f32,
    /// Set if `p`, `ng` and `i` are in object space
    pub object_space: bool,
}

impl SamplePoint {
    /// Point on a lamp or an emissive triangle.
    pub fn new(p: Vec3<f32>, ng: Vec3<f32>, i: Vec3<f32>, shader: ShaderId) -> Self {
        Self {
            p,
            ng,
            i,
            dp: Differential3::zeros(),
            di: None,
            shader,
            object: None,
            prim: None,
            lamp: None,
            u: 0.0,
            v: 0.0,
            t: 0.0,
            time: 0.5,
            object_space: false,
        }
    }
}

impl ShaderData {
    fn zero_differentials(&mut self) {
        self.dp = Differential3::zeros();
        self.di = Differential3::zeros();
        self.du = Differential::default();
        self.dv = Differential::default();
    }

    fn triangle_dndxy(&mut self, tri: &TriangleGeometry) {
        let (dndu, dndv) = tri.dndudv();
        self.dndx = dndu * self.du.dx + dndv * self.dv.dx;
        self.dndy = dndu * self.du.dy + dndv * self.dv.dy;
    }

    fn fetch_triangle(&self, kg: &KernelContext, object: ObjectId, prim: PrimId) -> TriangleGeometry {
        if self.prim_type == PrimitiveType::MotionTriangle
            && kg.config.features.contains(KernelFeatures::OBJECT_MOTION)
        {
            kg.scene.motion_triangle(object, prim, self.time)
        } else {
            kg.scene.triangle(prim)
        }
    }

    /// Sets up the shading point at a ray hit.
    pub fn setup_from_ray(&mut self, kg: &KernelContext, isect: &Intersection, ray: &Ray) {
        let scene = kg.scene;
        let features = kg.config.features;
        let instanced =
            isect.object.is_some() && features.contains(KernelFeatures::INSTANCING);

        let object = isect.object.unwrap_or_else(|| scene.prim_object(isect.prim));
        self.object = Some(object);
        self.prim_type = isect.prim_type;
        self.object_flags = scene.object_flags(object);
        self.runtime_flags = RuntimeFlags::empty();
        self.lamp = None;

        self.time = ray.time;
        self.setup_object_transforms(kg, ray.time);

        self.prim = Some(isect.prim);
        self.ray_length = isect.t;
        self.u = isect.u;
        self.v = isect.v;
        self.p = ray.point(isect.t);

        let mut tri = None;
        if isect.prim_type.is_curve() && features.contains(KernelFeatures::HAIR) {
            let curve = scene.curve(isect.prim);
            self.shader = curve.shader;
            // Curves are shaded as ribbons facing the ray
            self.ng = -ray.d.normalized();
            self.n = self.ng;
            self.dpdu = if instanced {
                self.object_dir_to_world(curve.dpdu())
            } else {
                curve.dpdu()
            };
            self.dpdv = self.dpdu.cross(self.ng);
        } else {
            debug_assert!(
                !isect.prim_type.is_curve(),
                "Curve hit without curve support"
            );
            let geometry = self.fetch_triangle(kg, object, isect.prim);
            self.shader = geometry.shader;
            self.ng = geometry.normal();
            self.n = if self.shader.smooth_normal() {
                geometry.smooth_normal(self.u, self.v).unwrap_or(self.ng)
            } else {
                self.ng
            };
            let (dpdu, dpdv) = geometry.dpdudv();
            self.dpdu = dpdu;
            self.dpdv = dpdv;

            if instanced {
                self.n = self.object_normal_to_world(self.n);
                self.ng = self.object_normal_to_world(self.ng);
                self.dpdu = self.object_dir_to_world(self.dpdu);
                self.dpdv = self.object_dir_to_world(self.dpdv);
            }
            tri = Some(geometry);
        }

        self.i = -ray.d;
        self.fetch_shader_info(kg);

        let backfacing = self.ng.dot(self.i) < 0.0;
        if backfacing {
            self.flip_to_backface();
        }

        if features.contains(KernelFeatures::RAY_DIFFERENTIALS) {
            self.dp = differential_transfer(&ray.dp, ray.d, &ray.dd, self.ng, isect.t);
            self.di = differential_incoming(&ray.dd);
            (self.du, self.dv) = differential_dudv(self.dpdu, self.dpdv, &self.dp, self.ng);

            if let Some(tri) = &tri {
                self.triangle_dndxy(tri);
                if backfacing {
                    self.dndx = -self.dndx;
                    self.dndy = -self.dndy;
                }
                if instanced {
                    self.dndx = self.object_dir_to_world(self.dndx);
                    self.dndy = self.object_dir_to_world(self.dndy);
                }
            } else {
                self.dndx = Vec3::zeros();
                self.dndy = Vec3::zeros();
            }
        } else {
            self.zero_differentials();
            self.dndx = Vec3::zeros();
            self.dndy = Vec3::zeros();
        }
    }

    /// Sets up the exit point of a subsurface scatter.
    ///
    /// Object, transforms, time and ray length are kept from the entry point
    /// and so is the side of the surface.
    pub fn setup_from_subsurface(&mut self, kg: &KernelContext, isect: &Intersection, ray: &Ray) {
        debug_assert!(
            isect.prim_type.is_triangle(),
            "Subsurface exits are only supported on triangles"
        );
        let scene = kg.scene;
        let backfacing = self.is_backfacing();
        let instanced = isect.object.is_some()
            && kg.config.features.contains(KernelFeatures::INSTANCING);

        let object = self.object.unwrap_or_else(|| scene.prim_object(isect.prim));
        self.object_flags = scene.object_flags(object);
        self.runtime_flags = RuntimeFlags::empty();
        self.prim = Some(isect.prim);
        self.prim_type = isect.prim_type;
        self.u = isect.u;
        self.v = isect.v;

        let tri = self.fetch_triangle(kg, object, isect.prim);
        self.shader = tri.shader;
        self.p = ray.point(isect.t);
        self.ng = tri.normal();
        self.n = if self.shader.smooth_normal() {
            tri.smooth_normal(self.u, self.v).unwrap_or(self.ng)
        } else {
            self.ng
        };
        let (dpdu, dpdv) = tri.dpdudv();
        self.dpdu = dpdu;
        self.dpdv = dpdv;
        // Uses the parametric differentials of the entry point
        self.triangle_dndxy(&tri);

        self.fetch_shader_info(kg);

        if instanced {
            self.n = self.object_normal_to_world(self.n);
            self.ng = self.object_normal_to_world(self.ng);
            self.dpdu = self.object_dir_to_world(self.dpdu);
            self.dpdv = self.object_dir_to_world(self.dpdv);
            self.dndx = self.object_dir_to_world(self.dndx);
            self.dndy = self.object_dir_to_world(self.dndy);
        }

        if backfacing {
            self.flip_to_backface();
            self.dndx = -self.dndx;
            self.dndy = -self.dndy;
        }

        // Only a diffuse bsdf is expected here but shaders might still read it
        self.i = self.n;

        if kg.config.features.contains(KernelFeatures::RAY_DIFFERENTIALS) {
            // dp and di are kept
            (self.du, self.dv) = differential_dudv(self.dpdu, self.dpdv, &self.dp, self.ng);
        }
    }

    /// Sets up a shading point on a sampled surface or lamp point.
    pub fn setup_from_sample(&mut self, kg: &KernelContext, sample: &SamplePoint) {
        let scene = kg.scene;

        self.p = sample.p;
        self.ng = sample.ng;
        self.n = sample.ng;
        self.i = sample.i;
        self.shader = sample.shader;
        self.prim_type = if sample.prim.is_some() {
            PrimitiveType::Triangle
        } else if sample.lamp.is_some() {
            PrimitiveType::Lamp
        } else {
            PrimitiveType::None
        };

        self.object = sample.object;
        self.prim = sample.prim;
        self.lamp = sample.lamp;
        self.u = sample.u;
        self.v = sample.v;
        self.ray_length = sample.t;
        self.time = sample.time;

        self.fetch_shader_info(kg);

        self.object_flags = ObjectFlags::empty();
        self.runtime_flags = RuntimeFlags::empty();

        if let Some(object) = sample.object {
            self.object_flags = scene.object_flags(object);
            self.setup_object_transforms(kg, sample.time);
        } else if let Some(lamp) = sample.lamp {
            self.object_to_world = scene.lamp_transform(lamp);
        } else {
            self.object_to_world = Transform::identity();
        }

        if sample.object_space {
            self.p = self.object_to_world.point(self.p);
            self.ng = self.object_normal_to_world(self.ng);
            self.n = self.ng;
            self.i = self.object_dir_to_world(self.i);
        }

        let transform_applied = self.object_flags.contains(ObjectFlags::TRANSFORM_APPLIED);
        let mut tri = None;
        match (sample.prim, sample.lamp) {
            (Some(prim), _) => {
                let geometry = scene.triangle(prim);
                if self.shader.smooth_normal() {
                    if let Some(n) = geometry.smooth_normal(self.u, self.v) {
                        self.n = if transform_applied {
                            n
                        } else {
                            self.object_normal_to_world(n)
                        };
                    }
                }

                let (dpdu, dpdv) = geometry.dpdudv();
                if transform_applied {
                    self.dpdu = dpdu;
                    self.dpdv = dpdv;
                } else {
                    self.dpdu = self.object_dir_to_world(dpdu);
                    self.dpdv = self.object_dir_to_world(dpdv);
                }
                tri = Some(geometry);
            }
            (None, Some(lamp)) => {
                let (dpdu, dpdv) = scene.lamp_dpdudv(lamp, self.u, self.v);
                self.dpdu = dpdu;
                self.dpdv = dpdv;
            }
            (None, None) => {
                self.dpdu = Vec3::zeros();
                self.dpdv = Vec3::zeros();
            }
        }

        let backfacing = sample.prim.is_some() && self.ng.dot(self.i) < 0.0;
        if backfacing {
            self.flip_to_backface();
        }

        match sample.di {
            Some(di) if kg.config.features.contains(KernelFeatures::RAY_DIFFERENTIALS) => {
                self.di = di;
                self.dp = differential_transfer(&sample.dp, self.i, &di, self.ng, sample.t);
                (self.du, self.dv) = differential_dudv(self.dpdu, self.dpdv, &self.dp, self.ng);
            }
            _ => self.zero_differentials(),
        }

        match &tri {
            Some(tri) => {
                self.triangle_dndxy(tri);
                if !transform_applied {
                    self.dndx = self.object_normal_to_world(self.dndx);
                    self.dndy = self.object_normal_to_world(self.dndy);
                }
                if backfacing {
                    self.dndx = -self.dndx;
                    self.dndy = -self.dndy;
                }
            }
            None => {
                self.dndx = Vec3::zeros();
                self.dndy = Vec3::zeros();
            }
        }
    }

    /// Sets up a point on a triangle for displacement, always with a smooth normal.
    pub fn setup_from_displace(&mut self, kg: &KernelContext, object: ObjectId, prim: PrimId, u: f32, v: f32) {
        let tri = kg.scene.triangle(prim);
        let (dpdu, dpdv) = tri.dpdudv();
        let sample = SamplePoint {
            p: tri.point(u, v),
            ng: tri.normal(),
            i: Vec3::zeros(),
            dp: Differential3 { dx: dpdu, dy: dpdv },
            di: None,
            shader: tri.shader.with_smooth_normal(),
            object: Some(object),
            prim: Some(prim),
            lamp: None,
            u,
            v,
            t: 0.0,
            time: 0.5,
            object_space: !kg
                .scene
                .object_flags(object)
                .contains(ObjectFlags::TRANSFORM_APPLIED),
        };
        self.setup_from_sample(kg, &sample);
    }

    /// Sets up the background seen along `ray`.
    pub fn setup_from_background(&mut self, kg: &KernelContext, ray: &Ray) {
        self.p = ray.d;
        self.n = -ray.d;
        self.ng = -ray.d;
        self.i = -ray.d;
        self.shader = kg.config.background.surface_shader;
        self.fetch_shader_info(kg);

        self.object_flags = ObjectFlags::empty();
        self.runtime_flags = RuntimeFlags::empty();
        self.time = ray.time;
        self.ray_length = 0.0;

        self.object = None;
        self.prim = None;
        self.lamp = None;
        self.prim_type = PrimitiveType::None;
        self.object_to_world = Transform::identity();
        self.u = 0.0;
        self.v = 0.0;

        self.dpdu = Vec3::zeros();
        self.dpdv = Vec3::zeros();
        self.dndx = Vec3::zeros();
        self.dndy = Vec3::zeros();

        self.zero_differentials();
        if kg.config.features.contains(KernelFeatures::RAY_DIFFERENTIALS) {
            // Direction differentials are all a background lookup has
            self.dp = ray.dd;
            self.di = differential_incoming(&self.dp);
        }
    }

    /// Sets up the environment lookup for ambient occlusion.
    pub fn setup_from_ao_env(&mut self, kg: &KernelContext, ray: &Ray) {
        self.setup_from_background(kg, ray);
    }

    /// Sets up a point at the origin of `ray` inside a volume.
    ///
    /// The shader is picked from the volume stack at evaluation.
    pub fn setup_from_volume(&mut self, kg: &KernelContext, ray: &Ray) {
        self.p = ray.o;
        self.n = -ray.d;
        self.ng = -ray.d;
        self.i = -ray.d;
        self.shader = ShaderId::default();
        self.shader_info = ShaderInfo::default();
        self.runtime_flags = RuntimeFlags::empty();
        self.object_flags = ObjectFlags::empty();
        self.time = ray.time;
        self.ray_length = 0.0;

        self.object = None;
        self.prim = None;
        self.lamp = None;
        self.prim_type = PrimitiveType::None;
        self.object_to_world = Transform::identity();
        self.u = 0.0;
        self.v = 0.0;

        self.dpdu = Vec3::zeros();
        self.dpdv = Vec3::zeros();
        self.dndx = Vec3::zeros();
        self.dndy = Vec3::zeros();

        self.zero_differentials();
        if kg.config.features.contains(KernelFeatures::RAY_DIFFERENTIALS) {
            self.dp = ray.dd;
            self.di = differential_incoming(&self.dp);
        }

        self.ray_p = ray.o;
        self.ray_dp = ray.dp;
    }
}
