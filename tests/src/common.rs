use hikari::{
    closure::ShaderClosure,
    config::KernelConfig,
    geometry::{
        CurveGeometry, Intersection, LampId, ObjectFlags, ObjectId, PrimId, PrimitiveType,
        SceneData, TriangleGeometry,
    },
    math::{vec3, Ray, Spectrum, Transform, Vec3},
    path_state::{PathRayFlag, PathState, RayVisibility},
    shader::{KernelContext, ShaderData, ShaderGraph, ShaderId, ShaderInfo, ShaderTable, ShaderType},
};

/// Closures a test shader produces.
#[derive(Copy, Clone, Debug)]
pub enum TestShader {
    Diffuse(Spectrum<f32>),
    Emissive(Spectrum<f32>, Spectrum<f32>),
    Transparent(Spectrum<f32>),
    Holdout,
    Background(Spectrum<f32>),
    Volume(Spectrum<f32>, f32),
    /// Absorption with the shading position as its weight
    PositionAbsorption,
    /// Moves the point along the normal by the given distance
    Displace(f32),
}

pub struct TestGraph {
    pub shaders: Vec<TestShader>,
}

impl ShaderGraph for TestGraph {
    fn eval_nodes(
        &self,
        _kg: &KernelContext,
        sd: &mut ShaderData,
        _state: &PathState,
        shader_type: ShaderType,
        _path_flags: PathRayFlag,
    ) {
        let shader = match self.shaders.get(sd.shader.index()) {
            Some(shader) => *shader,
            None => return,
        };

        match (shader_type, shader) {
            (ShaderType::Surface, TestShader::Diffuse(albedo)) => {
                sd.closures.push(ShaderClosure::diffuse(albedo, sd.n));
            }
            (ShaderType::Surface, TestShader::Emissive(albedo, emission)) => {
                sd.closures.push(ShaderClosure::emission(emission));
                sd.closures.push(ShaderClosure::diffuse(albedo, sd.n));
            }
            (ShaderType::Surface, TestShader::Transparent(weight)) => {
                sd.closures.push(ShaderClosure::transparent(weight));
            }
            (ShaderType::Surface, TestShader::Holdout) => {
                sd.closures.push(ShaderClosure::holdout(Spectrum::ones()));
            }
            (ShaderType::Surface, TestShader::Background(color)) => {
                sd.closures.push(ShaderClosure::background(color));
            }
            (ShaderType::Volume, TestShader::Volume(sigma_s, g)) => {
                sd.closures.push(ShaderClosure::henyey_greenstein(sigma_s, g));
            }
            (ShaderType::Volume, TestShader::PositionAbsorption) => {
                let p = sd.p;
                sd.closures
                    .push(ShaderClosure::absorption(Spectrum::new(p.x, p.y, p.z)));
            }
            (ShaderType::Displacement, TestShader::Displace(distance)) => {
                sd.p += sd.n * distance;
            }
            _ => (),
        }
    }
}

pub struct TestObject {
    pub flags: ObjectFlags,
    pub transform: Transform,
}

/// Brute force scene of world space triangles.
pub struct TestScene {
    pub objects: Vec<TestObject>,
    /// Triangles with the object they belong to
    pub triangles: Vec<(ObjectId, TriangleGeometry)>,
    pub curves: Vec<CurveGeometry>,
    pub velocity: Option<Vec3<f32>>,
}

impl TestScene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            triangles: Vec::new(),
            curves: Vec::new(),
            velocity: None,
        }
    }

    pub fn add_object(&mut self, flags: ObjectFlags) -> ObjectId {
        self.objects.push(TestObject {
            flags: flags | ObjectFlags::TRANSFORM_APPLIED,
            transform: Transform::identity(),
        });
        ObjectId((self.objects.len() - 1) as u32)
    }

    /// Adds a square at height `z`, facing up or down.
    pub fn add_quad(&mut self, object: ObjectId, z: f32, half_size: f32, up: bool, shader: ShaderId) {
        let s = half_size;
        let (a, b, c, d) = (
            vec3(-s, -s, z),
            vec3(s, -s, z),
            vec3(s, s, z),
            vec3(-s, s, z),
        );
        let tris = if up {
            [[a, b, c], [a, c, d]]
        } else {
            [[a, c, b], [a, d, c]]
        };
        for p in tris {
            self.triangles
                .push((object, TriangleGeometry::new(p, shader)));
        }
    }

    fn intersect_filtered(
        &self,
        ray: &Ray,
        filter: impl Fn(ObjectId) -> bool,
    ) -> Option<Intersection> {
        let mut closest: Option<Intersection> = None;
        for (i, (object, tri)) in self.triangles.iter().enumerate() {
            if !filter(*object) {
                continue;
            }
            if let Some((t, u, v)) = intersect_triangle(ray, tri) {
                let t_max = closest.map_or(ray.t_max, |c| c.t);
                if t < t_max {
                    closest = Some(Intersection {
                        t,
                        u,
                        v,
                        prim: PrimId(i as u32),
                        object: None,
                        prim_type: PrimitiveType::Triangle,
                    });
                }
            }
        }
        closest
    }
}

// Möller-Trumbore, returns barycentrics in the p = u * p0 + v * p1 + w * p2 convention
fn intersect_triangle(ray: &Ray, tri: &TriangleGeometry) -> Option<(f32, f32, f32)> {
    let e1 = tri.p[1] - tri.p[0];
    let e2 = tri.p[2] - tri.p[0];
    let pvec = ray.d.cross(e2);
    let det = e1.dot(pvec);
    if det.abs() < 1e-8 {
        return None;
    }
    let inv_det = 1.0 / det;
    let tvec = ray.o - tri.p[0];
    let b1 = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&b1) {
        return None;
    }
    let qvec = tvec.cross(e1);
    let b2 = ray.d.dot(qvec) * inv_det;
    if b2 < 0.0 || b1 + b2 > 1.0 {
        return None;
    }
    let t = e2.dot(qvec) * inv_det;
    if t <= 0.0 {
        return None;
    }
    Some((t, 1.0 - b1 - b2, b1))
}

impl SceneData for TestScene {
    fn intersect(&self, ray: &Ray, _visibility: RayVisibility) -> Option<Intersection> {
        self.intersect_filtered(ray, |_| true)
    }

    fn intersect_volume(&self, ray: &Ray, _visibility: RayVisibility) -> Option<Intersection> {
        self.intersect_filtered(ray, |object| {
            self.objects[object.0 as usize]
                .flags
                .contains(ObjectFlags::HAS_VOLUME)
        })
    }

    fn prim_object(&self, prim: PrimId) -> ObjectId {
        self.triangles[prim.0 as usize].0
    }

    fn object_flags(&self, object: ObjectId) -> ObjectFlags {
        self.objects[object.0 as usize].flags
    }

    fn object_transform(&self, object: ObjectId) -> Transform {
        self.objects[object.0 as usize].transform
    }

    fn triangle(&self, prim: PrimId) -> TriangleGeometry {
        self.triangles[prim.0 as usize].1
    }

    fn curve(&self, prim: PrimId) -> CurveGeometry {
        self.curves[prim.0 as usize]
    }

    fn lamp_transform(&self, _lamp: LampId) -> Transform {
        Transform::identity()
    }

    fn lamp_dpdudv(&self, _lamp: LampId, _u: f32, _v: f32) -> (Vec3<f32>, Vec3<f32>) {
        (vec3(1.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0))
    }

    fn volume_velocity(&self, _object: ObjectId, _p: Vec3<f32>) -> Option<Vec3<f32>> {
        self.velocity
    }
}

/// Everything a kernel context borrows.
pub struct TestKernel {
    pub config: KernelConfig,
    pub shaders: ShaderTable,
    pub scene: TestScene,
    pub graph: TestGraph,
}

impl TestKernel {
    /// Shader 0 is the background.
    pub fn new(config: KernelConfig, scene: TestScene, shaders: Vec<TestShader>) -> Self {
        Self::with_info(
            config,
            scene,
            shaders.iter().map(|_| ShaderInfo::default()).collect(),
            shaders,
        )
    }

    pub fn with_info(
        mut config: KernelConfig,
        scene: TestScene,
        info: Vec<ShaderInfo>,
        shaders: Vec<TestShader>,
    ) -> Self {
        config.background.surface_shader = ShaderId::new(0);
        Self {
            config,
            shaders: ShaderTable::new(info),
            scene,
            graph: TestGraph { shaders },
        }
    }

    pub fn context(&self) -> KernelContext<'_> {
        KernelContext::new(&self.config, &self.shaders, &self.scene, &self.graph)
    }
}
