use crate::{
    geometry::{ray_offset, ObjectId},
    hikari_debug, hikari_trace,
    math::Ray,
    path_state::RayVisibility,
    shader::{KernelContext, RuntimeFlags, ShaderData, ShaderFlags, ShaderId},
};

/// A participating medium the path is inside of.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VolumeStackEntry {
    /// `None` for the world volume
    pub object: Option<ObjectId>,
    pub shader: ShaderId,
    /// Ray distance range the medium covers
    pub t_enter: f32,
    pub t_exit: f32,
}

impl VolumeStackEntry {
    /// Entry covering the whole ray.
    pub fn new(object: Option<ObjectId>, shader: ShaderId) -> Self {
        Self {
            object,
            shader,
            t_enter: 0.0,
            t_exit: f32::INFINITY,
        }
    }

    pub fn contains(&self, t: f32) -> bool {
        self.t_enter <= t && t <= self.t_exit
    }
}

/// Nested media along a path, innermost last.
#[derive(Clone, Debug, PartialEq)]
pub struct VolumeStack {
    entries: Vec<VolumeStackEntry>,
    capacity: usize,
}

impl VolumeStack {
    /// `size` counts the terminating slot so `size - 1` media fit.
    pub fn new(size: usize) -> Self {
        let capacity = size.saturating_sub(1);
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VolumeStackEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[VolumeStackEntry] {
        &self.entries
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Adds `entry` as the innermost medium, returns `false` if the stack is full.
    pub fn push(&mut self, entry: VolumeStackEntry) -> bool {
        if self.is_full() {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn contains_object(&self, object: Option<ObjectId>) -> bool {
        self.entries.iter().any(|e| e.object == object)
    }

    /// Updates the stack for a path crossing the surface at `sd`.
    ///
    /// Entering from the front pushes the object's volume, exiting through the
    /// back removes it.
    pub fn enter_exit(&mut self, sd: &ShaderData) {
        if !sd.shader_info.flags.contains(ShaderFlags::HAS_VOLUME) {
            return;
        }

        if sd.runtime_flags.contains(RuntimeFlags::BACKFACING) {
            if let Some(i) = self.entries.iter().position(|e| e.object == sd.object) {
                self.entries.remove(i);
            }
        } else {
            if self.contains_object(sd.object) {
                return;
            }
            if !self.push(VolumeStackEntry::new(sd.object, sd.shader)) {
                hikari_trace!("Volume stack full, ignoring {:?}", sd.object);
            }
        }
    }

    /// Fills the stack with the media `ray` starts in.
    ///
    /// When the camera may be inside a volume, the ray is traced through all
    /// volume boundaries: an exit without a matching entry means the origin is
    /// inside that object.
    pub fn init(&mut self, kg: &KernelContext, stack_sd: &mut ShaderData, ray: &Ray) {
        self.clear();
        let background = kg.config.background.volume_shader;

        if !kg.config.camera.is_inside_volume {
            // Camera is in the air, only the world volume can apply
            if let Some(shader) = background {
                self.push(VolumeStackEntry::new(None, shader));
            }
            return;
        }

        let mut volume_ray = Ray {
            t_max: f32::MAX,
            ..*ray
        };
        let max_steps = 2 * (self.capacity + 1);
        let mut enclosed: Vec<Option<ObjectId>> = Vec::with_capacity(self.capacity);
        let mut step = 0;
        while !self.is_full() && enclosed.len() < self.capacity && step < max_steps {
            let isect = match kg
                .scene
                .intersect_volume(&volume_ray, RayVisibility::all())
            {
                Some(isect) => isect,
                None => break,
            };

            stack_sd.setup_from_ray(kg, &isect, &volume_ray);
            if stack_sd.runtime_flags.contains(RuntimeFlags::BACKFACING) {
                let need_add = !enclosed.contains(&stack_sd.object)
                    && !self.contains_object(stack_sd.object);
                if need_add {
                    self.push(VolumeStackEntry::new(stack_sd.object, stack_sd.shader));
                }
            } else {
                // Entered and possibly exited later, the origin isn't inside this one
                enclosed.push(stack_sd.object);
            }

            volume_ray.o = ray_offset(stack_sd.p, -stack_sd.ng);
            step += 1;
        }

        if step == max_steps {
            hikari_debug!("Volume stack walk stopped after {} steps", step);
        }

        if self.is_empty() {
            if let Some(shader) = background {
                self.push(VolumeStackEntry::new(None, shader));
            }
        }
    }
}
