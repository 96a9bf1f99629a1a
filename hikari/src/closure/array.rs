use super::{Bssrdf, ClosureFlags, ShaderClosure, CLOSURE_WEIGHT_CUTOFF};
use crate::{hikari_trace, math::Spectrum};

/// Fixed-capacity list of the closures at one shading point.
///
/// Order is insertion order, removal keeps the relative order of the rest.
#[derive(Clone, Debug)]
pub struct ClosureArray {
    closures: Vec<ShaderClosure>,
    capacity: usize,
    flags: ClosureFlags,
}

impl ClosureArray {
    pub fn new(capacity: usize) -> Self {
        Self {
            closures: Vec::with_capacity(capacity),
            capacity,
            flags: ClosureFlags::empty(),
        }
    }

    pub fn len(&self) -> usize {
        self.closures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closures.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.closures.len() >= self.capacity
    }

    /// Kinds of closures that have been added since the last [`ClosureArray::clear`].
    pub fn flags(&self) -> ClosureFlags {
        self.flags
    }

    pub fn clear(&mut self) {
        self.closures.clear();
        self.flags = ClosureFlags::empty();
    }

    /// Adds `closure`, returning its index.
    ///
    /// Closures with negligible weight are skipped and so are all closures
    /// once the array is full.
    pub fn push(&mut self, closure: ShaderClosure) -> Option<usize> {
        if closure.sample_weight < CLOSURE_WEIGHT_CUTOFF {
            return None;
        }
        if self.is_full() {
            hikari_trace!("Closure array full, dropping {}", closure.ty());
            return None;
        }
        self.flags |= closure.ty().flags();
        self.closures.push(closure);
        Some(self.closures.len() - 1)
    }

    /// Adds a subsurface closure, moving channels without a scatter radius to a diffuse one.
    pub fn push_bssrdf(&mut self, weight: Spectrum<f32>, bssrdf: Bssrdf) {
        let diffuse_weight = Spectrum::new(
            if bssrdf.radius.r > 0.0 { 0.0 } else { weight.r },
            if bssrdf.radius.g > 0.0 { 0.0 } else { weight.g },
            if bssrdf.radius.b > 0.0 { 0.0 } else { weight.b },
        );
        let n = bssrdf.n;

        if bssrdf.channels() > 0 {
            self.push(ShaderClosure::bssrdf(weight - diffuse_weight, bssrdf));
        }
        self.push(ShaderClosure::subsurface_diffuse(diffuse_weight, n));
    }

    pub fn remove(&mut self, index: usize) -> ShaderClosure {
        self.closures.remove(index)
    }

    pub fn get(&self, index: usize) -> Option<&ShaderClosure> {
        self.closures.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut ShaderClosure> {
        self.closures.get_mut(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ShaderClosure> {
        self.closures.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, ShaderClosure> {
        self.closures.iter_mut()
    }

    pub fn as_slice(&self) -> &[ShaderClosure] {
        &self.closures
    }

    /// Folds closures that only differ by weight into the first one of them.
    pub fn merge(&mut self) {
        let mut i = 0;
        while i < self.closures.len() {
            let mut j = i + 1;
            while j < self.closures.len() {
                if self.closures[i].can_merge(&self.closures[j]) {
                    let merged = self.closures.remove(j);
                    let target = &mut self.closures[i];
                    target.weight += merged.weight;
                    target.sample_weight += merged.sample_weight;
                    // The next candidate moved into j
                } else {
                    j += 1;
                }
            }
            i += 1;
        }
    }
}

impl<'a> IntoIterator for &'a ClosureArray {
    type Item = &'a ShaderClosure;
    type IntoIter = std::slice::Iter<'a, ShaderClosure>;

    fn into_iter(self) -> Self::IntoIter {
        self.closures.iter()
    }
}
