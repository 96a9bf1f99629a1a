use super::{KernelContext, ShaderData, ShaderType};
use crate::{
    closure::ShaderClosure,
    math::Spectrum,
    path_state::{PathRayFlag, PathState},
};

/// Shader node interpreter that turns a shading point into closures.
///
/// Implementations append to `sd.closures` and may move `sd.p` for displacement.
pub trait ShaderGraph: Send + Sync {
    fn eval_nodes(
        &self,
        kg: &KernelContext,
        sd: &mut ShaderData,
        state: &PathState,
        shader_type: ShaderType,
        path_flags: PathRayFlag,
    );
}

/// Grey diffuse for every surface, used when there is no node interpreter.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ConstantDiffuse {
    pub albedo: Spectrum<f32>,
}

impl Default for ConstantDiffuse {
    fn default() -> Self {
        Self {
            albedo: Spectrum::from(0.8),
        }
    }
}

impl ShaderGraph for ConstantDiffuse {
    fn eval_nodes(
        &self,
        _kg: &KernelContext,
        sd: &mut ShaderData,
        _state: &PathState,
        shader_type: ShaderType,
        _path_flags: PathRayFlag,
    ) {
        if shader_type != ShaderType::Surface {
            return;
        }

        // Background points have no primitive
        let closure = if sd.prim.is_none() && sd.lamp.is_none() {
            ShaderClosure::background(self.albedo)
        } else {
            ShaderClosure::diffuse(self.albedo, sd.n)
        };
        sd.closures.push(closure);
    }
}
