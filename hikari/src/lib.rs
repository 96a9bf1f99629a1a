#[macro_use]
mod macros;

pub mod closure;
pub mod config;
pub mod geometry;
pub mod integrators;
pub mod math;
pub mod path_state;
pub mod rng;
pub mod sampling;
pub mod shader;
pub mod volume_stack;
