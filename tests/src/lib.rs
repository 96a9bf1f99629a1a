#[cfg(test)]
mod common;

mod integrator;
mod path_state;
mod setup;
mod volume_stack;
