use rand::Rng;
use rand_pcg::Pcg32;

use crate::math::Vec2;

/// Dimensions reserved for the camera ray before the first bounce.
pub const PRNG_BASE_NUM: u32 = 8;
/// Dimensions consumed by each bounce.
pub const PRNG_BOUNCE_NUM: u32 = 10;

/// Dimension offsets of the camera sample.
pub mod camera {
    pub const FILTER_U: u32 = 0;
    pub const FILTER_V: u32 = 1;
    pub const LENS_U: u32 = 2;
    pub const LENS_V: u32 = 3;
    pub const TIME: u32 = 4;
}

/// Dimension offsets within one bounce, relative to the path's rng offset.
pub mod bounce {
    pub const BSDF_U: u32 = 0;
    pub const BSDF_V: u32 = 1;
    pub const BSDF: u32 = 2;
    pub const LIGHT: u32 = 3;
    pub const LIGHT_U: u32 = 4;
    pub const LIGHT_V: u32 = 5;
    pub const LIGHT_TERMINATE: u32 = 6;
    pub const TERMINATE: u32 = 7;
    pub const PHASE: u32 = 8;
    pub const SCATTER_DISTANCE: u32 = 9;
}

// Integer hash by Bob Jenkins, lookup3 final mix
fn hash_u32(mut a: u32) -> u32 {
    let mut b = 0xdeadbeef_u32;
    let mut c = 0xdeadbeef_u32;
    c ^= b;
    c = c.wrapping_sub(b.rotate_left(14));
    a ^= c;
    a = a.wrapping_sub(c.rotate_left(11));
    b ^= a;
    b = b.wrapping_sub(a.rotate_left(25));
    c ^= b;
    c = c.wrapping_sub(b.rotate_left(16));
    a ^= c;
    a = a.wrapping_sub(c.rotate_left(4));
    b ^= a;
    b = b.wrapping_sub(a.rotate_left(14));
    c ^= b;
    c = c.wrapping_sub(b.rotate_left(24));
    c
}

/// Seed of the random sequence of a pixel.
pub fn pixel_rng_hash(x: u32, y: u32) -> u32 {
    hash_u32(x ^ hash_u32(y))
}

fn path_rng(rng_hash: u32, sample: u32, dimension: u32) -> Pcg32 {
    let state = ((hash_u32(rng_hash ^ hash_u32(sample)) as u64) << 32) | sample as u64;
    Pcg32::new(state, hash_u32(dimension) as u64)
}

/// Random number in `[0, 1)` for `dimension` of `sample` in the pixel identified by `rng_hash`.
///
/// The result only depends on the arguments so that any dimension can be
/// fetched in any order.
pub fn path_rng_1d(rng_hash: u32, sample: u32, dimension: u32) -> f32 {
    path_rng(rng_hash, sample, dimension).gen()
}

/// Two random numbers from consecutive dimensions starting at `dimension`.
pub fn path_rng_2d(rng_hash: u32, sample: u32, dimension: u32) -> Vec2<f32> {
    Vec2::new(
        path_rng_1d(rng_hash, sample, dimension),
        path_rng_1d(rng_hash, sample, dimension + 1),
    )
}

// Numerical Recipes LCG, used by shader nodes that need a stream of numbers

pub const LCG_SCRAMBLE: u32 = 0xb4bc3953;

pub fn lcg_step_u32(rng: &mut u32) -> u32 {
    *rng = rng.wrapping_mul(1103515245).wrapping_add(12345);
    *rng
}

pub fn lcg_step_f32(rng: &mut u32) -> f32 {
    lcg_step_u32(rng) as f32 * (1.0 / u32::MAX as f32)
}

pub fn lcg_init(seed: u32) -> u32 {
    let mut rng = seed;
    lcg_step_u32(&mut rng);
    rng
}

/// LCG state for a shading point at the current bounce of a path.
pub fn lcg_state_init(rng_hash: u32, rng_offset: u32, sample: u32, scramble: u32) -> u32 {
    lcg_init(
        rng_hash
            .wrapping_add(rng_offset)
            .wrapping_add(sample.wrapping_mul(scramble)),
    )
}
