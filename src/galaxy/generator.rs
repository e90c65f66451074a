use super::error::GalaxyResult;
use super::galaxy_config::GalaxyParameters;
use rand::prelude::*;
use rayon::prelude::*;
use std::f32::consts::TAU;

/// Source of the random draws a galaxy is built from.
pub trait ParticleSampler {
    /// Uniform distance from the galactic center in `[0, radius]`.
    fn radial_distance(&mut self, radius: f32) -> f32;
    /// `±u^power` with `u` uniform in `[0, 1)` and a fair sign.
    fn signed_offset(&mut self, power: f32) -> f32;
}

/// Adapts any `rand` generator.
pub struct RngSampler<R>(pub R);

impl<R: Rng> ParticleSampler for RngSampler<R> {
    fn radial_distance(&mut self, radius: f32) -> f32 {
        self.0.random::<f32>() * radius
    }

    fn signed_offset(&mut self, power: f32) -> f32 {
        let magnitude = self.0.random::<f32>().powf(power);
        if self.0.random_bool(0.5) {
            magnitude
        } else {
            -magnitude
        }
    }
}

/// Index-aligned position and color buffers, 3 floats per particle each.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointCloud {
    pub positions: Vec<[f32; 3]>,
    pub colors: Vec<[f32; 3]>,
}

impl PointCloud {
    pub fn len(&self) -> usize {
        self.positions.len()
    }
}

/// The random part of one particle.
#[derive(Clone, Copy, Debug)]
struct ParticleSample {
    distance: f32,
    offset: [f32; 3],
}

/// Generates a galaxy from the thread-local RNG.
pub fn generate(params: &GalaxyParameters) -> GalaxyResult<PointCloud> {
    generate_with(params, &mut RngSampler(rand::rng()))
}

/// Generates a galaxy, drawing all randomness from `sampler`.
///
/// Draws happen on the calling thread in particle order (distance, then x, y, z offsets);
/// turning the draws into positions and colors is spread over the rayon pool.
pub fn generate_with(
    params: &GalaxyParameters,
    sampler: &mut impl ParticleSampler,
) -> GalaxyResult<PointCloud> {
    params.validate()?;

    let samples: Vec<ParticleSample> = (0..params.count)
        .map(|_| {
            let distance = sampler.radial_distance(params.radius);
            let mut offset = [0.0; 3];
            for axis in &mut offset {
                *axis = sampler.signed_offset(params.randomness_power)
                    * params.randomness
                    * distance;
            }
            ParticleSample { distance, offset }
        })
        .collect();

    let (positions, colors) = samples
        .par_iter()
        .enumerate()
        .map(|(i, sample)| (particle_position(params, i, sample), particle_color(params, sample)))
        .unzip();

    Ok(PointCloud { positions, colors })
}

/// Angle of the spiral arm particle `index` belongs to.
fn branch_angle(index: usize, branches: u32) -> f32 {
    debug_assert!(branches >= 1, "branch count is validated before sampling");
    (index % branches as usize) as f32 / branches as f32 * TAU
}

fn particle_position(params: &GalaxyParameters, index: usize, sample: &ParticleSample) -> [f32; 3] {
    let spin_angle = sample.distance * params.spin;
    let angle = branch_angle(index, params.branches) + spin_angle;
    let [dx, dy, dz] = sample.offset;
    [
        angle.cos() * sample.distance + dx,
        dy,
        angle.sin() * sample.distance + dz,
    ]
}

fn particle_color(params: &GalaxyParameters, sample: &ParticleSample) -> [f32; 3] {
    params
        .inside_color
        .lerp(params.outside_color, sample.distance / params.radius)
        .into()
}
