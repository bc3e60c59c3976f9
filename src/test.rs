use crate::prelude::*;
use approx::{assert_abs_diff_eq, assert_relative_eq};
use ndarray::prelude::*;
use ndarray_rand::RandomExt;
use ndarray_rand::rand::SeedableRng;
use ndarray_rand::rand::rngs::StdRng;
use ndarray_rand::rand_distr::Uniform;

mod export_test;

/// Preprocessing parameters used by tests that do not care about scaling
fn default_preprocessing() -> PreprocessingParams {
    PreprocessingParams::new(0.0, 1000.0, 10, 6).unwrap()
}

/// Parameters where every gate weight equals `weight` and every bias is zero
fn constant_parameters(input_dim: usize, units: usize, weight: f32) -> ModelParameters {
    let cell = LSTMCell::from_combined(
        Array2::from_elem((input_dim, 4 * units), weight),
        Array2::from_elem((units, 4 * units), weight),
        Array1::zeros(4 * units),
    )
    .unwrap();
    let dense = Dense::new(Array2::ones((units, 1)), Array1::zeros(1)).unwrap();
    ModelParameters::new(cell, dense, default_preprocessing()).unwrap()
}

/// Parameters drawn uniformly from [-1, 1] with a fixed seed
fn random_parameters(input_dim: usize, units: usize, classes: usize, seed: u64) -> ModelParameters {
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = Uniform::new(-1.0f32, 1.0);
    let cell = LSTMCell::from_combined(
        Array2::random_using((input_dim, 4 * units), dist, &mut rng),
        Array2::random_using((units, 4 * units), dist, &mut rng),
        Array1::random_using(4 * units, dist, &mut rng),
    )
    .unwrap();
    let dense = Dense::new(
        Array2::random_using((units, classes), dist, &mut rng),
        Array1::random_using(classes, dist, &mut rng),
    )
    .unwrap();
    ModelParameters::new(cell, dense, default_preprocessing()).unwrap()
}

/// Random input sequence with shape (timesteps, input_dim)
fn random_sequence(timesteps: usize, input_dim: usize, seed: u64) -> Array2<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::random_using((timesteps, input_dim), Uniform::new(-2.0f32, 2.0), &mut rng)
}
