//! Seeded random number generation.
//!
//! All randomness in the crate (weight initialization, dropout masks and
//! minibatch shuffling) is drawn from explicitly owned `StdRng` instances so
//! that a fixed seed reproduces a training run exactly.

use crate::error::{NetworkError, Result};
use crate::tensor::Tensor;
use ndarray::{Array1, Array2, IxDyn};
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_distr::{Bernoulli, StandardNormal};
use std::time::{SystemTime, UNIX_EPOCH};

/// Create a generator from an explicit seed.
pub fn seeded(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Seed derived from the current time, for runs that do not need to be reproducible.
pub fn seed_from_time() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}

/// `(rows, cols)` matrix sampled from the standard normal distribution.
pub fn normal_matrix(rows: usize, cols: usize, rng: &mut StdRng) -> Array2<f64> {
    Array2::random_using((rows, cols), StandardNormal, rng)
}

/// Vector sampled from the standard normal distribution.
pub fn normal_vector(len: usize, rng: &mut StdRng) -> Array1<f64> {
    Array1::random_using(len, StandardNormal, rng)
}

/// Inverted-dropout mask: each element is `1 / keep` with probability `keep`, else 0.
pub fn dropout_mask(dims: &[usize], keep: f64, rng: &mut StdRng) -> Result<Tensor> {
    let bernoulli = Bernoulli::new(keep)
        .map_err(|e| NetworkError::config(format!("keep probability {}: {}", keep, e)))?;
    let scale = 1.0 / keep;
    let kept = ndarray::ArrayD::<bool>::random_using(IxDyn(dims), bernoulli, rng);
    Ok(kept.mapv(|k| if k { scale } else { 0.0 }))
}

/// Random permutation of `0..count` (Fisher-Yates).
pub fn shuffled_indices(count: usize, rng: &mut StdRng) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..count).collect();
    indices.shuffle(rng);
    indices
}
