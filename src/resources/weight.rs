//! Skinning weights.
//!
//! A mesh stores one flat list of [`Weight`]s; every vertex references the
//! subset that influences it through [`VertexWeights`].

use smallvec::SmallVec;

use crate::errors::{MeshError, Result};
use crate::settings::{WEIGHT_SUM_TOLERANCE, WeightValidation};

/// Influence of one joint on a vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weight {
    /// Joint index inside the skeleton
    pub joint: u32,
    /// Bias factor, the biases of one vertex are expected to sum to 1
    pub bias: f32,
}

impl Weight {
    #[must_use]
    pub fn new(joint: u32, bias: f32) -> Self {
        Self { joint, bias }
    }
}

/// Indices into the mesh weight list, in application order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VertexWeights {
    pub weights: SmallVec<[u32; 4]>,
}

impl VertexWeights {
    #[must_use]
    pub fn new(weights: &[u32]) -> Self {
        Self {
            weights: SmallVec::from_slice(weights),
        }
    }

    /// Sum of the referenced biases. Dangling indices contribute nothing.
    #[must_use]
    pub fn bias_sum(&self, weights: &[Weight]) -> f32 {
        self.weights
            .iter()
            .filter_map(|&i| weights.get(i as usize))
            .map(|w| w.bias)
            .sum()
    }
}

/// Checks that the biases of every vertex sum to one and reacts according
/// to `policy`. Returns the number of offending vertices.
///
/// `Normalize` rescales in place. Because weights may be shared between
/// vertices, offending vertices get private copies of their weights appended
/// to `weights` before rescaling.
pub fn validate_vertex_weights(
    weights: &mut Vec<Weight>,
    vertex_weights: &mut [VertexWeights],
    policy: WeightValidation,
) -> Result<usize> {
    if policy == WeightValidation::Trust {
        return Ok(0);
    }

    let mut offending = 0;
    for (vertex, vw) in vertex_weights.iter_mut().enumerate() {
        if vw.weights.is_empty() {
            continue;
        }
        let sum = vw.bias_sum(weights);
        if (sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE {
            continue;
        }
        offending += 1;

        match policy {
            WeightValidation::Trust => {}
            WeightValidation::Warn => {
                log::warn!("Vertex {vertex}: weight biases sum to {sum}, skinning will be scaled");
            }
            WeightValidation::Reject => {
                return Err(MeshError::InvalidVertexWeights { vertex, sum });
            }
            WeightValidation::Normalize => {
                if sum.abs() <= f32::EPSILON {
                    log::warn!("Vertex {vertex}: all weight biases are zero, cannot normalize");
                    continue;
                }
                for index in &mut vw.weights {
                    if let Some(&weight) = weights.get(*index as usize) {
                        *index = weights.len() as u32;
                        weights.push(Weight::new(weight.joint, weight.bias / sum));
                    }
                }
            }
        }
    }

    if offending > 0 {
        log::debug!("{offending} vertices with unnormalized weights ({policy:?})");
    }
    Ok(offending)
}
