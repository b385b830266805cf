use log::debug;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    ActFn, Feedforward, NnErr, Result,
    matrix::{self, Matrix},
};

/// A fully connected feed-forward network used for inference only.
///
/// Holds one weight matrix of shape `(n[i + 1], n[i])` and one bias column of shape
/// `(n[i + 1], 1)` per layer transition, never modified after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "NetworkRepr", into = "NetworkRepr")]
pub struct Network {
    layer_sizes: Vec<usize>,
    weights: Vec<Matrix>,
    biases: Vec<Matrix>,
    act_fn: ActFn,
}

impl Network {
    /// Creates a new `Network` with standard normal weights and zero biases.
    ///
    /// # Arguments
    /// * `layer_sizes` - The amount of units of every layer, input first and output last.
    /// * `act_fn` - The activation applied after every transition.
    /// * `rng` - The random number generator the weights are drawn from.
    ///
    /// # Errors
    /// `InsufficientLayers` if there are less than 2 layers, `InvalidDimensions` if a layer
    /// has no units.
    pub fn new<R>(layer_sizes: &[usize], act_fn: ActFn, rng: &mut R) -> Result<Self>
    where
        R: Rng + ?Sized,
    {
        if layer_sizes.len() < 2 {
            return Err(NnErr::InsufficientLayers {
                got: layer_sizes.len(),
            });
        }

        debug!("building network with layers {layer_sizes:?}");
        let transitions = layer_sizes.len() - 1;
        let mut weights = Vec::with_capacity(transitions);
        let mut biases = Vec::with_capacity(transitions);

        for pair in layer_sizes.windows(2) {
            let (dim_in, dim_out) = (pair[0], pair[1]);
            weights.push(Matrix::random_normal(dim_out, dim_in, rng)?);
            biases.push(Matrix::zeros(dim_out, 1)?);
        }

        Ok(Self {
            layer_sizes: layer_sizes.to_vec(),
            weights,
            biases,
            act_fn,
        })
    }

    /// Same as `new` drawing the weights from a generator seeded with `seed`.
    pub fn with_seed(layer_sizes: &[usize], act_fn: ActFn, seed: u64) -> Result<Self> {
        Self::new(layer_sizes, act_fn, &mut StdRng::seed_from_u64(seed))
    }

    /// Creates a new `Network` out of already built weights and biases.
    ///
    /// # Errors
    /// `InsufficientLayers` if there are no weights, `DimensionMismatch` if the amount of
    /// biases differs from the amount of weights or if any of the shapes don't chain up.
    pub fn from_parts(weights: Vec<Matrix>, biases: Vec<Matrix>, act_fn: ActFn) -> Result<Self> {
        let Some(first) = weights.first() else {
            return Err(NnErr::InsufficientLayers { got: 1 });
        };

        if weights.len() != biases.len() {
            return Err(NnErr::DimensionMismatch {
                op: "layer count",
                a: (weights.len(), 1),
                b: (biases.len(), 1),
            });
        }

        let mut layer_sizes = vec![first.cols()];
        for (w, b) in weights.iter().zip(&biases) {
            let dim_in = layer_sizes[layer_sizes.len() - 1];
            if w.cols() != dim_in {
                return Err(NnErr::DimensionMismatch {
                    op: "weights",
                    a: (dim_in, 1),
                    b: w.dim(),
                });
            }
            if b.dim() != (w.rows(), 1) {
                return Err(NnErr::DimensionMismatch {
                    op: "biases",
                    a: w.dim(),
                    b: b.dim(),
                });
            }

            layer_sizes.push(w.rows());
        }

        Ok(Self {
            layer_sizes,
            weights,
            biases,
            act_fn,
        })
    }

    /// Makes a forward pass through the network.
    ///
    /// # Arguments
    /// * `input` - A `(n[0], 1)` column.
    ///
    /// # Returns
    /// The `(n[k], 1)` output column, or `DimensionMismatch` if `input` has another shape.
    pub fn predict(&self, input: &Matrix) -> Result<Matrix> {
        let expected = (self.layer_sizes[0], 1);
        if input.dim() != expected {
            return Err(NnErr::DimensionMismatch {
                op: "predict",
                a: expected,
                b: input.dim(),
            });
        }

        let mut current = input.clone();
        for (w, b) in self.weights.iter().zip(&self.biases) {
            let z = matrix::add(&matrix::multiply(w, &current)?, b)?;
            current = matrix::map(&z, |v| self.act_fn.f(v));
        }

        Ok(current)
    }

    /// Returns the amount of units of every layer, input first.
    pub fn layer_sizes(&self) -> &[usize] {
        &self.layer_sizes
    }

    /// Returns the weight matrix of every layer transition.
    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    /// Returns the bias column of every layer transition.
    pub fn biases(&self) -> &[Matrix] {
        &self.biases
    }

    /// Returns the activation applied after every transition.
    pub fn act_fn(&self) -> ActFn {
        self.act_fn
    }
}

impl Feedforward for Network {
    fn forward(&self, x: &Matrix) -> Result<Matrix> {
        self.predict(x)
    }
}

/// The serialized form of a `Network`, the layer sizes are recovered from the weights.
#[derive(Serialize, Deserialize)]
struct NetworkRepr {
    weights: Vec<Matrix>,
    biases: Vec<Matrix>,
    act_fn: ActFn,
}

impl From<Network> for NetworkRepr {
    fn from(net: Network) -> Self {
        Self {
            weights: net.weights,
            biases: net.biases,
            act_fn: net.act_fn,
        }
    }
}

impl TryFrom<NetworkRepr> for Network {
    type Error = NnErr;

    fn try_from(repr: NetworkRepr) -> Result<Self> {
        Network::from_parts(repr.weights, repr.biases, repr.act_fn)
    }
}
