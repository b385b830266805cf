use serde::{Deserialize, Serialize};

/// The function applied element-wise after each layer transition.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActFn {
    Identity,
    /// `amp / (1 + e^-z)`.
    Sigmoid { amp: f64 },
    /// The sigmoid of `z` thresholded at `tresh` into `top` or `bottom`.
    Step { top: f64, bottom: f64, tresh: f64 },
    Relu,
    Tanh,
    /// Any other pure scalar function, can't be serialized.
    #[serde(skip)]
    Custom(fn(f64) -> f64),
}

use ActFn::*;

impl ActFn {
    /// The unit amplitude sigmoid.
    pub fn sigmoid() -> Self {
        Sigmoid { amp: 1. }
    }

    pub fn step(top: f64, bottom: f64, tresh: f64) -> Self {
        Step { top, bottom, tresh }
    }

    /// Evaluates the function at `z`.
    pub fn f(&self, z: f64) -> f64 {
        match *self {
            Identity => z,
            Sigmoid { amp } => amp / (1. + (-z).exp()),
            Step { top, bottom, tresh } => {
                let s = 1. / (1. + (-z).exp());

                if s >= tresh { top } else { bottom }
            }
            Relu => z.max(0.),
            Tanh => z.tanh(),
            Custom(f) => f(z),
        }
    }
}

impl Default for ActFn {
    fn default() -> Self {
        Self::sigmoid()
    }
}

impl From<fn(f64) -> f64> for ActFn {
    fn from(f: fn(f64) -> f64) -> Self {
        Custom(f)
    }
}
