use crate::{Matrix, Result};

/// A model that maps an input column to an output column in a single forward pass.
pub trait Feedforward {
    /// Propagates `x` through the model.
    ///
    /// # Errors
    /// Returns an `NnErr` if `x` doesn't have the shape the model expects.
    fn forward(&self, x: &Matrix) -> Result<Matrix>;
}
