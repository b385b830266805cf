//! Dense `f64` matrices and a feed-forward network that runs inference on top of them.
//!
//! ```
//! use matnet::{ActFn, Matrix, Network};
//!
//! # fn main() -> matnet::Result<()> {
//! let net = Network::with_seed(&[10, 5], ActFn::Identity, 0)?;
//! let input = Matrix::from_vec(vec![1.; 10], 10, 1)?;
//! let output = net.predict(&input)?;
//! assert_eq!(output.dim(), (5, 1));
//! # Ok(())
//! # }
//! ```

pub mod activation;
pub mod config;
pub mod error;
pub mod feedforward;
pub mod matrix;
pub mod mnist;
pub mod network;

pub use activation::ActFn;
pub use config::{ConfigErr, NetworkConfig};
pub use error::{NnErr, Result};
pub use feedforward::Feedforward;
pub use matrix::{Matrix, add, map, multiply, scale};
pub use network::Network;
