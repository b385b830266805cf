use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used across the crate.
pub type Result<T> = std::result::Result<T, NnErr>;

/// Caller contract violations raised by matrices and networks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NnErr {
    /// A matrix was requested with zero rows or zero columns.
    InvalidDimensions { rows: usize, cols: usize },
    /// The flat data handed to a constructor doesn't hold `rows * cols` values.
    DataLengthMismatch { got: usize, expected: usize },
    /// An element was addressed outside of `[0, rows) x [0, cols)`.
    IndexOutOfRange {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    /// The operands of `op` have incompatible shapes.
    DimensionMismatch {
        op: &'static str,
        a: (usize, usize),
        b: (usize, usize),
    },
    /// A network needs at least an input and an output layer.
    InsufficientLayers { got: usize },
}

impl Display for NnErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NnErr::InvalidDimensions { rows, cols } => format!(
                "rows and cols ({rows}x{cols}) must both be greater than 0"
            ),
            NnErr::DataLengthMismatch { got, expected } => format!(
                "supplied data is expected to have a length of {expected}, instead its length is {got}"
            ),
            NnErr::IndexOutOfRange {
                row,
                col,
                rows,
                cols,
            } => format!(
                "row and col ({row}, {col}) must be less than the matrix's dimensions ({rows}x{cols})"
            ),
            NnErr::DimensionMismatch { op, a, b } => format!(
                "incompatible shapes for {op}: {}x{} and {}x{}",
                a.0, a.1, b.0, b.1
            ),
            NnErr::InsufficientLayers { got } => format!(
                "there must be at least 2 layers (one for input and one for output), got {got}"
            ),
        };

        write!(f, "{s}")
    }
}

impl Error for NnErr {}
