use super::{Matrix, Node};
use crate::{NnErr, Result};

/// Multiplies every entry of `m` by `scalar`.
pub fn scale(m: &Matrix, scalar: f64) -> Matrix {
    map(m, |v| v * scalar)
}

/// Adds two matrices of the same shape element-wise.
///
/// # Errors
/// `DimensionMismatch` if the shapes differ.
pub fn add(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    if a.dim() != b.dim() {
        return Err(NnErr::DimensionMismatch {
            op: "add",
            a: a.dim(),
            b: b.dim(),
        });
    }

    let data = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .map(|(x, y)| x + y)
        .collect();

    Ok(Node::with_data(a.rows(), a.cols(), data).into())
}

/// Computes the matrix product `a * b`.
///
/// Reads the columns of `b` as rows of its (cached) transpose.
///
/// # Errors
/// `DimensionMismatch` if the cols of `a` differ from the rows of `b`.
pub fn multiply(a: &Matrix, b: &Matrix) -> Result<Matrix> {
    if a.cols() != b.rows() {
        return Err(NnErr::DimensionMismatch {
            op: "multiply",
            a: a.dim(),
            b: b.dim(),
        });
    }

    let bt = b.transpose();
    let mut result = Node::zeros(a.rows(), b.cols())?;
    for i in 0..a.rows() {
        let row = a.row(i)?;
        for j in 0..b.cols() {
            let col = bt.row(j)?;
            let sum: f64 = row.iter().zip(col).map(|(x, y)| x * y).sum();
            result.set(i, j, sum)?;
        }
    }

    Ok(result.into())
}

/// Applies `f` to every entry of `m`.
pub fn map<F>(m: &Matrix, f: F) -> Matrix
where
    F: Fn(f64) -> f64,
{
    let data = m.as_slice().iter().map(|&v| f(v)).collect();
    Node::with_data(m.rows(), m.cols(), data).into()
}
