mod ops;

use std::{
    fmt,
    sync::{Arc, OnceLock, Weak},
};

use log::trace;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::{NnErr, Result};

pub use ops::{add, map, multiply, scale};

/// A dense, row-major, fixed-size matrix of `f64`.
///
/// A `Matrix` is a cheap handle: cloning it shares the underlying storage and its cached
/// transpose. Its dimensions and values never change once it's built, every operation
/// returns a new matrix.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "MatrixRepr", into = "MatrixRepr")]
pub struct Matrix {
    node: Arc<Node>,
}

/// The storage behind a `Matrix` handle.
///
/// Only mutated through `set` while an operation fills a result that hasn't been shared yet.
struct Node {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
    transpose: OnceLock<Link>,
    /// Owns a recomputed transpose once the `Link::Back` original is gone.
    orphan: OnceLock<Matrix>,
}

/// The transpose cache slot of a `Node`.
///
/// The matrix that computed its transpose owns it, the computed transpose only keeps a weak
/// handle back so the pair doesn't keep itself alive.
enum Link {
    Owned(Matrix),
    Back(Weak<Node>),
}

/// Validates the dimensions and returns the amount of elements they hold.
fn dim_check(rows: usize, cols: usize) -> Result<usize> {
    match rows.checked_mul(cols) {
        Some(len) if len > 0 => Ok(len),
        _ => Err(NnErr::InvalidDimensions { rows, cols }),
    }
}

impl Node {
    fn zeros(rows: usize, cols: usize) -> Result<Self> {
        let len = dim_check(rows, cols)?;
        Ok(Self::with_data(rows, cols, vec![0.; len]))
    }

    /// Builds a node without validating, `data` must hold `rows * cols` values.
    fn with_data(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        Self {
            rows,
            cols,
            data,
            transpose: OnceLock::new(),
            orphan: OnceLock::new(),
        }
    }

    fn access_check(&self, row: usize, col: usize) -> Result<()> {
        if row >= self.rows || col >= self.cols {
            return Err(NnErr::IndexOutOfRange {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }

        Ok(())
    }

    fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.access_check(row, col)?;
        Ok(self.data[self.cols * row + col])
    }

    fn set(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        self.access_check(row, col)?;
        self.data[self.cols * row + col] = value;
        Ok(())
    }
}

impl From<Node> for Matrix {
    fn from(node: Node) -> Self {
        Self {
            node: Arc::new(node),
        }
    }
}

impl Matrix {
    /// Creates a new `Matrix` with every element set to 0.
    ///
    /// # Errors
    /// `InvalidDimensions` if `rows` or `cols` is 0.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        Node::zeros(rows, cols).map(Self::from)
    }

    /// Creates a new `Matrix` taking ownership of row-major `data`.
    ///
    /// # Errors
    /// `InvalidDimensions` if `rows` or `cols` is 0, `DataLengthMismatch` if `data` doesn't
    /// hold exactly `rows * cols` values.
    pub fn from_vec(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self> {
        let len = dim_check(rows, cols)?;
        if data.len() != len {
            return Err(NnErr::DataLengthMismatch {
                got: data.len(),
                expected: len,
            });
        }

        Ok(Node::with_data(rows, cols, data).into())
    }

    /// Same as `from_vec` but copies the values out of a slice.
    pub fn from_slice(data: &[f64], rows: usize, cols: usize) -> Result<Self> {
        Self::from_vec(data.to_vec(), rows, cols)
    }

    /// Creates a new `Matrix` with every element sampled from `distribution`.
    ///
    /// # Arguments
    /// * `rows` - The amount of rows.
    /// * `cols` - The amount of columns.
    /// * `rng` - The random number generator to draw from.
    /// * `distribution` - The distribution to sample the values from.
    ///
    /// # Errors
    /// `InvalidDimensions` if `rows` or `cols` is 0.
    pub fn random<R, D>(rows: usize, cols: usize, rng: &mut R, distribution: &D) -> Result<Self>
    where
        R: Rng + ?Sized,
        D: Distribution<f64>,
    {
        let len = dim_check(rows, cols)?;
        let data = (0..len)
            .map(|_| distribution.sample(&mut *rng))
            .collect();

        Self::from_vec(data, rows, cols)
    }

    /// Creates a new `Matrix` with every element drawn from a standard normal distribution.
    pub fn random_normal<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Result<Self> {
        Self::random(rows, cols, rng, &StandardNormal)
    }

    /// Creates the `n x n` identity matrix.
    pub fn identity(n: usize) -> Result<Self> {
        let mut node = Node::zeros(n, n)?;
        for i in 0..n {
            node.set(i, i, 1.)?;
        }

        Ok(node.into())
    }

    /// Returns the value at the given row and column.
    ///
    /// # Errors
    /// `IndexOutOfRange` if the position lies outside the matrix.
    pub fn get(&self, row: usize, col: usize) -> Result<f64> {
        self.node.get(row, col)
    }

    /// Returns the values of a single row.
    pub fn row(&self, row: usize) -> Result<&[f64]> {
        self.node.access_check(row, 0)?;
        let start = row * self.node.cols;
        Ok(&self.node.data[start..start + self.node.cols])
    }

    /// Returns `(rows, cols)`.
    pub fn dim(&self) -> (usize, usize) {
        (self.node.rows, self.node.cols)
    }

    /// Returns the amount of rows.
    pub fn rows(&self) -> usize {
        self.node.rows
    }

    /// Returns the amount of columns.
    pub fn cols(&self) -> usize {
        self.node.cols
    }

    /// The row-major values of this matrix.
    pub fn as_slice(&self) -> &[f64] {
        &self.node.data
    }

    /// Whether both handles refer to the very same matrix, not just equal values.
    pub fn ptr_eq(a: &Matrix, b: &Matrix) -> bool {
        Arc::ptr_eq(&a.node, &b.node)
    }

    /// Returns the `(row, col)` of the largest value, the first one on ties.
    pub fn argmax(&self) -> (usize, usize) {
        let mut best = 0;
        for (i, &v) in self.node.data.iter().enumerate().skip(1) {
            if v > self.node.data[best] {
                best = i;
            }
        }

        (best / self.node.cols, best % self.node.cols)
    }

    /// Returns the transpose of this matrix.
    ///
    /// It's computed on the first call and cached. The cached transpose points back to this
    /// matrix, so transposing it again hands back `self` instead of a copy. A transpose that
    /// outlives its original caches one recomputed copy instead.
    pub fn transpose(&self) -> Matrix {
        let link = self
            .node
            .transpose
            .get_or_init(|| Link::Owned(self.compute_transpose()));

        match link {
            Link::Owned(t) => t.clone(),
            Link::Back(original) => match original.upgrade() {
                Some(node) => Matrix { node },
                // The original was dropped while its transpose is still around.
                None => self
                    .node
                    .orphan
                    .get_or_init(|| self.compute_transpose())
                    .clone(),
            },
        }
    }

    fn compute_transpose(&self) -> Matrix {
        let Node {
            rows, cols, data, ..
        } = &*self.node;
        trace!(rows = *rows, cols = *cols; "computing transpose");

        let mut t = vec![0.; data.len()];
        for (r, row) in data.chunks_exact(*cols).enumerate() {
            for (c, &v) in row.iter().enumerate() {
                t[c * rows + r] = v;
            }
        }

        let mut node = Node::with_data(*cols, *rows, t);
        node.transpose = OnceLock::from(Link::Back(Arc::downgrade(&self.node)));
        node.into()
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.dim() == other.dim() && self.as_slice() == other.as_slice()
    }
}

impl fmt::Debug for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix")
            .field("rows", &self.node.rows)
            .field("cols", &self.node.cols)
            .field("data", &self.node.data)
            .finish()
    }
}

/// Rows separated by newlines, values separated by a single space, no trailing newline.
impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.node.data.chunks_exact(self.node.cols).enumerate() {
            if r > 0 {
                writeln!(f)?;
            }

            for (c, v) in row.iter().enumerate() {
                if c > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{v}")?;
            }
        }

        Ok(())
    }
}

/// The serialized form of a `Matrix`, the transpose cache is never stored.
#[derive(Serialize, Deserialize)]
struct MatrixRepr {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl From<Matrix> for MatrixRepr {
    fn from(m: Matrix) -> Self {
        Self {
            rows: m.rows(),
            cols: m.cols(),
            data: m.as_slice().to_vec(),
        }
    }
}

impl TryFrom<MatrixRepr> for Matrix {
    type Error = NnErr;

    fn try_from(repr: MatrixRepr) -> Result<Self> {
        Matrix::from_vec(repr.data, repr.rows, repr.cols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng, rngs::StdRng};

    fn sample() -> Matrix {
        Matrix::from_vec(vec![1., 3., 9., 2., 4., 6.], 2, 3).unwrap()
    }

    #[test]
    fn zeros_string() {
        let cases = [
            (1, 1, "0"),
            (3, 1, "0\n0\n0"),
            (3, 3, "0 0 0\n0 0 0\n0 0 0"),
            (
                5,
                5,
                "0 0 0 0 0\n0 0 0 0 0\n0 0 0 0 0\n0 0 0 0 0\n0 0 0 0 0",
            ),
        ];

        for (rows, cols, expected) in cases {
            let m = Matrix::zeros(rows, cols).unwrap();
            assert!(m.as_slice().iter().all(|&v| v == 0.));
            assert_eq!(m.to_string(), expected, "{rows}x{cols}");
        }
    }

    #[test]
    fn string_uses_default_float_form() {
        let m = Matrix::from_vec(vec![1.5, -2., 0.25, 10.], 2, 2).unwrap();
        assert_eq!(m.to_string(), "1.5 -2\n0.25 10");
    }

    #[test]
    fn invalid_dimensions() {
        assert_eq!(
            Matrix::zeros(0, 3).unwrap_err(),
            NnErr::InvalidDimensions { rows: 0, cols: 3 }
        );
        assert!(Matrix::zeros(3, 0).is_err());
        assert!(Matrix::from_vec(vec![], 0, 0).is_err());

        let mut rng = StdRng::seed_from_u64(0);
        assert!(Matrix::random_normal(0, 1, &mut rng).is_err());
        assert!(Matrix::identity(0).is_err());
    }

    #[test]
    fn data_length_mismatch() {
        let err = Matrix::from_slice(&[1., 2., 3.], 2, 2).unwrap_err();
        assert_eq!(err, NnErr::DataLengthMismatch { got: 3, expected: 4 });
    }

    #[test]
    fn overflowing_dimensions() {
        let err = Matrix::from_vec(vec![], usize::MAX, 2).unwrap_err();
        assert_eq!(
            err,
            NnErr::InvalidDimensions {
                rows: usize::MAX,
                cols: 2
            }
        );
        assert!(Matrix::zeros(2, usize::MAX).is_err());

        let mut rng = StdRng::seed_from_u64(0);
        assert!(Matrix::random_normal(usize::MAX, usize::MAX, &mut rng).is_err());
    }

    #[test]
    fn from_slice_is_row_major() {
        let data = [1., 3., 9., 2., 4., 6., 7., 14., 21.];
        let m = Matrix::from_slice(&data, 3, 3).unwrap();

        for (i, &v) in data.iter().enumerate() {
            assert_eq!(m.get(i / 3, i % 3).unwrap(), v);
        }
        assert_eq!(m.row(1).unwrap(), &[2., 4., 6.]);
    }

    #[test]
    fn get_out_of_range() {
        let m = sample();
        assert_eq!(
            m.get(2, 0).unwrap_err(),
            NnErr::IndexOutOfRange {
                row: 2,
                col: 0,
                rows: 2,
                cols: 3
            }
        );
        assert!(m.get(0, 3).is_err());
        assert!(m.row(2).is_err());
    }

    #[test]
    fn transpose_swaps_elements() {
        let m = sample();
        let t = m.transpose();
        assert_eq!(t.dim(), (3, 2));

        for r in 0..2 {
            for c in 0..3 {
                assert_eq!(t.get(c, r).unwrap(), m.get(r, c).unwrap());
            }
        }
    }

    #[test]
    fn transpose_is_cached() {
        let m = sample();
        let t1 = m.transpose();
        let t2 = m.transpose();
        assert!(Matrix::ptr_eq(&t1, &t2));

        let tt = t1.transpose();
        assert!(Matrix::ptr_eq(&tt, &m));
        assert!(Matrix::ptr_eq(&tt.transpose(), &t1));
    }

    #[test]
    fn transpose_outliving_original() {
        let t = sample().transpose();
        let tt = t.transpose();
        assert_eq!(tt, sample());
        assert!(Matrix::ptr_eq(&tt.transpose(), &t));
        assert!(Matrix::ptr_eq(&t.transpose(), &tt));
        assert!(Matrix::ptr_eq(&t.transpose(), &t.transpose()));
    }

    #[test]
    fn transpose_across_threads() {
        let m = Matrix::from_vec((0..12).map(f64::from).collect(), 3, 4).unwrap();

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let m = m.clone();
                std::thread::spawn(move || m.transpose())
            })
            .collect();

        let ts: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for t in &ts {
            assert!(Matrix::ptr_eq(t, &ts[0]));
        }
        assert!(Matrix::ptr_eq(&ts[0].transpose(), &m));
    }

    #[test]
    fn random_normal_is_seeded() {
        let a = Matrix::random_normal(4, 3, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = Matrix::random_normal(4, 3, &mut StdRng::seed_from_u64(7)).unwrap();
        assert_eq!(a.dim(), (4, 3));
        assert_eq!(a, b);
        assert!(a.as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn identity_and_argmax() {
        let i = Matrix::identity(3).unwrap();
        assert_eq!(i.to_string(), "1 0 0\n0 1 0\n0 0 1");
        assert_eq!(i.argmax(), (0, 0));

        let m = Matrix::from_vec(vec![0.1, 0.7, 0.2, 0.7], 4, 1).unwrap();
        assert_eq!(m.argmax(), (1, 0));
    }

    #[test]
    fn serde_revalidates() {
        let json = serde_json::to_string(&sample()).unwrap();
        assert_eq!(json, r#"{"rows":2,"cols":3,"data":[1.0,3.0,9.0,2.0,4.0,6.0]}"#);

        let back: Matrix = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample());

        let bad = r#"{"rows":2,"cols":2,"data":[1.0]}"#;
        assert!(serde_json::from_str::<Matrix>(bad).is_err());
    }
}
