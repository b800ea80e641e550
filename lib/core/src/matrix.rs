use crate::{Error, Result, Vector};
use serde::{Deserialize, Serialize};

/// Encoded feature rows, all of the same width.
///
/// Row `i` belongs to whatever identity sits at position `i` of the
/// parallel ID array held next to it; nothing in the matrix itself
/// records identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncodedMatrix {
    dim: usize,
    rows: Vec<Vector>,
}

impl EncodedMatrix {
    /// Assemble a matrix, rejecting ragged rows
    pub fn new(rows: Vec<Vector>) -> Result<Self> {
        let dim = rows.first().map(Vector::dim).unwrap_or(0);
        if let Some(bad) = rows.iter().find(|row| row.dim() != dim) {
            return Err(Error::InvalidDimension {
                expected: dim,
                actual: bad.dim(),
            });
        }
        Ok(Self { dim, rows })
    }

    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        Self::new(rows.into_iter().map(Vector::new).collect())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Width of every row
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn row(&self, index: usize) -> Option<&Vector> {
        self.rows.get(index)
    }

    pub fn rows(&self) -> &[Vector] {
        &self.rows
    }

    /// Single column as a contiguous vec
    pub fn column(&self, index: usize) -> Option<Vec<f64>> {
        if index >= self.dim {
            return None;
        }
        Some(self.rows.iter().map(|row| row.as_slice()[index]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_shape() {
        let matrix = EncodedMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        assert_eq!(matrix.len(), 3);
        assert_eq!(matrix.dim(), 2);
        assert_eq!(matrix.column(1), Some(vec![2.0, 4.0, 6.0]));
        assert_eq!(matrix.column(2), None);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = EncodedMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert_eq!(err, Error::InvalidDimension { expected: 2, actual: 1 });
    }

    #[test]
    fn test_empty_matrix() {
        let matrix = EncodedMatrix::new(Vec::new()).unwrap();
        assert!(matrix.is_empty());
        assert_eq!(matrix.dim(), 0);
    }
}
