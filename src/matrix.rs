//! Owned two dimensional buffer.

use std::ops::{Index, IndexMut};

/// Dense row-major matrix of `f64` with explicit dimensions.  Rows are handed out as
/// slices so a row can be normalised or summed without index arithmetic at the call site.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Creates a `rows x cols` matrix with every cell set to `value`
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Iterates over all rows in order
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> {
        self.data.chunks(self.cols)
    }

    /// Iterates mutably over all rows in order
    pub fn iter_rows_mut(&mut self) -> impl Iterator<Item = &mut [f64]> {
        self.data.chunks_mut(self.cols)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &Self::Output {
        assert!(col < self.cols, "column {} out of bounds", col);
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut Self::Output {
        assert!(col < self.cols, "column {} out of bounds", col);
        &mut self.data[row * self.cols + col]
    }
}
