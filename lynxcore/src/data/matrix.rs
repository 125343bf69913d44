use std::ops::AddAssign;

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Dense row-major matrix, rows are scans and columns are key-axis positions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct Matrix<T> {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<T>,
}

impl<T: Copy + Default> Matrix<T> {
    /// Creates a `rows x cols` matrix filled with `T::default()`.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Matrix {
            rows,
            cols,
            data: vec![T::default(); rows * cols],
        }
    }

    /// Wraps an existing row-major buffer.
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != rows * cols`.
    pub fn from_row_major(rows: usize, cols: usize, data: Vec<T>) -> Self {
        assert_eq!(data.len(), rows * cols, "matrix buffer does not match its shape");
        Matrix { rows, cols, data }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    pub fn rows_iter(&self) -> impl Iterator<Item = &[T]> + '_ {
        (0..self.rows).map(move |row| self.row(row))
    }
}

impl<T: Copy + Default + AddAssign> Matrix<T> {
    /// Adds `value` into the cell at `(row, col)`.
    #[inline]
    pub fn accumulate(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.cols + col] += value;
    }
}

/// Intensity matrix of a decoded function.
///
/// Integer layouts keep exact counts in an `i64` accumulator, the 8-byte
/// layout carries fractional intensities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Encode, Decode)]
#[serde(tag = "kind", content = "matrix")]
pub enum ValueMatrix {
    Integer(Matrix<i64>),
    Float(Matrix<f64>),
}

impl ValueMatrix {
    pub fn shape(&self) -> (usize, usize) {
        match self {
            ValueMatrix::Integer(m) => m.shape(),
            ValueMatrix::Float(m) => m.shape(),
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, ValueMatrix::Integer(_))
    }

    /// Cell value widened to `f64`.
    pub fn get_f64(&self, row: usize, col: usize) -> f64 {
        match self {
            ValueMatrix::Integer(m) => m.get(row, col) as f64,
            ValueMatrix::Float(m) => m.get(row, col),
        }
    }

    /// Sum of every cell.
    pub fn total(&self) -> f64 {
        match self {
            ValueMatrix::Integer(m) => m.data.iter().map(|&v| v as f64).sum(),
            ValueMatrix::Float(m) => m.data.iter().sum(),
        }
    }

    /// Per-row sums, i.e. the total ion current of every scan.
    pub fn row_sums(&self) -> Vec<f64> {
        match self {
            ValueMatrix::Integer(m) => m
                .rows_iter()
                .map(|row| row.iter().map(|&v| v as f64).sum())
                .collect(),
            ValueMatrix::Float(m) => m.rows_iter().map(|row| row.iter().sum()).collect(),
        }
    }
}
