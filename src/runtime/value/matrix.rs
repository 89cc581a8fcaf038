//! Dense matrices for numeric task payloads.

use std::sync::Arc;

use rand::Rng;
use thiserror::Error;

/// Shape mismatch in a matrix operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot multiply {left_rows}x{left_cols} by {right_rows}x{right_cols}")]
pub struct ShapeError {
    pub left_rows: usize,
    pub left_cols: usize,
    pub right_rows: usize,
    pub right_cols: usize,
}

/// Row-major matrix of `f64` with shared storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Arc<[f64]>,
}

impl Matrix {
    /// Build a matrix from row-major data.
    ///
    /// Returns `None` when `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> Option<Self> {
        if data.len() != rows * cols {
            return None;
        }
        Some(Self {
            rows,
            cols,
            data: Arc::from(data),
        })
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: Arc::from(vec![0.0; rows * cols]),
        }
    }

    pub fn identity(n: usize) -> Self {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Self {
            rows: n,
            cols: n,
            data: Arc::from(data),
        }
    }

    /// Matrix with standard normal entries (Box-Muller transform).
    pub fn random_normal(rows: usize, cols: usize) -> Self {
        let mut rng = rand::rng();
        let len = rows * cols;
        let mut data = Vec::with_capacity(len);
        while data.len() < len {
            // Shift away from zero so ln() stays finite.
            let u1: f64 = 1.0 - rng.random::<f64>();
            let u2: f64 = rng.random::<f64>();
            let radius = (-2.0 * u1.ln()).sqrt();
            let theta = 2.0 * std::f64::consts::PI * u2;
            data.push(radius * theta.cos());
            if data.len() < len {
                data.push(radius * theta.sin());
            }
        }
        Self {
            rows,
            cols,
            data: Arc::from(data),
        }
    }

    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Entry at `(row, col)`, or `None` out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.rows || col >= self.cols {
            return None;
        }
        self.data.get(row * self.cols + col).copied()
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Matrix product `self * other`.
    pub fn dot(&self, other: &Matrix) -> Result<Matrix, ShapeError> {
        if self.cols != other.rows {
            return Err(ShapeError {
                left_rows: self.rows,
                left_cols: self.cols,
                right_rows: other.rows,
                right_cols: other.cols,
            });
        }

        let mut out = vec![0.0; self.rows * other.cols];
        for i in 0..self.rows {
            for k in 0..self.cols {
                let lhs = self.data[i * self.cols + k];
                if lhs == 0.0 {
                    continue;
                }
                let row = &other.data[k * other.cols..(k + 1) * other.cols];
                for (j, rhs) in row.iter().enumerate() {
                    out[i * other.cols + j] += lhs * rhs;
                }
            }
        }

        Ok(Matrix {
            rows: self.rows,
            cols: other.cols,
            data: Arc::from(out),
        })
    }
}
