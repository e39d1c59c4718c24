//! Dense toroidal scalar field holding the diffusible trail concentration.
//! Each cell holds one `f64`; edges wrap to the opposite edge.

use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// Wrap a grid index that may be at most one step outside `[0, extent)`.
///
/// In-range indices are returned unchanged. Indices further than one step
/// out of range are a precondition violation and produce an unspecified
/// (wrong) cell, not an error; callers stepping by more than one cell must
/// reduce coordinates with `rem_euclid` first.
pub fn wrap(index: i64, extent: usize) -> usize {
    let extent = extent as i64;
    ((index + extent) % extent) as usize
}

/// Traversal semantics for the diffusion pass.
///
/// The ordering is an explicit parameter rather than an accident of the
/// implementation: the two modes differ whenever more than one cell carries
/// mass, because the sequential traversal lets later cells re-diffuse inflow
/// they received earlier in the same pass.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiffusionMode {
    /// Outgoing flow is computed from a snapshot of the pre-step field.
    #[default]
    DoubleBuffered,
    /// Row-major in-place traversal; cells processed later observe values
    /// already updated within the same pass.
    InPlaceSequential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    InvalidDimensions { rows: usize, cols: usize },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::InvalidDimensions { rows, cols } => {
                write!(f, "field dimensions must be positive (got {rows}x{cols})")
            }
        }
    }
}

impl Error for FieldError {}

#[derive(Clone, Debug)]
pub struct Field {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
    /// Pre-step snapshot buffer reused by double-buffered diffusion.
    scratch: Vec<f64>,
}

impl Field {
    pub fn new(rows: usize, cols: usize) -> Result<Self, FieldError> {
        if rows == 0 || cols == 0 {
            return Err(FieldError::InvalidDimensions { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
            scratch: vec![0.0; rows * cols],
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Row-major cell values, for read-only consumers such as renderers.
    pub fn values(&self) -> &[f64] {
        &self.data
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col] = value;
    }

    pub fn add(&mut self, row: usize, col: usize, amount: f64) {
        debug_assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col] += amount;
    }

    /// Wrap a candidate cell index per axis. Same precondition as [`wrap`].
    pub fn wrap_cell(&self, row: i64, col: i64) -> (usize, usize) {
        (wrap(row, self.rows), wrap(col, self.cols))
    }

    /// Read the value at a possibly off-by-one cell index after wrapping.
    pub fn sample_wrapped(&self, row: i64, col: i64) -> f64 {
        let (r, c) = self.wrap_cell(row, col);
        self.data[r * self.cols + c]
    }

    /// One diffusion step: every cell keeps `v * (1 - rate)` and sends
    /// `v * rate / 4` to each of its four toroidal von-Neumann neighbors.
    pub fn diffuse(&mut self, rate: f64, mode: DiffusionMode) {
        debug_assert!((0.0..=1.0).contains(&rate));
        match mode {
            DiffusionMode::DoubleBuffered => self.diffuse_double_buffered(rate),
            DiffusionMode::InPlaceSequential => self.diffuse_in_place(rate),
        }
    }

    fn diffuse_double_buffered(&mut self, rate: f64) {
        self.scratch.copy_from_slice(&self.data);
        let quarter = rate * 0.25;
        for row in 0..self.rows {
            let up = wrap(row as i64 - 1, self.rows);
            let down = wrap(row as i64 + 1, self.rows);
            for col in 0..self.cols {
                let left = wrap(col as i64 - 1, self.cols);
                let right = wrap(col as i64 + 1, self.cols);
                let inflow = self.scratch[up * self.cols + col]
                    + self.scratch[down * self.cols + col]
                    + self.scratch[row * self.cols + left]
                    + self.scratch[row * self.cols + right];
                self.data[row * self.cols + col] =
                    self.scratch[row * self.cols + col] * (1.0 - rate) + inflow * quarter;
            }
        }
    }

    fn diffuse_in_place(&mut self, rate: f64) {
        let quarter = 0.25;
        for row in 0..self.rows {
            let up = wrap(row as i64 - 1, self.rows);
            let down = wrap(row as i64 + 1, self.rows);
            for col in 0..self.cols {
                let left = wrap(col as i64 - 1, self.cols);
                let right = wrap(col as i64 + 1, self.cols);
                let idx = row * self.cols + col;
                let flow = self.data[idx] * rate;
                self.data[idx] -= flow;
                let share = flow * quarter;
                self.data[up * self.cols + col] += share;
                self.data[down * self.cols + col] += share;
                self.data[row * self.cols + left] += share;
                self.data[row * self.cols + right] += share;
            }
        }
    }

    /// Multiply every cell by `(1 - rate)`.
    pub fn evaporate(&mut self, rate: f64) {
        debug_assert!((0.0..=1.0).contains(&rate));
        let keep = 1.0 - rate;
        for v in &mut self.data {
            *v *= keep;
        }
    }

    pub fn total(&self) -> f64 {
        self.data.iter().sum()
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(0.0, f64::max)
    }
}
