use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// Tolerance used when checking that a heading has unit length.
pub const UNIT_TOLERANCE: f64 = 1e-9;

/// 2-D vector used for agent headings and probe offsets.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorError {
    /// Normalization of a zero or non-finite vector was requested.
    InvalidVector,
}

impl fmt::Display for VectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorError::InvalidVector => {
                write!(f, "cannot normalize a zero or non-finite vector")
            }
        }
    }
}

impl Error for VectorError {}

impl Vec2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Unit vector pointing at `angle` radians (counter-clockwise from +x).
    pub fn from_angle(angle: f64) -> Self {
        Self {
            x: angle.cos(),
            y: angle.sin(),
        }
    }

    pub fn norm(self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Rotate counter-clockwise by `angle` radians. Preserves the norm.
    pub fn rotated(self, angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: self.x * cos - self.y * sin,
            y: self.x * sin + self.y * cos,
        }
    }

    /// Scale to unit length. Rejects zero and non-finite inputs instead of
    /// producing NaN components.
    pub fn normalized(self) -> Result<Self, VectorError> {
        let n = self.norm();
        if !n.is_finite() || n == 0.0 {
            return Err(VectorError::InvalidVector);
        }
        Ok(Self {
            x: self.x / n,
            y: self.y / n,
        })
    }

    pub fn scaled(self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }

    pub fn is_unit(self) -> bool {
        (self.norm() - 1.0).abs() <= UNIT_TOLERANCE
    }
}
