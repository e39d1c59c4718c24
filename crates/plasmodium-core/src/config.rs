use crate::grid::DiffusionMode;
use serde::{Deserialize, Serialize};
use std::{error::Error, fmt};

/// Order in which the driver visits agents within a tick. Every agent is
/// visited exactly once per tick in either mode.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisitOrder {
    /// Fixed insertion order (deterministic baseline).
    #[default]
    Insertion,
    /// Fresh uniform-random permutation every tick.
    Shuffled,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Deterministic seed for reproducible runs.
    pub seed: u64,
    /// Field height in cells.
    pub rows: usize,
    /// Field width in cells.
    pub cols: usize,
    /// Fixed population size; agents are never created or destroyed mid-run.
    pub num_agents: usize,
    /// Fraction of each cell's value spread to its four neighbors per tick.
    pub diffusion_rate: f64,
    /// Fraction of each cell's value lost per tick after diffusion.
    pub evaporation_rate: f64,
    /// Trail amount deposited by an agent at its cell.
    pub emission_amount: f64,
    /// Distance from the agent to each sensing probe, in cells.
    pub sensor_range: f64,
    /// Angular offset of the left/right probes from the heading (radians).
    pub sensor_angle: f64,
    /// Fixed turn applied when steering toward a stronger probe (radians).
    pub wiggle_angle: f64,
    /// Distance each agent travels per tick, in cells.
    pub agent_speed: f64,
    /// Traversal semantics of the diffusion pass.
    pub diffusion_mode: DiffusionMode,
    /// Order in which agents are visited each tick.
    pub visit_order: VisitOrder,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            rows: 200,
            cols: 200,
            num_agents: 1_000,
            diffusion_rate: 0.5,
            evaporation_rate: 0.1,
            emission_amount: 2.0,
            sensor_range: 3.0,
            sensor_angle: std::f64::consts::FRAC_PI_4,
            wiggle_angle: std::f64::consts::FRAC_PI_6,
            agent_speed: 1.0,
            diffusion_mode: DiffusionMode::default(),
            visit_order: VisitOrder::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimConfigError {
    InvalidGridSize,
    GridTooLarge { max: usize, actual: usize },
    InvalidDiffusionRate,
    InvalidEvaporationRate,
    InvalidEmissionAmount,
    InvalidSensorRange,
    InvalidAngle,
    InvalidAgentSpeed,
    InvalidPopulation { max: usize, actual: usize },
}

impl fmt::Display for SimConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimConfigError::InvalidGridSize => {
                write!(f, "rows and cols must both be at least 1")
            }
            SimConfigError::GridTooLarge { max, actual } => {
                write!(f, "grid extent ({actual}) exceeds supported maximum ({max})")
            }
            SimConfigError::InvalidDiffusionRate => {
                write!(f, "diffusion_rate must be finite and within [0, 1]")
            }
            SimConfigError::InvalidEvaporationRate => {
                write!(f, "evaporation_rate must be finite and within [0, 1]")
            }
            SimConfigError::InvalidEmissionAmount => {
                write!(f, "emission_amount must be finite and non-negative")
            }
            SimConfigError::InvalidSensorRange => {
                write!(f, "sensor_range must be finite and positive")
            }
            SimConfigError::InvalidAngle => {
                write!(f, "sensor_angle and wiggle_angle must be finite")
            }
            SimConfigError::InvalidAgentSpeed => {
                write!(f, "agent_speed must be finite and positive")
            }
            SimConfigError::InvalidPopulation { max, actual } => {
                write!(
                    f,
                    "num_agents ({actual}) must be between 1 and the cell count ({max})"
                )
            }
        }
    }
}

impl Error for SimConfigError {}

impl SimConfig {
    /// Largest valid field extent per axis. Keeps `rows * cols` comfortably
    /// within index range and bounds per-tick work.
    pub const MAX_GRID_EXTENT: usize = 4096;

    pub fn validate(&self) -> Result<(), SimConfigError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(SimConfigError::InvalidGridSize);
        }
        let extent = self.rows.max(self.cols);
        if extent > Self::MAX_GRID_EXTENT {
            return Err(SimConfigError::GridTooLarge {
                max: Self::MAX_GRID_EXTENT,
                actual: extent,
            });
        }
        if !self.diffusion_rate.is_finite() || !(0.0..=1.0).contains(&self.diffusion_rate) {
            return Err(SimConfigError::InvalidDiffusionRate);
        }
        if !self.evaporation_rate.is_finite() || !(0.0..=1.0).contains(&self.evaporation_rate) {
            return Err(SimConfigError::InvalidEvaporationRate);
        }
        if !self.emission_amount.is_finite() || self.emission_amount < 0.0 {
            return Err(SimConfigError::InvalidEmissionAmount);
        }
        if !self.sensor_range.is_finite() || self.sensor_range <= 0.0 {
            return Err(SimConfigError::InvalidSensorRange);
        }
        if !self.sensor_angle.is_finite() || !self.wiggle_angle.is_finite() {
            return Err(SimConfigError::InvalidAngle);
        }
        if !self.agent_speed.is_finite() || self.agent_speed <= 0.0 {
            return Err(SimConfigError::InvalidAgentSpeed);
        }
        // Movement resolves one agent per cell, so the population must fit.
        let cell_count = self.rows * self.cols;
        if self.num_agents == 0 || self.num_agents > cell_count {
            return Err(SimConfigError::InvalidPopulation {
                max: cell_count,
                actual: self.num_agents,
            });
        }
        Ok(())
    }
}
