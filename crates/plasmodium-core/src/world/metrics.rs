use super::World;
use serde::{Deserialize, Serialize};

/// Per-phase wall-clock timings for one tick.
#[derive(Clone, Debug)]
pub struct StepTimings {
    pub emission_us: u64,
    pub field_us: u64,
    pub agent_us: u64,
    pub total_us: u64,
}

/// Aggregate state sampled at one step, consumed by the plotting host.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StepMetrics {
    pub step: usize,
    pub field_total: f64,
    pub field_max: f64,
    pub field_mean: f64,
    pub active_count: usize,
    pub move_count: usize,
    pub blocked_count: usize,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub steps: usize,
    pub sample_every: usize,
    pub samples: Vec<StepMetrics>,
    #[serde(default)]
    pub total_moves: usize,
    #[serde(default)]
    pub total_blocked: usize,
}

impl World {
    pub(crate) fn collect_step_metrics(&self, step: usize) -> StepMetrics {
        let field_total = self.field.total();
        let cell_count = (self.config.rows * self.config.cols) as f64;
        StepMetrics {
            step,
            field_total,
            field_max: self.field.max(),
            field_mean: field_total / cell_count,
            active_count: self.active_count(),
            move_count: self.moves_last_step,
            blocked_count: self.blocked_last_step,
        }
    }
}
