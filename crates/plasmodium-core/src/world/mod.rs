pub mod metrics;
mod step;
#[cfg(test)]
mod tests;

pub use metrics::*;

use crate::agent::Agent;
use crate::config::{SimConfig, SimConfigError};
use crate::grid::{Field, FieldError};
use crate::vec2::Vec2;
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::collections::HashSet;
use std::f64::consts::TAU;
use std::{error::Error, fmt};

/// The simulation world: the trail field, the fixed agent population, and
/// the per-cell occupancy the movement phase resolves against.
///
/// The world exclusively owns both the field and the agents; agents interact
/// only through the shared field and the occupancy query.
pub struct World {
    pub agents: Vec<Agent>,
    pub(crate) field: Field,
    /// Active agents per cell, row-major. Updated as agents move within a
    /// tick so later agents see earlier moves.
    pub(crate) occupancy: Vec<u32>,
    pub(crate) config: SimConfig,
    pub(crate) rng: ChaCha12Rng,
    pub(crate) step_index: usize,
    /// Reused visit-order buffer for the per-tick agent pass.
    pub(crate) visit_buf: Vec<usize>,
    pub(crate) moves_last_step: usize,
    pub(crate) blocked_last_step: usize,
    pub(crate) total_moves: usize,
    pub(crate) total_blocked: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WorldInitError {
    Config(SimConfigError),
    Field(FieldError),
    AgentCountMismatch { expected: usize, actual: usize },
    DuplicateAgentId { id: u32 },
    AgentOutOfBounds { id: u32 },
    NonUnitHeading { id: u32 },
    NonPositiveSpeed { id: u32 },
}

impl fmt::Display for WorldInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldInitError::Config(e) => write!(f, "{}", e),
            WorldInitError::Field(e) => write!(f, "{}", e),
            WorldInitError::AgentCountMismatch { expected, actual } => write!(
                f,
                "agents.len() ({actual}) must match config.num_agents ({expected})"
            ),
            WorldInitError::DuplicateAgentId { id } => {
                write!(f, "agent id {id} appears more than once")
            }
            WorldInitError::AgentOutOfBounds { id } => write!(
                f,
                "agent {id} has a non-finite or out-of-world position"
            ),
            WorldInitError::NonUnitHeading { id } => write!(
                f,
                "agent {id} heading must have unit norm (normalize before construction)"
            ),
            WorldInitError::NonPositiveSpeed { id } => {
                write!(f, "agent {id} speed must be finite and positive")
            }
        }
    }
}

impl From<SimConfigError> for WorldInitError {
    fn from(err: SimConfigError) -> Self {
        WorldInitError::Config(err)
    }
}

impl From<FieldError> for WorldInitError {
    fn from(err: FieldError) -> Self {
        WorldInitError::Field(err)
    }
}

impl Error for WorldInitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorldInitError::Config(e) => Some(e),
            WorldInitError::Field(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExperimentError {
    InvalidSampleEvery,
    TooManySteps { max: usize, actual: usize },
    TooManySamples { max: usize, actual: usize },
}

impl fmt::Display for ExperimentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExperimentError::InvalidSampleEvery => write!(f, "sample_every must be positive"),
            ExperimentError::TooManySteps { max, actual } => {
                write!(f, "steps ({actual}) exceed supported maximum ({max})")
            }
            ExperimentError::TooManySamples { max, actual } => {
                write!(
                    f,
                    "sample count ({actual}) exceeds supported maximum ({max})"
                )
            }
        }
    }
}

impl Error for ExperimentError {}

impl World {
    pub const MAX_EXPERIMENT_STEPS: usize = 1_000_000;
    pub const MAX_EXPERIMENT_SAMPLES: usize = 50_000;

    pub fn new(agents: Vec<Agent>, config: SimConfig) -> Self {
        Self::try_new(agents, config).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Build a world from an explicit population. Rejects populations that
    /// violate the agent invariants (unique ids, in-world positions, unit
    /// headings, positive speeds).
    pub fn try_new(agents: Vec<Agent>, config: SimConfig) -> Result<Self, WorldInitError> {
        config.validate()?;
        if agents.len() != config.num_agents {
            return Err(WorldInitError::AgentCountMismatch {
                expected: config.num_agents,
                actual: agents.len(),
            });
        }

        let cols_f = config.cols as f64;
        let rows_f = config.rows as f64;
        let mut seen_ids = HashSet::with_capacity(agents.len());
        for agent in &agents {
            if !seen_ids.insert(agent.id) {
                return Err(WorldInitError::DuplicateAgentId { id: agent.id });
            }
            let [x, y] = agent.position;
            if !x.is_finite() || !y.is_finite() || !(0.0..cols_f).contains(&x)
                || !(0.0..rows_f).contains(&y)
            {
                return Err(WorldInitError::AgentOutOfBounds { id: agent.id });
            }
            if !agent.heading.is_unit() {
                return Err(WorldInitError::NonUnitHeading { id: agent.id });
            }
            if !agent.speed.is_finite() || agent.speed <= 0.0 {
                return Err(WorldInitError::NonPositiveSpeed { id: agent.id });
            }
        }

        let field = Field::new(config.rows, config.cols)?;
        let mut occupancy = vec![0u32; config.rows * config.cols];
        for agent in &agents {
            if agent.active {
                occupancy[step::cell_index(agent.position, config.rows, config.cols)] += 1;
            }
        }

        let rng = ChaCha12Rng::seed_from_u64(config.seed);
        let visit_buf = Vec::with_capacity(agents.len());
        Ok(Self {
            agents,
            field,
            occupancy,
            config,
            rng,
            step_index: 0,
            visit_buf,
            moves_last_step: 0,
            blocked_last_step: 0,
            total_moves: 0,
            total_blocked: 0,
        })
    }

    /// Pure reinitialization entry point: a fresh world with a seeded random
    /// population. The interactive host calls this instead of mutating a
    /// running world's parameters.
    pub fn from_config(config: SimConfig) -> Result<Self, WorldInitError> {
        config.validate()?;
        // Spawn RNG is derived from the seed so the per-tick stream does not
        // overlap the placement stream.
        let mut spawn_rng = ChaCha12Rng::seed_from_u64(config.seed.wrapping_add(1));
        let cols_f = config.cols as f64;
        let rows_f = config.rows as f64;
        let agents = (0..config.num_agents as u32)
            .map(|id| {
                let position = [
                    spawn_rng.random::<f64>() * cols_f,
                    spawn_rng.random::<f64>() * rows_f,
                ];
                let heading = Vec2::from_angle(spawn_rng.random::<f64>() * TAU);
                Agent::new(id, position, heading, config.agent_speed)
            })
            .collect();
        Self::try_new(agents, config)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Read-only field snapshot for the visualization collaborator.
    pub fn field(&self) -> &Field {
        &self.field
    }

    /// Read-only agent snapshot for the visualization collaborator.
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn active_count(&self) -> usize {
        self.agents.iter().filter(|a| a.active).count()
    }

    /// Whether any active agent currently occupies the addressed cell.
    pub fn is_cell_occupied(&self, row: usize, col: usize) -> bool {
        debug_assert!(row < self.config.rows && col < self.config.cols);
        self.occupancy[row * self.config.cols + col] > 0
    }

    pub fn run_experiment(&mut self, steps: usize, sample_every: usize) -> RunSummary {
        self.try_run_experiment(steps, sample_every)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_run_experiment(
        &mut self,
        steps: usize,
        sample_every: usize,
    ) -> Result<RunSummary, ExperimentError> {
        if sample_every == 0 {
            return Err(ExperimentError::InvalidSampleEvery);
        }
        if steps > Self::MAX_EXPERIMENT_STEPS {
            return Err(ExperimentError::TooManySteps {
                max: Self::MAX_EXPERIMENT_STEPS,
                actual: steps,
            });
        }
        let estimated_samples = if steps == 0 {
            0
        } else {
            ((steps - 1) / sample_every) + 1
        };
        if estimated_samples > Self::MAX_EXPERIMENT_SAMPLES {
            return Err(ExperimentError::TooManySamples {
                max: Self::MAX_EXPERIMENT_SAMPLES,
                actual: estimated_samples,
            });
        }

        let moves_before = self.total_moves;
        let blocked_before = self.total_blocked;
        let mut samples = Vec::with_capacity(estimated_samples);
        for step in 1..=steps {
            self.step();
            if step % sample_every == 0 || step == steps {
                samples.push(self.collect_step_metrics(step));
            }
        }
        Ok(RunSummary {
            schema_version: 1,
            steps,
            sample_every,
            samples,
            total_moves: self.total_moves - moves_before,
            total_blocked: self.total_blocked - blocked_before,
        })
    }
}
