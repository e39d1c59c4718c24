pub mod agent;
pub mod config;
pub mod grid;
pub mod vec2;
pub mod world;

pub use config::{SimConfig, SimConfigError, VisitOrder};
pub use grid::{DiffusionMode, Field};
pub use world::{ExperimentError, RunSummary, StepMetrics, StepTimings, World, WorldInitError};
