use crate::vec2::Vec2;

/// A single plasmodium particle.
///
/// Positions are continuous world coordinates in `[0, cols) x [0, rows)`
/// (`position[0]` = x/column, `position[1]` = y/row). The heading must be a
/// unit vector; `World::try_new` rejects populations that violate this.
#[derive(Clone, Debug)]
pub struct Agent {
    pub id: u32,
    pub position: [f64; 2],
    pub heading: Vec2,
    /// Distance travelled per tick, in cells.
    pub speed: f64,
    /// Inactive agents are skipped by the driver and do not occupy cells.
    pub active: bool,
    /// Field value sampled straight ahead on the most recent tick.
    pub last_sensed: f64,
}

impl Agent {
    pub fn new(id: u32, position: [f64; 2], heading: Vec2, speed: f64) -> Self {
        Self {
            id,
            position,
            heading,
            speed,
            active: true,
            last_sensed: 0.0,
        }
    }
}
