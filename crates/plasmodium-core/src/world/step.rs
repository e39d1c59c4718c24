use super::metrics::StepTimings;
use super::World;
use crate::config::VisitOrder;
use crate::grid::{wrap, Field};
use crate::vec2::Vec2;
use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha12Rng;
use std::f64::consts::TAU;
use std::time::Instant;

/// Map a continuous in-world position to its (row, col) cell by rounding.
/// Positions live in `[0, cols) x [0, rows)`, so the rounded index is at most
/// one step past the edge and `wrap` brings it back.
pub(crate) fn cell_index(position: [f64; 2], rows: usize, cols: usize) -> usize {
    let row = wrap(position[1].round() as i64, rows);
    let col = wrap(position[0].round() as i64, cols);
    row * cols + col
}

pub(crate) struct SenseSample {
    pub ahead: f64,
    pub right: f64,
    pub left: f64,
}

/// Read the field at one probe point `range` cells from `position` along
/// `dir`. The offset can span several cells, so the coordinate is reduced
/// with `rem_euclid` before the final wrap.
fn probe(field: &Field, position: [f64; 2], dir: Vec2, range: f64) -> f64 {
    let offset = dir.scaled(range);
    let x = (position[0] + offset.x).rem_euclid(field.cols() as f64);
    let y = (position[1] + offset.y).rem_euclid(field.rows() as f64);
    field.sample_wrapped(y.round() as i64, x.round() as i64)
}

/// Sample the field straight ahead and at the two sensor-angle offsets.
/// Pure read; the right probe uses a clockwise (negative) rotation.
pub(crate) fn sense(
    field: &Field,
    position: [f64; 2],
    heading: Vec2,
    sensor_range: f64,
    sensor_angle: f64,
) -> SenseSample {
    SenseSample {
        ahead: probe(field, position, heading, sensor_range),
        right: probe(field, position, heading.rotated(-sensor_angle), sensor_range),
        left: probe(field, position, heading.rotated(sensor_angle), sensor_range),
    }
}

/// Steering rule on probe values relative to the ahead sample. Returns the
/// signed turn angle: `-wiggle` (right), `+wiggle` (left), or 0. When both
/// sides beat the ahead sample the tie is broken by a coin flip.
pub(crate) fn steer_delta(
    rel_right: f64,
    rel_left: f64,
    wiggle: f64,
    rng: &mut ChaCha12Rng,
) -> f64 {
    match (rel_right > 0.0, rel_left > 0.0) {
        (false, false) => 0.0,
        (true, false) => -wiggle,
        (false, true) => wiggle,
        (true, true) => {
            if rng.random_bool(0.5) {
                -wiggle
            } else {
                wiggle
            }
        }
    }
}

impl World {
    /// Advance the simulation by one tick: emission, diffusion, evaporation,
    /// then the per-agent sense/steer/move pass.
    pub fn step(&mut self) -> StepTimings {
        let total_start = Instant::now();
        self.step_index = self.step_index.saturating_add(1);
        self.moves_last_step = 0;
        self.blocked_last_step = 0;

        let t0 = Instant::now();
        self.emission_phase();
        let emission_us = t0.elapsed().as_micros() as u64;

        let t1 = Instant::now();
        self.field
            .diffuse(self.config.diffusion_rate, self.config.diffusion_mode);
        self.field.evaporate(self.config.evaporation_rate);
        let field_us = t1.elapsed().as_micros() as u64;

        let t2 = Instant::now();
        self.agent_phase();
        let agent_us = t2.elapsed().as_micros() as u64;

        self.total_moves += self.moves_last_step;
        self.total_blocked += self.blocked_last_step;

        StepTimings {
            emission_us,
            field_us,
            agent_us,
            total_us: total_start.elapsed().as_micros() as u64,
        }
    }

    /// Every active agent deposits the emission amount at its current cell.
    fn emission_phase(&mut self) {
        let (rows, cols) = (self.config.rows, self.config.cols);
        let amount = self.config.emission_amount;
        for agent in &self.agents {
            if !agent.active {
                continue;
            }
            let idx = cell_index(agent.position, rows, cols);
            let (row, col) = (idx / cols, idx % cols);
            self.field.add(row, col, amount);
        }
    }

    /// Visit every agent exactly once: sense, steer, then move-or-reroll.
    /// Field writes from earlier agents are visible to later ones within the
    /// same tick; that ordering is part of the model's semantics.
    fn agent_phase(&mut self) {
        let n = self.agents.len();
        self.visit_buf.clear();
        self.visit_buf.extend(0..n);
        if self.config.visit_order == VisitOrder::Shuffled {
            self.visit_buf.shuffle(&mut self.rng);
        }

        let order = std::mem::take(&mut self.visit_buf);
        for &i in &order {
            if self.agents[i].active {
                self.step_agent(i);
            }
        }
        self.visit_buf = order;
    }

    fn step_agent(&mut self, i: usize) {
        let (rows, cols) = (self.config.rows, self.config.cols);
        let position = self.agents[i].position;
        let heading = self.agents[i].heading;
        let speed = self.agents[i].speed;

        let sample = sense(
            &self.field,
            position,
            heading,
            self.config.sensor_range,
            self.config.sensor_angle,
        );
        self.agents[i].last_sensed = sample.ahead;

        let delta = steer_delta(
            sample.right - sample.ahead,
            sample.left - sample.ahead,
            self.config.wiggle_angle,
            &mut self.rng,
        );
        let heading = if delta != 0.0 {
            heading
                .rotated(delta)
                .normalized()
                .expect("rotating a unit heading preserves a nonzero norm")
        } else {
            heading
        };
        self.agents[i].heading = heading;

        let new_position = [
            (position[0] + heading.x * speed).rem_euclid(cols as f64),
            (position[1] + heading.y * speed).rem_euclid(rows as f64),
        ];
        let cur_idx = cell_index(position, rows, cols);
        let dest_idx = cell_index(new_position, rows, cols);

        // The moving agent itself accounts for one occupant of its current
        // cell; only other active agents block the move.
        let occupied_by_other = if dest_idx == cur_idx {
            self.occupancy[dest_idx] > 1
        } else {
            self.occupancy[dest_idx] > 0
        };
        if occupied_by_other {
            // Blocked: stay put and reroll the heading over the full circle.
            self.agents[i].heading = Vec2::from_angle(self.rng.random::<f64>() * TAU);
            self.blocked_last_step += 1;
            return;
        }

        if dest_idx != cur_idx {
            self.occupancy[cur_idx] -= 1;
            self.occupancy[dest_idx] += 1;
        }
        self.agents[i].position = new_position;
        let (row, col) = (dest_idx / cols, dest_idx % cols);
        self.field.add(row, col, self.config.emission_amount);
        self.moves_last_step += 1;
    }
}
