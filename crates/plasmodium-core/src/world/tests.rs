use super::*;
use crate::config::VisitOrder;
use crate::grid::DiffusionMode;
use crate::vec2::UNIT_TOLERANCE;
use std::f64::consts::FRAC_PI_6;

fn make_config(rows: usize, cols: usize, num_agents: usize) -> SimConfig {
    SimConfig {
        rows,
        cols,
        num_agents,
        diffusion_rate: 0.0,
        evaporation_rate: 0.0,
        emission_amount: 2.0,
        sensor_range: 3.0,
        ..SimConfig::default()
    }
}

fn single_agent_world(position: [f64; 2], heading: Vec2, config: SimConfig) -> World {
    let agents = vec![Agent::new(0, position, heading, config.agent_speed)];
    World::try_new(agents, config).unwrap()
}

#[test]
fn try_new_rejects_invalid_grid() {
    let config = make_config(0, 10, 1);
    assert!(matches!(
        World::try_new(vec![Agent::new(0, [0.0, 0.0], Vec2::new(1.0, 0.0), 1.0)], config),
        Err(WorldInitError::Config(SimConfigError::InvalidGridSize))
    ));
}

#[test]
fn try_new_rejects_agent_count_mismatch() {
    let config = make_config(10, 10, 2);
    let agents = vec![Agent::new(0, [0.0, 0.0], Vec2::new(1.0, 0.0), 1.0)];
    assert!(matches!(
        World::try_new(agents, config),
        Err(WorldInitError::AgentCountMismatch {
            expected: 2,
            actual: 1
        })
    ));
}

#[test]
fn try_new_rejects_duplicate_agent_ids() {
    let config = make_config(10, 10, 2);
    let agents = vec![
        Agent::new(7, [0.0, 0.0], Vec2::new(1.0, 0.0), 1.0),
        Agent::new(7, [3.0, 3.0], Vec2::new(0.0, 1.0), 1.0),
    ];
    assert!(matches!(
        World::try_new(agents, config),
        Err(WorldInitError::DuplicateAgentId { id: 7 })
    ));
}

#[test]
fn try_new_rejects_non_unit_heading() {
    let config = make_config(10, 10, 1);
    let agents = vec![Agent::new(0, [0.0, 0.0], Vec2::new(2.0, 0.0), 1.0)];
    assert!(matches!(
        World::try_new(agents, config),
        Err(WorldInitError::NonUnitHeading { id: 0 })
    ));
}

#[test]
fn try_new_rejects_out_of_world_position() {
    let config = make_config(10, 10, 1);
    let agents = vec![Agent::new(0, [10.0, 0.0], Vec2::new(1.0, 0.0), 1.0)];
    assert!(matches!(
        World::try_new(agents, config),
        Err(WorldInitError::AgentOutOfBounds { id: 0 })
    ));
}

#[test]
fn try_new_rejects_non_positive_speed() {
    let config = make_config(10, 10, 1);
    let agents = vec![Agent::new(0, [0.0, 0.0], Vec2::new(1.0, 0.0), 0.0)];
    assert!(matches!(
        World::try_new(agents, config),
        Err(WorldInitError::NonPositiveSpeed { id: 0 })
    ));
}

#[test]
fn agent_moves_to_empty_cell_and_deposits() {
    let config = make_config(5, 5, 1);
    let mut world = single_agent_world([0.0, 0.0], Vec2::new(1.0, 0.0), config);
    world.step();

    let agent = &world.agents[0];
    assert!((agent.position[0] - 1.0).abs() < 1e-12);
    assert!(agent.position[1].abs() < 1e-12);
    // Emission at the start cell plus the deposit at the destination cell.
    assert!((world.field().get(0, 0) - 2.0).abs() < 1e-12);
    assert!((world.field().get(0, 1) - 2.0).abs() < 1e-12);
    assert_eq!(world.moves_last_step, 1);
    assert_eq!(world.blocked_last_step, 0);
    assert!(world.is_cell_occupied(0, 1));
    assert!(!world.is_cell_occupied(0, 0));
}

#[test]
fn blocked_agent_stays_and_rerolls_heading() {
    let config = make_config(5, 5, 2);
    let agents = vec![
        Agent::new(0, [0.0, 0.0], Vec2::new(1.0, 0.0), 1.0),
        Agent::new(1, [1.0, 0.0], Vec2::new(1.0, 0.0), 1.0),
    ];
    let mut world = World::try_new(agents, config).unwrap();
    world.step();

    // Agent 0 is visited first and finds agent 1's cell occupied.
    let blocked = &world.agents[0];
    assert!(blocked.position[0].abs() < 1e-12);
    assert!(blocked.position[1].abs() < 1e-12);
    assert!((blocked.heading.norm() - 1.0).abs() <= UNIT_TOLERANCE);
    assert_eq!(world.blocked_last_step, 1);
    assert_eq!(world.moves_last_step, 1);
    // Agent 1 vacated its cell, so agent 0 can take it next tick.
    let moved = &world.agents[1];
    assert!((moved.position[0] - 2.0).abs() < 1e-12);
}

#[test]
fn stronger_left_probe_turns_heading_left() {
    let config = make_config(10, 10, 1);
    let mut world = single_agent_world([5.0, 5.0], Vec2::new(1.0, 0.0), config);
    // Left probe of a +x heading with 45-degree sensors and range 3 lands on
    // cell (7, 7).
    world.field.set(7, 7, 50.0);
    world.step();

    let expected = Vec2::from_angle(FRAC_PI_6);
    let heading = world.agents[0].heading;
    assert!((heading.x - expected.x).abs() < 1e-9);
    assert!((heading.y - expected.y).abs() < 1e-9);
}

#[test]
fn stronger_right_probe_turns_heading_right() {
    let config = make_config(10, 10, 1);
    let mut world = single_agent_world([5.0, 5.0], Vec2::new(1.0, 0.0), config);
    world.field.set(3, 7, 50.0);
    world.step();

    let expected = Vec2::from_angle(-FRAC_PI_6);
    let heading = world.agents[0].heading;
    assert!((heading.x - expected.x).abs() < 1e-9);
    assert!((heading.y - expected.y).abs() < 1e-9);
}

#[test]
fn weaker_side_probes_leave_heading_unchanged() {
    let config = make_config(10, 10, 1);
    let mut world = single_agent_world([5.0, 5.0], Vec2::new(1.0, 0.0), config);
    // Ahead probe cell (5, 8) beats both side probes.
    world.field.set(5, 8, 50.0);
    world.field.set(7, 7, 10.0);
    world.field.set(3, 7, 10.0);
    world.step();

    let heading = world.agents[0].heading;
    assert!((heading.x - 1.0).abs() < 1e-12);
    assert!(heading.y.abs() < 1e-12);
    assert!((world.agents[0].last_sensed - 50.0).abs() < 1e-12);
}

#[test]
fn equal_side_excess_turns_each_way_about_half_the_time() {
    use super::step::steer_delta;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    let mut rng = ChaCha12Rng::seed_from_u64(1234);
    let trials = 10_000;
    let mut lefts = 0usize;
    for _ in 0..trials {
        let delta = steer_delta(1.0, 1.0, FRAC_PI_6, &mut rng);
        assert!(delta != 0.0);
        if delta > 0.0 {
            lefts += 1;
        }
    }
    let fraction = lefts as f64 / trials as f64;
    assert!(
        (0.47..=0.53).contains(&fraction),
        "left fraction {fraction} outside tolerance"
    );
}

#[test]
fn every_active_agent_is_resolved_each_tick() {
    let mut config = make_config(32, 32, 64);
    config.visit_order = VisitOrder::Shuffled;
    let mut world = World::from_config(config).unwrap();
    for _ in 0..10 {
        world.step();
        assert_eq!(
            world.moves_last_step + world.blocked_last_step,
            world.active_count()
        );
    }
}

#[test]
fn positions_stay_in_world_bounds() {
    let config = SimConfig {
        rows: 16,
        cols: 24,
        num_agents: 50,
        ..SimConfig::default()
    };
    let mut world = World::from_config(config).unwrap();
    for _ in 0..50 {
        world.step();
    }
    for agent in world.agents() {
        assert!((0.0..24.0).contains(&agent.position[0]));
        assert!((0.0..16.0).contains(&agent.position[1]));
    }
}

#[test]
fn identical_seeds_replay_identically() {
    let config = SimConfig {
        rows: 32,
        cols: 32,
        num_agents: 40,
        visit_order: VisitOrder::Shuffled,
        ..SimConfig::default()
    };
    let mut a = World::from_config(config.clone()).unwrap();
    let mut b = World::from_config(config).unwrap();
    for _ in 0..20 {
        a.step();
        b.step();
    }
    for (x, y) in a.agents().iter().zip(b.agents()) {
        assert_eq!(x.position, y.position);
        assert_eq!(x.heading, y.heading);
    }
    assert_eq!(a.field().values(), b.field().values());
}

#[test]
fn evaporation_drains_field_mass_without_emission() {
    let mut config = make_config(8, 8, 1);
    config.emission_amount = 0.0;
    config.diffusion_rate = 0.5;
    config.evaporation_rate = 0.1;
    let mut world = single_agent_world([4.0, 4.0], Vec2::new(1.0, 0.0), config);
    world.field.set(2, 2, 100.0);
    world.step();
    // Diffusion conserves mass; evaporation then removes 10%.
    assert!((world.field().total() - 90.0).abs() < 1e-9);
}

#[test]
fn in_place_diffusion_mode_is_selectable() {
    let mut config = make_config(10, 10, 1);
    config.emission_amount = 0.0;
    config.diffusion_rate = 0.4;
    config.diffusion_mode = DiffusionMode::InPlaceSequential;
    let mut world = single_agent_world([0.0, 0.0], Vec2::new(1.0, 0.0), config);
    world.field.set(5, 5, 100.0);
    world.step();
    // The sequential traversal feeds part of the outflow back to the source.
    assert!(world.field().get(5, 5) > 60.0);
}

#[test]
fn try_run_experiment_rejects_zero_sample_every() {
    let mut world = World::from_config(make_config(8, 8, 4)).unwrap();
    assert!(matches!(
        world.try_run_experiment(10, 0),
        Err(ExperimentError::InvalidSampleEvery)
    ));
}

#[test]
fn try_run_experiment_rejects_excessive_steps() {
    let mut world = World::from_config(make_config(8, 8, 4)).unwrap();
    assert!(matches!(
        world.try_run_experiment(World::MAX_EXPERIMENT_STEPS + 1, 1),
        Err(ExperimentError::TooManySteps { .. })
    ));
}

#[test]
fn run_experiment_samples_at_requested_cadence() {
    let mut world = World::from_config(make_config(16, 16, 8)).unwrap();
    let summary = world.try_run_experiment(10, 3).unwrap();
    assert_eq!(summary.schema_version, 1);
    assert_eq!(summary.steps, 10);
    // Steps 3, 6, 9 plus the final step 10.
    let sampled: Vec<usize> = summary.samples.iter().map(|m| m.step).collect();
    assert_eq!(sampled, vec![3, 6, 9, 10]);
    assert_eq!(summary.total_moves + summary.total_blocked, 8 * 10);
}

#[test]
fn step_returns_nonzero_timings() {
    let mut world = World::from_config(make_config(32, 32, 16)).unwrap();
    let t = world.step();
    assert!(t.total_us > 0);
}
