//! Rewind demo: turntable characters shot at by a catch-up projectile
//!
//! Characters spin on turntables while their poses are recorded. After a
//! while a projectile fired `CATCH_UP_TIME` seconds ago is replayed in fixed
//! steps up to the present, once with cached casts and once with committed
//! rewinds, and both paths are timed.

use lag_compensation::debug::{collection_lines, RewindDebugColors};
use lag_compensation::foundation::logging;
use lag_compensation::foundation::math::constants::TAU;
use lag_compensation::prelude::*;
use rand::Rng;
use std::rc::Rc;

// Scene configuration
const NUM_TURNTABLES: usize = 3;
const CHARACTERS_PER_TURNTABLE: usize = 2;
const TURNTABLE_SPEED: f32 = 0.1; // Rotations per second
const CHARACTER_OFFSET: f32 = 1.5; // Distance from the turntable pivot
const FRAME_DELTA: f64 = 1.0 / 60.0;

// Projectile test configuration
const CHECK_AFTER_SECONDS: f64 = 0.5;
const CATCH_UP_TIME: f64 = 0.3;
const LOOP_COUNT: usize = 10;
const RAYCAST_UPDATE_INTERVAL: f64 = 0.02;
const PROJECTILE_SPEED: f32 = 100.0;

#[derive(thiserror::Error, Debug)]
enum DemoError {
    #[error(transparent)]
    Lag(#[from] LagCompensationError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("catch-up time {catch_up}s exceeds the recorded {recorded}s")]
    CatchUpTooLong { catch_up: f64, recorded: f64 },
}

/// A character placed on a spinning turntable
struct TurntableCharacter {
    handle: CollectionHandle,
    pivot: Vec3,
    offset: Vec3,
}

impl TurntableCharacter {
    fn pose_at(&self, time: f64) -> TransformSample {
        turntable_pose(self.pivot, self.offset, time)
    }
}

/// Pose of a character `offset` from `pivot` once the turntable has spun for `time`
fn turntable_pose(pivot: Vec3, offset: Vec3, time: f64) -> TransformSample {
    let angle = TAU * TURNTABLE_SPEED * time as f32;
    let rotation = Quat::from_axis_angle(&Vec3::y_axis(), angle);
    TransformSample::new(pivot + rotation * offset, rotation)
}

/// Body capsule, head, arm box and a flat shield mesh around `pose`
fn build_character(pose: TransformSample) -> Result<ColliderCollection, LagCompensationError> {
    let part = |local: Vec3| TransformSample::new(pose.transform_point(&local), pose.rotation);

    let shield = TriangleMesh::from_indexed(
        vec![
            Vec3::new(0.0, -0.4, -0.3),
            Vec3::new(0.0, 0.4, -0.3),
            Vec3::new(0.0, 0.4, 0.3),
            Vec3::new(0.0, -0.4, 0.3),
        ],
        vec![0, 1, 2, 0, 2, 3],
    )?;

    let mut character = ColliderCollection::new(0.0, pose);
    character.add_collider(Collider::new(Shape::capsule(0.35, 1.8)?, pose));
    character.add_collider(Collider::new(Shape::sphere(0.2)?, part(Vec3::new(0.0, 1.1, 0.0))));
    character.add_collider(Collider::new(
        Shape::cuboid(Vec3::new(0.1, 0.3, 0.1))?,
        part(Vec3::new(0.5, 0.4, 0.0)),
    ));
    character.add_collider(Collider::new(Shape::mesh(shield), part(Vec3::new(-0.5, 0.3, 0.0))));
    character.add_collider(Collider::new(Shape::cylinder(0.08, 0.6)?, part(Vec3::new(0.5, -0.1, 0.0))));
    character.set_bounding_radius(character.required_bounding_radius());
    Ok(character)
}

fn spawn_characters(system: &mut ColliderCastSystem) -> Result<Vec<TurntableCharacter>, LagCompensationError> {
    let mut rng = rand::thread_rng();
    let mut characters = Vec::new();

    for i in 0..NUM_TURNTABLES {
        let pivot = Vec3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-0.5..0.5),
            8.0 + i as f32 * 8.0 + rng.gen_range(-1.0..1.0),
        );
        for j in 0..CHARACTERS_PER_TURNTABLE {
            let angle = TAU * j as f32 / CHARACTERS_PER_TURNTABLE as f32;
            let offset = Vec3::new(angle.cos(), 0.0, angle.sin()) * CHARACTER_OFFSET;
            let handle = system.register(build_character(turntable_pose(pivot, offset, 0.0))?)?;
            characters.push(TurntableCharacter { handle, pivot, offset });
        }
    }

    log::info!("Spawned {} characters on {} turntables", characters.len(), NUM_TURNTABLES);
    Ok(characters)
}

/// Advance the scene frame by frame, recording whenever the store interval allows
fn run_scene(
    system: &mut ColliderCastSystem,
    clock: &ManualClock,
    characters: &[TurntableCharacter],
    duration: f64,
) -> Result<usize, LagCompensationError> {
    let mut recorded = 0;
    let mut time = 0.0;
    while time < duration {
        time += FRAME_DELTA;
        clock.set(time);
        for character in characters {
            if let Some(collection) = system.get_mut(character.handle) {
                collection.set_pose_rigid(character.pose_at(time));
            }
        }
        if system.record_frame_if_due(time)? {
            recorded += 1;
        }
    }
    Ok(recorded)
}

/// Start point of the projectile segment for step `iteration`
fn projectile_segment(iteration: usize) -> (Vec3, f32) {
    let step = PROJECTILE_SPEED * RAYCAST_UPDATE_INTERVAL as f32;
    (Vec3::z() * (iteration as f32 * step), step)
}

/// Replay the projectile with cached casts; returns the step that hit, if any
fn catch_up_cached(system: &mut ColliderCastSystem, shot_time: f64, now: f64, debug_draw: bool) -> Option<usize> {
    let mut simulation_time = shot_time;
    let mut iteration = 0;
    let mut first_hit = None;

    while simulation_time < now {
        system.simulate(simulation_time);
        if debug_draw && iteration == 0 {
            let colors = RewindDebugColors::default();
            let lines: usize = system
                .iter()
                .map(|(_, collection)| collection_lines(collection, PoseSource::Cached, &colors).len())
                .sum();
            log::debug!("Cached debug geometry at step {}: {} lines", iteration, lines);
        }

        let (start, distance) = projectile_segment(iteration);
        if let Some((hit, handle, child)) = system.raycast_cached(simulation_time, start, Vec3::z(), distance, &[]) {
            if debug_draw {
                log::info!(
                    "Cached hit at step {}: {:?} child {} at {:?}",
                    iteration,
                    handle,
                    child,
                    hit.entry_point
                );
            }
            first_hit.get_or_insert(iteration);
        }

        simulation_time += RAYCAST_UPDATE_INTERVAL;
        iteration += 1;
    }

    system.simulate_reset();
    first_hit
}

/// Replay the projectile with committed rewinds and live casts
fn catch_up_rewound(
    system: &mut ColliderCastSystem,
    shot_time: f64,
    now: f64,
    debug_draw: bool,
) -> Result<Option<usize>, LagCompensationError> {
    let mut simulation_time = shot_time;
    let mut iteration = 0;
    let mut first_hit = None;

    while simulation_time < now {
        let (start, distance) = projectile_segment(iteration);
        let hit = system.with_rewind(simulation_time, |system| {
            let committed = system.raycast_prepare(start, Vec3::z(), distance, &[])?;
            if debug_draw && committed > 0 {
                log::debug!("Step {} rewound {} collections", iteration, committed);
            }
            Ok::<_, LagCompensationError>(system.raycast_live(start, Vec3::z(), distance, &[]))
        })??;

        if let Some((hit, handle, child)) = hit {
            if debug_draw {
                log::info!(
                    "Rewound hit at step {}: {:?} child {} at {:?}",
                    iteration,
                    handle,
                    child,
                    hit.entry_point
                );
            }
            first_hit.get_or_insert(iteration);
        }

        simulation_time += RAYCAST_UPDATE_INTERVAL;
        iteration += 1;
    }
    Ok(first_hit)
}

fn run() -> Result<(), DemoError> {
    let config = match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading configuration from {}", path);
            LagCompensationConfig::load_from_file(&path)?
        }
        None => LagCompensationConfig::default(),
    };
    if CATCH_UP_TIME > CHECK_AFTER_SECONDS {
        return Err(DemoError::CatchUpTooLong {
            catch_up: CATCH_UP_TIME,
            recorded: CHECK_AFTER_SECONDS,
        });
    }

    let clock = Rc::new(ManualClock::new(0.0));
    let mut system = ColliderCastSystem::init(config, Box::new(Rc::clone(&clock)))?;
    let characters = spawn_characters(&mut system)?;

    let frames = run_scene(&mut system, &clock, &characters, CHECK_AFTER_SECONDS)?;
    log::info!("Recorded {} frames over {:.2}s", frames, CHECK_AFTER_SECONDS);

    let now = system.now();
    let shot_time = now - CATCH_UP_TIME;

    let cached = catch_up_cached(&mut system, shot_time, now, true);
    let rewound = catch_up_rewound(&mut system, shot_time, now, true)?;
    if cached != rewound {
        log::warn!("Cached and rewound casts disagree: {:?} vs {:?}", cached, rewound);
    }

    let mut cached_timer = Stopwatch::start_new();
    for _ in 0..LOOP_COUNT {
        catch_up_cached(&mut system, shot_time, now, false);
        cached_timer.lap();
    }

    let mut rewound_timer = Stopwatch::start_new();
    for _ in 0..LOOP_COUNT {
        catch_up_rewound(&mut system, shot_time, now, false)?;
        rewound_timer.lap();
    }

    log::info!(
        "Summed time cached: {:?} ({:?} per replay)",
        cached_timer.total(),
        cached_timer.mean()
    );
    log::info!(
        "Summed time rewound: {:?} ({:?} per replay)",
        rewound_timer.total(),
        rewound_timer.mean()
    );

    let remaining = system.shutdown();
    log::info!("Released {} collections", remaining.len());
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    log::info!("Starting rewind demo");

    match run() {
        Ok(()) => {
            log::info!("Rewind demo completed successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Rewind demo failed: {}", e);
            Err(e.into())
        }
    }
}
