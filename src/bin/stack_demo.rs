//! Stack Demo - headless physics scene
//!
//! Run with: `cargo run --release --bin stack-demo -- [config.json] [seconds]`
//!
//! Builds a walled floor, a pyramid of boxes, a handful of balls and a
//! kinematic platform sweeping back and forth, then runs the world at a
//! simulated 60 fps and prints what happened. The library only emits
//! `tracing` events; no subscriber is installed here.

use std::env;
use std::time::Instant;

use impulse2d_engine::physics::{Body, BodyId, PhysicsResult, Shape, Vec2};
use impulse2d_engine::render::ShapeInstance;
use impulse2d_engine::world::{PhysicsConfig, PhysicsWorld};

const FRAME_DT: f32 = 1.0 / 60.0;
const DEFAULT_SECONDS: f32 = 10.0;

const ARENA_WIDTH: f32 = 800.0;
const FLOOR_Y: f32 = 580.0;
const BOX_SIZE: f32 = 30.0;
const PYRAMID_BASE: usize = 8;

/// Sweep limits and speed of the kinematic platform
const PLATFORM_MIN_X: f32 = 150.0;
const PLATFORM_MAX_X: f32 = 650.0;
const PLATFORM_SPEED: f32 = 120.0;

/// Everything the demo owns besides the world itself.
struct StackScene {
    world: PhysicsWorld,
    platform: BodyId,
    boxes: Vec<BodyId>,
    balls: Vec<BodyId>,
}

impl StackScene {
    fn new(config: PhysicsConfig) -> PhysicsResult<Self> {
        let mut world = PhysicsWorld::new(config)?;

        // Floor and walls
        world.add_body(Body::new_static(
            Shape::rectangle(ARENA_WIDTH, 40.0),
            Vec2::new(ARENA_WIDTH * 0.5, FLOOR_Y + 20.0),
        ))?;
        for x in [-20.0, ARENA_WIDTH + 20.0] {
            world.add_body(Body::new_static(
                Shape::rectangle(40.0, 600.0),
                Vec2::new(x, FLOOR_Y - 300.0 + 20.0),
            ))?;
        }

        // Box pyramid, centred on the floor
        let mut boxes = Vec::new();
        for row in 0..PYRAMID_BASE {
            let count = PYRAMID_BASE - row;
            let row_width = count as f32 * BOX_SIZE;
            let start_x = ARENA_WIDTH * 0.5 - row_width * 0.5 + BOX_SIZE * 0.5;
            let y = FLOOR_Y - BOX_SIZE * 0.5 - row as f32 * BOX_SIZE;
            for i in 0..count {
                let body = Body::new_dynamic(
                    Shape::rectangle(BOX_SIZE, BOX_SIZE),
                    Vec2::new(start_x + i as f32 * BOX_SIZE, y),
                    1.0,
                )
                .with_friction(0.6)
                .with_restitution(0.1);
                boxes.push(world.add_body(body)?);
            }
        }

        // Balls dropped from above, off to the sides
        let mut balls = Vec::new();
        for i in 0..6 {
            let x = 80.0 + i as f32 * 120.0;
            let body = Body::new_dynamic(Shape::circle(12.0), Vec2::new(x, 60.0), 0.5)
                .with_restitution(0.6)
                .with_velocity(Vec2::new(if i % 2 == 0 { 40.0 } else { -40.0 }, 0.0));
            balls.push(world.add_body(body)?);
        }

        let platform = world.add_body(
            Body::new_kinematic(Shape::rectangle(120.0, 16.0), Vec2::new(PLATFORM_MIN_X, 260.0))
                .with_velocity(Vec2::new(PLATFORM_SPEED, 0.0)),
        )?;

        Ok(Self {
            world,
            platform,
            boxes,
            balls,
        })
    }

    /// Move the kinematic platform, bouncing between its sweep limits.
    fn drive_platform(&mut self, dt: f32) {
        let Some(platform) = self.world.get_body_mut(self.platform) else {
            return;
        };
        platform.integrate_kinematic(dt);
        let x = platform.position().x;
        let vx = platform.velocity().x;
        if (x >= PLATFORM_MAX_X && vx > 0.0) || (x <= PLATFORM_MIN_X && vx < 0.0) {
            platform.set_velocity(Vec2::new(-vx, 0.0));
        }
    }

    fn frame(&mut self, dt: f32) -> PhysicsResult<u32> {
        self.drive_platform(dt);
        self.world.update(dt)
    }

    fn highest_box(&self) -> Option<f32> {
        self.boxes
            .iter()
            .filter_map(|&id| self.world.position(id))
            .map(|p| p.y)
            .reduce(f32::min)
    }
}

fn parse_args() -> PhysicsResult<(PhysicsConfig, f32)> {
    let mut config = PhysicsConfig::default();
    let mut seconds = DEFAULT_SECONDS;

    for arg in env::args().skip(1) {
        if let Ok(value) = arg.parse::<f32>() {
            seconds = value.max(0.0);
        } else {
            config = PhysicsConfig::from_json_file(&arg)?;
            println!("[Config] Loaded {}", arg);
        }
    }
    Ok((config, seconds))
}

fn main() -> PhysicsResult<()> {
    println!("===========================================");
    println!("   impulse2d - Stack Demo (headless)");
    println!("===========================================");
    println!();

    let (config, seconds) = parse_args()?;
    println!(
        "[Config] step {:.4}s, {} velocity / {} position iterations, broad phase {:?}",
        config.physics_time_step,
        config.velocity_iterations,
        config.position_iterations,
        config.broad_phase
    );

    let mut scene = StackScene::new(config)?;
    println!(
        "[Scene] {} bodies ({} boxes, {} balls, 1 platform, 3 static)",
        scene.world.body_count(),
        scene.boxes.len(),
        scene.balls.len()
    );
    if let Some(y) = scene.highest_box() {
        println!("[Scene] Pyramid top at y = {:.1}", y);
    }
    println!();

    let frames = (seconds / FRAME_DT).round() as u32;
    let started = Instant::now();
    let mut total_steps = 0u64;
    let mut peak_contacts = 0;

    for frame in 1..=frames {
        total_steps += u64::from(scene.frame(FRAME_DT)?);
        let stats = scene.world.stats();
        peak_contacts = peak_contacts.max(stats.contacts);

        if frame % 60 == 0 {
            println!(
                "[t={:5.1}s] steps {:5}  pairs {:4}  contacts {:4}  sleeping {:3}/{}",
                frame as f32 * FRAME_DT,
                scene.world.step_count(),
                stats.candidate_pairs,
                stats.contacts,
                stats.sleeping,
                scene.world.body_count()
            );
        }
    }

    let elapsed = started.elapsed();
    let mut instances: Vec<ShapeInstance> = Vec::new();
    scene.world.write_instances(&mut instances)?;

    println!();
    println!("[Done] {} frames, {} physics steps in {:.2?}", frames, total_steps, elapsed);
    if total_steps > 0 {
        println!(
            "[Done] {:.1} us per step",
            elapsed.as_secs_f64() * 1e6 / total_steps as f64
        );
    }
    println!("[Done] Peak contacts in one frame: {}", peak_contacts);
    println!(
        "[Done] Sleeping bodies: {}, instance buffer: {} bytes",
        scene.world.sleeping_count(),
        std::mem::size_of_val(instances.as_slice())
    );
    if let Some(y) = scene.highest_box() {
        println!("[Done] Pyramid top at y = {:.1}", y);
    }
    if let Some(bounds) = scene.world.bounds() {
        println!("[Done] World bounds {} .. {}", bounds.min, bounds.max);
    }
    Ok(())
}
