//! # Sparse Voxel Engine Demo
//!
//! Runs the whole pipeline headless: load a config, generate terrain, mesh everything around
//! the origin in the background, draw once and dig a hole with a ray cast.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release -- engine.json
//! ```
//!
//! Without an argument the built-in defaults are used.

use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use cgmath::{Point3, Vector3};
use log::{error, info};
use web_time::Instant;

use sparse_voxel_engine::engine_state::{
    buffer_state::HeadlessBufferState, config::EngineConfig, EngineState,
};

fn drain(engine: &mut EngineState) {
    while engine.pending_meshing_jobs() > 0 {
        if !engine.tick() {
            thread::sleep(Duration::from_millis(1));
        }
    }
}

fn main() -> ExitCode {
    sparse_voxel_engine::init_logger();

    let config = match std::env::args().nth(1) {
        Some(path) => match EngineConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                error!("{err}");
                return ExitCode::FAILURE;
            }
        },
        None => EngineConfig::default(),
    };

    let mut engine = EngineState::new(config, HeadlessBufferState::new());

    let stats = engine.generate_world();
    info!(
        "Generated {} super-chunks, {} voxels",
        stats.chunks_created, stats.nodes_added
    );

    let start = Instant::now();
    let jobs = engine.schedule_visible_chunks();
    drain(&mut engine);
    info!("Meshed {} sub-chunks in {:?}", jobs, start.elapsed());

    let draws = engine.render();
    info!(
        "Rendered {} sub-chunks, {} bytes of mesh data",
        draws,
        engine.backend().get_total_used_memory()
    );

    let origin = Vector3::new(0.5, 255.5, 0.5);
    match engine.cast_ray(origin, Vector3::new(0.0, -1.0, 0.0)) {
        Some(hit) => {
            let Point3 { x, y, z } = hit.voxel;
            info!("Ray hit voxel ({x}, {y}, {z}) on side {:?}", hit.side);
            engine.remove_voxel(x, y, z);
            let jobs = engine.schedule_visible_chunks();
            drain(&mut engine);
            info!("Re-meshed {} sub-chunk(s) after removal", jobs);
        }
        None => info!("Ray from {:?} hit nothing", origin),
    }

    ExitCode::SUCCESS
}
