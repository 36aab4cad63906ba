//! Headless runner: drives a preset through a fixed number of frames and logs
//! what a renderer would have uploaded.

use clap::Parser;
use evergreen::prelude::*;
use evergreen::{FoliageVertex, InstanceRaw, LightRaw, PresetError};
use log::info;

#[derive(Parser, Debug, Clone)]
#[command(name = "evergreen")]
#[command(about = "Assembling Christmas tree simulation", long_about = None)]
struct Cli {
    /// Built-in preset (`grand` or `tap`)
    #[arg(long, default_value = "grand")]
    preset: String,

    /// Load the preset from a JSON file instead
    #[arg(long)]
    preset_file: Option<std::path::PathBuf>,

    /// Number of frames to simulate
    #[arg(long, default_value_t = 600)]
    frames: u64,

    /// Simulated frame rate
    #[arg(long, default_value_t = 60.0)]
    fps: f32,

    /// Seed for a reproducible scene
    #[arg(long)]
    seed: Option<u64>,

    /// Sweep a simulated pointer across the tree once it is assembled
    #[arg(long, default_value = "false")]
    sweep: bool,
}

/// Stands in for a GPU renderer: tallies the bytes each frame would upload.
#[derive(Debug, Default)]
struct LogAdapter {
    frames: u64,
    bytes: usize,
}

impl RenderAdapter for LogAdapter {
    fn draw(&mut self, snapshot: &RenderSnapshot<'_>) {
        let mut bytes = bytemuck::bytes_of(&snapshot.foliage.uniforms).len();
        if self.frames == 0 {
            bytes += bytemuck::cast_slice::<FoliageVertex, u8>(snapshot.foliage.vertices).len();
        }
        if self.frames == 0 || snapshot.foliage.slots_dirty {
            bytes += std::mem::size_of_val(snapshot.foliage.slots);
        }
        for batch in &snapshot.ornaments {
            bytes += bytemuck::cast_slice::<InstanceRaw, u8>(batch.instances).len();
        }
        bytes += bytemuck::cast_slice::<InstanceRaw, u8>(snapshot.bows).len();
        bytes += bytemuck::cast_slice::<LightRaw, u8>(snapshot.star_lights).len();

        self.frames += 1;
        self.bytes += bytes;
    }
}

fn main() -> Result<(), PresetError> {
    env_logger::init();
    let cli = Cli::parse();

    let preset = match &cli.preset_file {
        Some(path) => VisualPreset::load(path)?,
        None => VisualPreset::by_name(&cli.preset)?,
    };
    let preset = match cli.seed {
        Some(seed) => preset.with_seed(Some(seed)),
        None => preset,
    };

    let mut scene = TreeScene::new(&preset)?;
    let mut clock = FrameClock::fixed(1.0 / cli.fps.max(1.0));
    let mut input = Input::new();
    let mut adapter = LogAdapter::default();

    let viewport = Vec2::new(1280.0, 720.0);
    input.set_window_size(viewport.x as u32, viewport.y as u32);

    // tap whatever toggles this preset
    let tap = match preset.toggle.button_rect(viewport) {
        Some((min, max)) => (min + max) * 0.5,
        None => viewport * 0.5,
    };
    input.press(MouseButton::Left, tap);
    input.release(MouseButton::Left, tap);

    let report_every = cli.fps.max(1.0) as u64;
    for frame in 0..cli.frames {
        let (elapsed, delta) = clock.update();

        // a cursor drifting left to right across the middle of the tree
        if cli.sweep && scene.foliage().assembly().progress() > 0.95 {
            let x = (elapsed * 0.4).sin() * 0.5 + 0.5;
            input.move_cursor(Vec2::new(viewport.x * (0.35 + 0.3 * x), viewport.y * 0.55));
        }

        if scene.handle_input(&input) {
            info!("Tree target is now {}", if scene.is_assembled() { "assembled" } else { "scattered" });
        }
        input.begin_frame();

        adapter.draw(&scene.step(elapsed, delta));

        if (frame + 1) % report_every == 0 {
            let stats = scene.stats();
            info!(
                "t={:.1}s progress={:.2} needles in flight={} ornaments in flight={} launched={} faults={}",
                elapsed,
                scene.foliage().assembly().progress(),
                stats.needles_in_flight,
                stats.ornaments_in_flight,
                stats.activated,
                stats.faults
            );
        }
    }

    info!(
        "Simulated {} frames of '{}', {:.1} MiB handed to the renderer",
        adapter.frames,
        scene.name(),
        adapter.bytes as f64 / (1024.0 * 1024.0)
    );
    Ok(())
}
