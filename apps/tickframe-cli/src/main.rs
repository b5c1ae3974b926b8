mod scene;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tickframe_assets::AssetRegistry;
use tickframe_clock::{ManualTime, TickClock};
use tickframe_common::TextureHandle;
use tickframe_driver::{EngineConfig, FrameDriver};
use tickframe_render::{GpuBackend, RecordingGpu, Renderer, register_builtin_shaders};
use tickframe_render_wgpu::WgpuBackend;
use tracing_subscriber::EnvFilter;

use crate::scene::DemoScene;

#[derive(Parser)]
#[command(name = "tickframe-cli", about = "CLI tool for tickframe: clock schedules and headless demo runs")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate versions and the default engine configuration
    Info,
    /// Print how a fixed frame time turns into ticks
    Clock {
        /// Ticks per second
        #[arg(short, long, default_value = "30")]
        tps: u32,
        /// Simulated frame time in milliseconds
        #[arg(short, long, default_value = "16")]
        frame_ms: u64,
        /// Number of frames to run
        #[arg(short = 'n', long, default_value = "20")]
        frames: u32,
    },
    /// Run the demo scene headlessly on a simulated clock
    Simulate {
        /// Number of frames to render
        #[arg(short = 'n', long, default_value = "60")]
        frames: u32,
        /// Simulated frame rate
        #[arg(long, default_value = "60")]
        fps: u32,
        /// Number of bouncing cubes; particles scale with it
        #[arg(short, long, default_value = "100")]
        objects: usize,
        /// Engine config JSON; defaults are used when absent
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// GPU backend to drive
        #[arg(short, long, value_enum, default_value_t = Backend::Recording)]
        backend: Backend,
        /// Seed for the scene layout
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// Record GPU calls in memory and print a summary
    Recording,
    /// Render offscreen through wgpu
    Wgpu,
}

struct RunOptions {
    frames: u32,
    fps: u32,
    objects: usize,
    seed: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match cli.command {
        Commands::Info => {
            println!("tickframe-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", tickframe_common::crate_info());
            println!("clock: {}", tickframe_clock::crate_info());
            println!("assets: {}", tickframe_assets::crate_info());
            println!("render: {}", tickframe_render::crate_info());
            println!("render-wgpu: {}", tickframe_render_wgpu::crate_info());
            println!("driver: {}", tickframe_driver::crate_info());
            println!("default config:");
            println!("{}", serde_json::to_string_pretty(&EngineConfig::default())?);
        }
        Commands::Clock {
            tps,
            frame_ms,
            frames,
        } => {
            println!("Tick schedule: tps={tps}, frame={frame_ms}ms, frames={frames}");
            let time = ManualTime::new();
            let mut clock = TickClock::new(tps, time.clone())?;
            let mut total = 0u64;
            for frame in 1..=frames {
                time.advance_millis(frame_ms);
                clock.update();
                total += u64::from(clock.ticks_elapsed());
                println!(
                    "frame {frame:>4}: ticks={} total={total:>5} lerp={:.3} fps={:.1}",
                    clock.ticks_elapsed(),
                    clock.interpolation_factor(),
                    clock.fps()
                );
            }
        }
        Commands::Simulate {
            frames,
            fps,
            objects,
            config,
            backend,
            seed,
        } => {
            let config = match config {
                Some(path) => EngineConfig::load(&path)?,
                None => EngineConfig::default(),
            };
            let opts = RunOptions {
                frames,
                fps,
                objects,
                seed,
            };
            println!(
                "Simulating {frames} frames at {fps} fps, {} tps, {objects} objects",
                config.clock.ticks_per_second
            );

            match backend {
                Backend::Recording => {
                    let renderer =
                        simulate(RecordingGpu::new(), &config, &opts, |_, _| Ok(()), |_| Ok(()))?;
                    print!("{}", renderer.gpu().summary());
                    let gpu = renderer.shutdown();
                    println!("After shutdown: {} live buffer sets", gpu.live_sets());
                }
                Backend::Wgpu => {
                    let gpu = WgpuBackend::headless(config.projection.width, config.projection.height)?;
                    let renderer = simulate(
                        gpu,
                        &config,
                        &opts,
                        |r, sprite| {
                            let (w, h, pixels) = checker_pixels(SPRITE_TEXTURE_SIZE);
                            r.gpu_mut().upload_texture(sprite, w, h, &pixels)?;
                            Ok(())
                        },
                        |r| {
                            r.gpu_mut().present_offscreen()?;
                            Ok(())
                        },
                    )?;
                    println!(
                        "wgpu: multi-draw indirect {}",
                        if renderer.gpu().supports_multi_draw() {
                            "enabled"
                        } else {
                            "emulated"
                        }
                    );
                    renderer.shutdown();
                }
            }
        }
    }

    Ok(())
}

const SPRITE_TEXTURE: &str = "demo_sprite_checker";
const SPRITE_TEXTURE_SIZE: u32 = 8;

/// RGBA8 checkerboard of `size` by `size` pixels.
fn checker_pixels(size: u32) -> (u32, u32, Vec<u8>) {
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let shade = if (x + y) % 2 == 0 { 255 } else { 96 };
            pixels.extend_from_slice(&[shade, shade, shade, 255]);
        }
    }
    (size, size, pixels)
}

/// Drive the demo scene for `opts.frames` frames, advancing a manual clock by
/// one frame time after each. `prepare` runs once with the sprite texture
/// handle before the first frame.
fn simulate<G: GpuBackend>(
    gpu: G,
    config: &EngineConfig,
    opts: &RunOptions,
    prepare: impl FnOnce(&mut Renderer<G>, TextureHandle) -> anyhow::Result<()>,
    mut after_frame: impl FnMut(&mut Renderer<G>) -> anyhow::Result<()>,
) -> anyhow::Result<Renderer<G>> {
    let mut assets = AssetRegistry::new();
    register_builtin_shaders(&mut assets)?;
    let sprite = assets.register_texture(SPRITE_TEXTURE, "checker:8")?;
    let mut renderer = Renderer::new(gpu, &assets, config.batching.clone(), config.projection)?;
    prepare(&mut renderer, sprite)?;

    let time = ManualTime::new();
    let mut driver = FrameDriver::from_config(config, time.clone())?;
    let mut scene = DemoScene::new(
        opts.objects,
        config.clock.ticks_per_second,
        opts.seed,
        Some(sprite),
    );
    scene.install_statics(&mut renderer)?;

    let frame_time = Duration::from_secs(1) / opts.fps.max(1);
    for _ in 0..opts.frames {
        time.advance(frame_time);
        let report = driver.run_frame(&mut scene, &mut renderer)?;
        after_frame(&mut renderer)?;
        println!(
            "frame {:>4}: ticks={} total={:>5} lerp={:.3} draws={:>3} fps={:.1}",
            report.frame,
            report.ticks_run,
            report.total_ticks,
            report.lerp_factor,
            report.draw_calls,
            report.fps
        );
    }

    println!(
        "Batches: {}, dropped submissions: {}",
        renderer.batches().batch_count(),
        scene.dropped()
    );
    Ok(renderer)
}
