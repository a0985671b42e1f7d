//! Nether Scope - vector display player
//!
//! Drives an oscilloscope in X/Y mode from the sound card: x on the left
//! channel, y on the right.
//!
//! # Usage
//!
//! ```bash
//! nether-scope demo cube
//! nether-scope demo star --seconds 10
//! nether-scope play frames.bin
//! cat /dev/ttyUSB0 | nether-scope play -
//! nether-scope dump square --cycles 4 --out square.raw
//! nether-scope config --save
//! ```

mod audio;
mod config;
mod scenes;

use std::fs::File;
use std::io::{BufWriter, Read};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use nether_vector::{
    DoubleBuffer, PlanOptions, Renderer, VectorDisplay, WireDecoder, WireEvent, WriterSink,
    ring_sink,
};

use audio::AudioOutput;
use config::Config;
use scenes::Scene;

#[derive(Parser)]
#[command(name = "nether-scope")]
#[command(author, version, about = "Nether Scope - draw vectors on an oscilloscope")]
struct Args {
    /// Config file to use instead of the one in the config directory
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a built-in scene to the audio device
    Demo {
        #[arg(value_enum)]
        scene: Scene,

        /// Stop after this many seconds (default: run until interrupted)
        #[arg(long, short = 's')]
        seconds: Option<f32>,

        /// Frames published per second
        #[arg(long, default_value = "60")]
        fps: u32,
    },
    /// Play a vertex wire stream from a file, or `-` for stdin
    Play {
        input: PathBuf,

        /// Keep showing the last frame this long after the stream ends
        #[arg(long, default_value = "2")]
        linger: f32,
    },
    /// Render a scene without a device, writing raw little-endian samples
    Dump {
        #[arg(value_enum)]
        scene: Scene,

        /// Render cycles to write
        #[arg(long, default_value = "1")]
        cycles: u64,

        /// Scene time in seconds
        #[arg(long, default_value = "0")]
        time: f32,

        /// Output file
        #[arg(long, short = 'o')]
        out: PathBuf,
    },
    /// Print the effective configuration
    Config {
        /// Write it to the config directory
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => config::load_from(path)?,
        None => config::load(),
    };
    config.validate().context("Invalid configuration")?;

    match args.command {
        Command::Demo {
            scene,
            seconds,
            fps,
        } => run_demo(&config, scene, seconds, fps),
        Command::Play { input, linger } => run_play(&config, &input, linger),
        Command::Dump {
            scene,
            cycles,
            time,
            out,
        } => run_dump(&config, scene, cycles, time, &out),
        Command::Config { save } => {
            print!("{}", toml::to_string_pretty(&config)?);
            if save {
                let path = config::save(&config)?;
                info!("Configuration saved to {}", path.display());
            }
            Ok(())
        }
    }
}

/// Start a display streaming into the sound card
fn start_display(config: &Config) -> Result<(VectorDisplay, AudioOutput)> {
    let (sink, source) = ring_sink(config.output.ring_capacity);
    let output = AudioOutput::new(source, &config.output)?;
    info!(
        "Audio output started at {}Hz ({} channels)",
        output.sample_rate(),
        output.channels()
    );

    let mut display = VectorDisplay::new(config.display.clone());
    display.begin(sink)?;
    Ok((display, output))
}

fn run_demo(config: &Config, scene: Scene, seconds: Option<f32>, fps: u32) -> Result<()> {
    let (mut display, output) = start_display(config)?;
    let options = PlanOptions::default();
    let frame_time = Duration::from_secs_f32(1.0 / fps.max(1) as f32);
    let started = Instant::now();

    info!("Playing {:?} at {} fps", scene, fps);
    loop {
        let frame_start = Instant::now();
        let t = started.elapsed().as_secs_f32();
        if seconds.is_some_and(|limit| t >= limit) {
            break;
        }
        if !display.is_running() {
            bail!("Renderer stopped unexpectedly");
        }

        display.add_vertices(&scene.vertices(t, &options));
        display.display();

        if let Some(rest) = frame_time.checked_sub(frame_start.elapsed()) {
            thread::sleep(rest);
        }
    }

    // Read before the tracing macros, which shadow `display` with `tracing::field::display`
    let dropped = display.dropped();
    let cycles = display.cycles();
    if dropped > 0 {
        warn!("{} vertices did not fit the display buffer", dropped);
    }
    info!(
        "Stopped after {} render cycles, {} underrun frames",
        cycles,
        output.underruns()
    );
    display.end();
    Ok(())
}

fn run_play(config: &Config, input: &Path, linger: f32) -> Result<()> {
    let mut reader: Box<dyn Read> = if input == Path::new("-") {
        Box::new(std::io::stdin().lock())
    } else {
        Box::new(
            File::open(input).with_context(|| format!("Failed to open {}", input.display()))?,
        )
    };

    let (mut display, _output) = start_display(config)?;
    let mut decoder = WireDecoder::new();
    let mut chunk = [0u8; 4096];
    let mut frames = 0u64;

    loop {
        let n = reader.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        for event in decoder.push(&chunk[..n]) {
            match event {
                WireEvent::Vertex(vertex) => display.add_vertex(vertex),
                WireEvent::EndFrame => {
                    display.display();
                    frames += 1;
                }
            }
        }
        if !display.is_running() {
            bail!("Renderer stopped unexpectedly");
        }
    }

    if decoder.unknown() > 0 {
        warn!("Skipped {} unrecognised words", decoder.unknown());
    }
    info!("Stream ended after {} frames", frames);

    thread::sleep(Duration::from_secs_f32(linger.max(0.0)));
    display.end();
    Ok(())
}

fn run_dump(config: &Config, scene: Scene, cycles: u64, time: f32, out: &Path) -> Result<()> {
    let (buffers, mut back) = DoubleBuffer::new(config.display.max_points);
    back.set_replay_fill(config.display.replay_fill);
    back.extend(&scene.vertices(time, &PlanOptions::default()));
    back.publish();

    let file = File::create(out).with_context(|| format!("Failed to create {}", out.display()))?;
    let sink = WriterSink::new(BufWriter::new(file));
    let mut renderer = Renderer::new(buffers, sink, &config.display);

    let mut samples = 0;
    for _ in 0..cycles {
        samples += renderer.run_cycle()?;
    }

    let mut writer = renderer.into_sink().into_inner();
    std::io::Write::flush(&mut writer)?;

    info!("Wrote {} samples ({} cycles) to {}", samples, cycles, out.display());
    Ok(())
}
