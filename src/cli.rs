use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::config::SceneConfig;
use crate::driver::{DriverConfig, FrameDriver, FrameResult};
use crate::field::{AmbientField, FieldAnimation, SphereField};
use crate::pose::PoseRecord;
use crate::raster::RasterSurface;
use crate::sequencer::PhaseSequencer;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FieldKind {
    /// Drifting particle background
    Ambient,
    /// Glowing sphere with flowing lines
    Sphere,
}

#[derive(Subcommand)]
enum Commands {
    /// Render field animation frames to disk
    Render {
        /// Which animation to render
        #[arg(long, value_enum, default_value_t = FieldKind::Sphere)]
        field: FieldKind,

        /// Output directory for frames
        #[arg(long)]
        out: PathBuf,

        /// Number of frames to render
        #[arg(long, default_value_t = 120)]
        frames: usize,

        /// Frames per second of the simulated clock
        #[arg(long, default_value_t = 60.0)]
        fps: f64,

        /// Scene config JSON (defaults used when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Dump walk-cycle poses over a time range as JSON
    Pose {
        #[arg(long, default_value_t = 0.0)]
        from_ms: f64,

        #[arg(long, default_value_t = 8000.0)]
        to_ms: f64,

        #[arg(long, default_value_t = 500.0)]
        step_ms: f64,

        /// Scene config JSON (defaults used when omitted)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file (stdout when omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the default scene configuration
    Config,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render { field, out, frames, fps, config } => {
            let config = load_config(config.as_deref())?;
            render_offline(&config, field, &out, frames, fps)?;
        }
        Commands::Pose { from_ms, to_ms, step_ms, config, out } => {
            let config = load_config(config.as_deref())?;
            let json = pose_samples_json(&config, from_ms, to_ms, step_ms)?;
            match out {
                Some(path) => std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write poses to {:?}", path))?,
                None => println!("{}", json),
            }
        }
        Commands::Config => {
            println!("{}", SceneConfig::default().to_json_pretty()?);
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SceneConfig> {
    match path {
        Some(path) => SceneConfig::load(path),
        None => Ok(SceneConfig::default()),
    }
}

fn build_field(config: &SceneConfig, kind: FieldKind) -> FieldAnimation {
    match kind {
        FieldKind::Ambient => FieldAnimation::Ambient(AmbientField::new(&config.ambient, config.seed)),
        FieldKind::Sphere => FieldAnimation::Sphere(SphereField::new(&config.sphere, config.seed)),
    }
}

fn render_offline(config: &SceneConfig, kind: FieldKind, out_dir: &Path, frames: usize, fps: f64) -> Result<()> {
    anyhow::ensure!(fps > 0.0, "fps must be positive, got {}", fps);

    let field = build_field(config, kind);
    let bounds = field.bounds();
    let mut surface = RasterSurface::new(bounds.x.round() as u32, bounds.y.round() as u32)?;

    // The simulated clock already runs at the requested rate
    let mut driver = FrameDriver::new(&DriverConfig { target_fps: 0.0 }).with_field(field);

    std::fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {:?}", out_dir))?;
    println!("Rendering {} frames to {:?}...", frames, out_dir);

    let dt_ms = 1000.0 / fps;
    for i in 0..frames {
        if driver.frame(i as f64 * dt_ms, &mut surface) != FrameResult::Rendered {
            continue;
        }
        surface.save(&out_dir.join(format!("frame_{:05}.png", i)))?;

        if i % 60 == 0 {
            print!(".");
            std::io::stdout().flush()?;
        }
    }
    driver.stop();
    println!("\nDone.");

    Ok(())
}

/// Upper bound on samples written by one `pose` invocation.
const MAX_POSE_SAMPLES: usize = 1_000_000;

fn pose_samples_json(config: &SceneConfig, from_ms: f64, to_ms: f64, step_ms: f64) -> Result<String> {
    anyhow::ensure!(
        from_ms.is_finite() && to_ms.is_finite() && step_ms.is_finite(),
        "time range and step must be finite, got {}..{} step {}",
        from_ms,
        to_ms,
        step_ms
    );
    anyhow::ensure!(step_ms > 0.0, "step must be positive, got {}", step_ms);
    anyhow::ensure!(to_ms >= from_ms, "time range is reversed: {} > {}", from_ms, to_ms);

    // Also rejects a span that overflowed to infinity
    let steps = ((to_ms - from_ms) / step_ms).floor();
    anyhow::ensure!(
        steps < MAX_POSE_SAMPLES as f64,
        "{}..{}ms at {}ms steps exceeds {} samples",
        from_ms,
        to_ms,
        step_ms,
        MAX_POSE_SAMPLES
    );
    let count = steps as usize + 1;

    let sequencer = PhaseSequencer::new(config.walk_cycle.clone())?;
    let records: Vec<PoseRecord> = (0..count)
        .map(|i| {
            let time_ms = from_ms + i as f64 * step_ms;
            let sample = sequencer.sample(time_ms / 1000.0);
            let pose = sequencer.evaluate_sample(time_ms / 1000.0, &sample);
            PoseRecord::new(time_ms, sample.phase.name(), sample.progress, &pose)
        })
        .collect();
    Ok(serde_json::to_string_pretty(&records)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_samples_cover_range() {
        let json = pose_samples_json(&SceneConfig::default(), 0.0, 8000.0, 1000.0).unwrap();
        let records: Vec<serde_json::Value> = serde_json::from_str(&json).unwrap();
        assert_eq!(records.len(), 9);
        assert_eq!(records[0]["phase"], "walking");
        assert_eq!(records[5]["phase"], "folding");
        assert_eq!(records[7]["phase"], "holding");
    }

    #[test]
    fn test_pose_samples_reject_bad_step() {
        assert!(pose_samples_json(&SceneConfig::default(), 0.0, 100.0, 0.0).is_err());
        assert!(pose_samples_json(&SceneConfig::default(), 100.0, 0.0, 10.0).is_err());
    }

    #[test]
    fn test_pose_samples_reject_unbounded_range() {
        let config = SceneConfig::default();
        assert!(pose_samples_json(&config, 0.0, f64::INFINITY, 500.0).is_err());
        assert!(pose_samples_json(&config, f64::NEG_INFINITY, 0.0, 500.0).is_err());
        assert!(pose_samples_json(&config, 0.0, 100.0, f64::NAN).is_err());
        // Finite but far too many samples
        assert!(pose_samples_json(&config, 0.0, 1e12, 0.001).is_err());
    }

    #[test]
    fn test_pose_command_with_infinite_range_fails_cleanly() {
        let cli = Cli::try_parse_from(["portfolio-fx", "pose", "--to-ms", "inf"]).unwrap();
        let Commands::Pose { from_ms, to_ms, step_ms, .. } = cli.command else {
            panic!("expected pose");
        };
        assert!(pose_samples_json(&SceneConfig::default(), from_ms, to_ms, step_ms).is_err());
    }

    #[test]
    fn test_cli_parses_render() {
        let cli = Cli::try_parse_from(["portfolio-fx", "render", "--field", "ambient", "--out", "frames", "--frames", "3"])
            .unwrap();
        match cli.command {
            Commands::Render { field, frames, fps, .. } => {
                assert!(matches!(field, FieldKind::Ambient));
                assert_eq!(frames, 3);
                assert_eq!(fps, 60.0);
            }
            _ => panic!("expected render"),
        }
    }

    #[test]
    fn test_render_writes_frames() {
        let mut config = SceneConfig::default();
        config.sphere.width = 64.0;
        config.sphere.height = 48.0;
        config.sphere.radius = 20.0;
        config.sphere.particle_count = 10;
        config.sphere.line_count = 2;

        let dir = std::env::temp_dir().join(format!("portfolio_fx_render_{}", std::process::id()));
        render_offline(&config, FieldKind::Sphere, &dir, 2, 30.0).unwrap();
        assert!(dir.join("frame_00000.png").exists());
        assert!(dir.join("frame_00001.png").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
