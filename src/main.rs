use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aniso_diffusion::{Avg5, GrayImage, ImageOperator, OptimizationLevel, PeronaMalik};
use denoir::imaging::{self, ImageFormat};
use denoir::timing::TimingRegistry;
use qlisp::{eval, Environment, Value};

#[derive(Parser)]
#[command(name = "denoir")]
#[command(about = "Edge-preserving grayscale denoiser with a scripting sidekick")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Denoise an image; writes input.png and output.png to the working
    /// directory and prints timing statistics
    Denoise {
        /// Path to the input PNG
        image: PathBuf,

        /// Contrast parameter of the edge-stopping function
        #[arg(long, default_value_t = 1.0)]
        kappa: f32,

        /// Euler time step
        #[arg(long, default_value_t = 1.0)]
        dt: f32,

        /// Number of diffusion iterations
        #[arg(long, default_value_t = 300)]
        times: u32,

        /// Couple both axes through the gradient magnitude
        #[arg(long)]
        isotropic: bool,

        /// How to read luminance from the decoded channels
        #[arg(long, value_enum, default_value = "ycbcr")]
        format: ImageFormat,

        /// Which filter to run
        #[arg(long, value_enum, default_value = "diffusion")]
        filter: FilterKind,

        /// Vectorization level; auto picks the best the CPU supports
        #[arg(long, value_enum, default_value = "auto")]
        level: LevelArg,

        /// Repeat the filter run to gather timing statistics
        #[arg(long, default_value_t = 1)]
        repeat: u32,
    },
    /// Evaluate a qlisp script and print each top-level result
    Eval {
        /// Path to the script file
        script: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FilterKind {
    /// Perona-Malik nonlinear diffusion
    Diffusion,
    /// 5-point cross averaging
    Avg5,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LevelArg {
    Auto,
    None,
    Sse4,
    Avx2,
}

impl LevelArg {
    fn resolve(self) -> OptimizationLevel {
        match self {
            LevelArg::Auto => OptimizationLevel::detect(),
            LevelArg::None => OptimizationLevel::None,
            LevelArg::Sse4 => OptimizationLevel::Sse4,
            LevelArg::Avx2 => OptimizationLevel::Avx2,
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Minimal logging for CLI use; RUST_LOG overrides.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "denoir=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Denoise {
            image,
            kappa,
            dt,
            times,
            isotropic,
            format,
            filter,
            level,
            repeat,
        } => run_denoise(
            &image, kappa, dt, times, isotropic, format, filter, level, repeat,
        ),
        Commands::Eval { script } => run_eval(&script),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_denoise(
    image_path: &Path,
    kappa: f32,
    dt: f32,
    times: u32,
    isotropic: bool,
    format: ImageFormat,
    filter: FilterKind,
    level: LevelArg,
    repeat: u32,
) -> anyhow::Result<()> {
    let image = imaging::load_luminance(image_path, format)
        .with_context(|| format!("failed to load {}", image_path.display()))?;
    tracing::info!(
        width = image.width(),
        height = image.height(),
        aligned = image.is_aligned(),
        "Loaded image"
    );

    if !image.is_aligned() {
        anyhow::bail!(
            "image width {} is not a multiple of 32; the filters need aligned rows",
            image.width()
        );
    }

    let level = level.resolve();
    let mut registry = TimingRegistry::new();

    let result = match filter {
        FilterKind::Diffusion => {
            let primary = PeronaMalik::new(kappa, dt, times, isotropic, level);
            let label = format!("PeronaMalik::apply({:?})", level);

            let mut result = registry.time(&label, || primary.apply(&image))?;
            for _ in 1..repeat {
                result = registry.time(&label, || primary.apply(&image))?;
            }

            if level != OptimizationLevel::None {
                cross_check(&mut registry, &result, || {
                    PeronaMalik::new(kappa, dt, times, isotropic, OptimizationLevel::None)
                        .apply(&image)
                })?;
            }
            result
        }
        FilterKind::Avg5 => {
            let primary = Avg5::new(level);
            let label = format!("Avg5::apply({:?})", level);

            let mut result = registry.time(&label, || primary.apply(&image))?;
            for _ in 1..repeat {
                result = registry.time(&label, || primary.apply(&image))?;
            }

            if level != OptimizationLevel::None {
                cross_check(&mut registry, &result, || {
                    Avg5::new(OptimizationLevel::None).apply(&image)
                })?;
            }
            result
        }
    };

    imaging::store_grayscale(Path::new("input.png"), &image).context("failed to write input.png")?;
    imaging::store_grayscale(Path::new("output.png"), &result)
        .context("failed to write output.png")?;
    tracing::info!("Wrote input.png and output.png");

    print!("{}", registry.report());
    Ok(())
}

/// Reruns the filter on the scalar path and verifies that it produces the
/// same bytes as the vectorized result.
fn cross_check(
    registry: &mut TimingRegistry,
    result: &GrayImage,
    run: impl FnOnce() -> Result<GrayImage, aniso_diffusion::FilterError>,
) -> anyhow::Result<()> {
    let reference = registry.time("cross-check(scalar)", run)?;
    if imaging::compare(result, &reference) {
        tracing::debug!("Scalar cross-check passed");
    } else {
        tracing::warn!("Images are different!");
    }
    Ok(())
}

fn run_eval(script_path: &Path) -> anyhow::Result<()> {
    let source = std::fs::read_to_string(script_path)
        .with_context(|| format!("failed to read {}", script_path.display()))?;
    let name = script_path.display().to_string();

    let blackboard = qlisp::parse_source(&name, &source);
    if blackboard.has_errors() {
        eprint!("{}", blackboard.render_diagnostics());
        std::process::exit(1);
    }

    let env = Environment::new_ref();
    for node in &blackboard.ast.children {
        let result = eval(&env, Value::from_ast(node));
        println!("{}", result);
    }
    Ok(())
}
