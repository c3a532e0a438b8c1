use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use inrcanvas::codec::load;
use inrcanvas::model::{ActivationMode, FinalActivation, InrConfig, MapConfig};
use inrcanvas::runner::load_target;

#[derive(Parser, Debug)]
#[command(name = "inrcanvas", version)]
struct Cli {
    /// Maximum level of log events written to stderr.
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render fresh frames from a seeded model.
    Generate(GenerateArgs),
    /// Rebuild frames from archived `.tif` files, optionally at a new resolution.
    Regen(RegenArgs),
    /// Fit a trainable model to a target image.
    Fit(FitArgs),
    /// Print the metadata embedded in an archived `.tif` file.
    Inspect(InspectArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for tracing::Level {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Parser, Debug)]
struct OutputArgs {
    /// Output directory.
    #[arg(long, default_value = "outputs")]
    out_dir: PathBuf,

    /// Extra preview colormaps (comma separated).
    #[arg(long, value_enum, value_delimiter = ',')]
    colormaps: Vec<inrcanvas::Colormap>,

    /// Preview raster format.
    #[arg(long, value_enum, default_value_t = inrcanvas::PreviewFormat::Png)]
    preview_format: inrcanvas::PreviewFormat,
}

#[derive(Parser, Debug)]
struct ModelArgs {
    /// Model JSON (`{"inr": {...}, "map": {...}}`); flags below are ignored when given.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output shape as `XxYxC`.
    #[arg(long, default_value = "256x256x3")]
    shape: inrcanvas::OutputShape,

    #[arg(long, default_value_t = 8)]
    latent_dim: usize,

    #[arg(long, default_value_t = 1.0)]
    latent_scale: f64,

    /// Model seed; random when omitted.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value_t = 32)]
    mlp_width: usize,

    #[arg(long, default_value_t = 1)]
    input_encoding_dim: usize,

    #[arg(long, value_enum, default_value_t = ActivationChoice::Fixed)]
    activations: ActivationChoice,

    #[arg(long, value_enum, default_value_t = FinalChoice::Sigmoid)]
    final_activation: FinalChoice,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ActivationChoice {
    Fixed,
    Random,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FinalChoice {
    Sigmoid,
    Tanh,
}

#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ModelFile {
    inr: InrConfig,
    map: MapConfig,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    model: ModelArgs,

    #[command(flatten)]
    output: OutputArgs,

    #[arg(long, default_value_t = 1)]
    num_samples: usize,

    /// Sequential chunks per frame.
    #[arg(long, default_value_t = 1)]
    splits: usize,

    /// Zoom as `X,Y`, applied to every sample.
    #[arg(long, value_parser = parse_pair)]
    zoom: Option<(f64, f64)>,

    /// Pan as `X,Y`, applied to every sample.
    #[arg(long, value_parser = parse_pair)]
    pan: Option<(f64, f64)>,

    /// Name outputs after the model identity.
    #[arg(long)]
    save_verbose: bool,

    /// Keep frames with almost no contrast.
    #[arg(long)]
    keep_blank: bool,
}

#[derive(Parser, Debug)]
struct RegenArgs {
    /// Archived `.tif` file or a directory of them.
    #[arg(long)]
    path: PathBuf,

    /// New output shape as `XxYxC`.
    #[arg(long)]
    shape: inrcanvas::OutputShape,

    #[command(flatten)]
    output: OutputArgs,

    #[arg(long, default_value_t = 1)]
    num_samples: usize,

    #[arg(long, default_value_t = 1)]
    splits: usize,

    /// Also assemble the frames into an MP4 (requires `ffmpeg` on PATH).
    #[arg(long)]
    video: bool,
}

#[derive(Parser, Debug)]
struct FitArgs {
    /// Target image.
    #[arg(long)]
    target: PathBuf,

    #[command(flatten)]
    model: ModelArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Held-out render shape as `XxYxC`; defaults to twice the training resolution.
    #[arg(long)]
    test_shape: Option<inrcanvas::OutputShape>,

    /// Loss terms as `name=weight` pairs, e.g. `l1=1,l2=0.5`.
    #[arg(long, default_value = "l1=1")]
    loss: String,

    #[arg(long, default_value_t = 50)]
    epochs: usize,

    #[arg(long, default_value_t = 100)]
    iters: usize,

    #[arg(long, default_value_t = 1e-3)]
    lr: f32,

    #[arg(long, default_value_t = 1e-5)]
    weight_decay: f32,
}

#[derive(Parser, Debug)]
struct InspectArgs {
    /// Archived `.tif` file.
    #[arg(long)]
    path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(cli.log_level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::Regen(args) => cmd_regen(args),
        Command::Fit(args) => cmd_fit(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn parse_pair(s: &str) -> Result<(f64, f64), String> {
    let (a, b) = s
        .split_once(',')
        .ok_or_else(|| format!("expected `X,Y`, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<f64>()
            .map_err(|e| format!("invalid number '{v}': {e}"))
    };
    Ok((parse(a)?, parse(b)?))
}

fn runner_opts(output: &OutputArgs) -> inrcanvas::RunnerOpts {
    inrcanvas::RunnerOpts {
        output_dir: output.out_dir.clone(),
        colormaps: output.colormaps.clone(),
        preview_format: output.preview_format,
        ..inrcanvas::RunnerOpts::default()
    }
}

fn model_config(args: &ModelArgs) -> anyhow::Result<(InrConfig, MapConfig)> {
    if let Some(path) = &args.config {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read model config '{}'", path.display()))?;
        let file: ModelFile = serde_json::from_str(&text).with_context(|| "parse model config")?;
        return Ok((file.inr, file.map));
    }
    let inr = InrConfig {
        shape: args.shape,
        latent_dim: args.latent_dim,
        latent_scale: args.latent_scale,
        seed: args.seed.unwrap_or_else(rand::random),
        ..InrConfig::default()
    };
    let map = MapConfig {
        mlp_layer_width: args.mlp_width,
        input_encoding_dim: args.input_encoding_dim,
        activations: match args.activations {
            ActivationChoice::Fixed => ActivationMode::Fixed,
            ActivationChoice::Random => ActivationMode::Random,
        },
        final_activation: match args.final_activation {
            FinalChoice::Sigmoid => FinalActivation::Sigmoid,
            FinalChoice::Tanh => FinalActivation::Tanh,
        },
        ..MapConfig::default()
    };
    Ok((inr, map))
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let (inr, map) = model_config(&args.model)?;
    let model = inrcanvas::RandomInr::new(inr, map)?;

    let mut opts = runner_opts(&args.output);
    opts.save_verbose = args.save_verbose;
    opts.skip_blank_generations = !args.keep_blank;
    let mut runner = inrcanvas::Runner::new(inrcanvas::FsStore::new(), opts)
        .with_model(Box::new(model));

    let zoom = args.zoom.map(|(x, y)| inrcanvas::Zoom(x, y));
    let pan = args.pan.map(|(x, y)| inrcanvas::Pan(x, y));
    let out = runner.run_frames(inrcanvas::RunFramesOpts {
        num_samples: args.num_samples,
        zoom_schedule: zoom.map(|z| vec![z; args.num_samples]),
        pan_schedule: pan.map(|p| vec![p; args.num_samples]),
        splits: args.splits,
        ..inrcanvas::RunFramesOpts::default()
    })?;

    for path in &out.written {
        eprintln!("wrote {}", path.display());
    }
    eprintln!(
        "run {}: kept {} frame(s), rejected {}",
        out.run_id,
        out.frames.len(),
        out.rejected
    );
    Ok(())
}

fn cmd_regen(args: RegenArgs) -> anyhow::Result<()> {
    if args.video && !inrcanvas::encode::ffmpeg::is_ffmpeg_on_path() {
        anyhow::bail!("--video requires `ffmpeg` on PATH");
    }
    let mut runner =
        inrcanvas::Runner::new(inrcanvas::FsStore::new(), runner_opts(&args.output));
    let report = runner.regen_frames(
        &mut inrcanvas::InrFactory,
        &args.path,
        inrcanvas::RegenOpts {
            num_samples: args.num_samples,
            splits: args.splits,
            save_video: args.video,
            ..inrcanvas::RegenOpts::new(args.shape)
        },
    )?;

    for entry in &report.entries {
        let status = match &entry.status {
            inrcanvas::RegenStatus::Skipped { existing } => {
                format!("skipped (found {})", existing.display())
            }
            inrcanvas::RegenStatus::Regenerated { frames, video, .. } => match video {
                Some(v) => format!("regenerated {frames} frame(s), video {}", v.display()),
                None => format!("regenerated {frames} frame(s)"),
            },
            inrcanvas::RegenStatus::NoFrames => "no usable frames".to_owned(),
            inrcanvas::RegenStatus::Failed(e) => format!("failed: {e}"),
        };
        println!("{}: {status}", entry.source.display());
    }
    if report.failed() > 0 {
        anyhow::bail!("{} of {} file(s) failed", report.failed(), report.entries.len());
    }
    Ok(())
}

fn cmd_fit(args: FitArgs) -> anyhow::Result<()> {
    let (mut inr, map) = model_config(&args.model)?;
    if args.model.config.is_none() {
        let (w, h) = image::image_dimensions(&args.target)
            .with_context(|| format!("read target '{}'", args.target.display()))?;
        inr.shape = inrcanvas::OutputShape::new(h, w, inr.shape.c_dim)?;
    }
    let test_shape = match args.test_shape {
        Some(s) => s,
        None => inrcanvas::OutputShape::new(
            inr.shape.x_dim * 2,
            inr.shape.y_dim * 2,
            inr.shape.c_dim,
        )?,
    };
    let shape = inr.shape;
    let model = inrcanvas::TrainableInr::new(inr, map)?;

    let opts = runner_opts(&args.output);
    let out_dir = opts.output_dir.clone();
    let mut runner =
        inrcanvas::Runner::new(inrcanvas::FsStore::new(), opts).with_model(Box::new(model));
    let target = load_target(runner.store_mut(), &args.target, &out_dir, shape)?;

    let report = runner.fit(inrcanvas::FitOpts {
        num_epochs: args.epochs,
        num_iters_per_epoch: args.iters,
        lr: args.lr,
        weight_decay: args.weight_decay,
        ..inrcanvas::FitOpts::new(
            target,
            test_shape,
            inrcanvas::LossWeights::parse(&args.loss)?,
        )
    })?;
    for (epoch, loss) in report.losses.iter().enumerate() {
        println!("epoch {epoch}: loss {loss:.6}");
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let store = inrcanvas::FsStore::new();
    let decoded = load(&store, Path::new(&args.path))
        .with_context(|| format!("decode archive '{}'", args.path.display()))?;
    let json = serde_json::Value::Object(decoded.metadata.to_json());
    println!("{}", serde_json::to_string_pretty(&json)?);
    eprintln!(
        "frame {}x{}x{}",
        decoded.frame.height, decoded.frame.width, decoded.frame.channels
    );
    for w in &decoded.warnings {
        eprintln!("warning: {w}");
    }
    Ok(())
}
