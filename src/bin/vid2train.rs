use std::{
    fs,
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use vid2train::{
    DEFAULT_BRIGHTNESS_MAX, DEFAULT_BRIGHTNESS_MIN, DEFAULT_CROP_SIZE,
    DEFAULT_SAMPLES_PER_SECOND, DirectorySink, FfmpegLogLevel, FilterType, Pipeline,
    PipelineOptions, ProgressCallback, ProgressInfo, RunToken, VideoFile, WriteFailurePolicy,
};

const CLI_AFTER_HELP: &str = "Examples:\n  vid2train --input clip.mp4\n  vid2train --input clip.mp4 --output frames --crop-size 256 --fps 2 --yes\n  vid2train --input clip.mp4 --bright-min 40 --bright-max 200 --seed 7 --json\n  vid2train completions zsh > _vid2train";

#[derive(Debug, Parser)]
#[command(
    name = "vid2train",
    version,
    about = "Extract frames from a video for AI training",
    after_help = CLI_AFTER_HELP,
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Args, Clone)]
struct RunArgs {
    /// Input video path. Asked for interactively when omitted.
    #[arg(long, short)]
    input: Option<PathBuf>,

    /// Output directory. Defaults to `<video dir>/<video name>_<token>`.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Side length of the output images in pixels.
    #[arg(long, alias = "crop_size", default_value_t = DEFAULT_CROP_SIZE)]
    crop_size: u32,

    /// Exclusive minimum mean brightness (0-255).
    #[arg(long, alias = "bright_min", default_value_t = DEFAULT_BRIGHTNESS_MIN)]
    bright_min: u32,

    /// Exclusive maximum mean brightness (1-256).
    #[arg(long, alias = "bright_max", default_value_t = DEFAULT_BRIGHTNESS_MAX)]
    bright_max: u32,

    /// Images sampled per second of video.
    #[arg(long, default_value_t = DEFAULT_SAMPLES_PER_SECOND)]
    fps: f64,

    /// Seed for the crop placement, for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,

    /// What to do when an image cannot be written.
    #[arg(long, value_enum, default_value_t = WriteErrorMode::Abort)]
    on_write_error: WriteErrorMode,

    /// Resampling filter for the final resize.
    #[arg(long, value_enum, default_value_t = ResizeFilter::Triangle)]
    filter: ResizeFilter,

    /// Skip the confirmation prompt.
    #[arg(long, short)]
    yes: bool,

    /// Print the run summary as JSON.
    #[arg(long)]
    json: bool,

    /// Show a progress bar.
    #[arg(long)]
    progress: bool,

    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum WriteErrorMode {
    Abort,
    Skip,
}

impl From<WriteErrorMode> for WriteFailurePolicy {
    fn from(mode: WriteErrorMode) -> Self {
        match mode {
            WriteErrorMode::Abort => WriteFailurePolicy::Abort,
            WriteErrorMode::Skip => WriteFailurePolicy::Skip,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ResizeFilter {
    Nearest,
    Triangle,
    Catmullrom,
    Gaussian,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Triangle => FilterType::Triangle,
            ResizeFilter::Catmullrom => FilterType::CatmullRom,
            ResizeFilter::Gaussian => FilterType::Gaussian,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Ask a yes/no question until the answer is `y` or `n`.
///
/// End of input counts as `n`.
fn confirm_prompt<R: BufRead, W: Write>(
    question: &str,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    loop {
        write!(output, "{question} (y/n): ")?;
        output.flush()?;

        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            return Ok(false);
        }

        match answer.trim().to_ascii_lowercase().as_str() {
            "y" => return Ok(true),
            "n" => return Ok(false),
            _ => writeln!(output, "Invalid input. Please enter 'y' or 'n'.")?,
        }
    }
}

/// Read one trimmed line after printing `message`.
fn prompt_line<R: BufRead, W: Write>(
    message: &str,
    input: &mut R,
    output: &mut W,
) -> io::Result<String> {
    write!(output, "{message}")?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// `<video dir>/<video stem>_<token>`.
fn default_output_directory(input: &Path, token: &RunToken) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let directory_name = format!("{stem}_{token}");
    match input.parent() {
        Some(parent) => parent.join(directory_name),
        None => PathBuf::from(directory_name),
    }
}

/// Log filter used when `RUST_LOG` is unset.
fn default_log_filter(verbose: bool) -> &'static str {
    if verbose { "debug" } else { "warn" }
}

fn init_logging(verbose: bool) {
    let default_filter = default_log_filter(verbose);
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init();
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        self.bar.set_length(info.total);
        self.bar.set_position(info.current);
        self.bar
            .set_message(format!("{} kept, {} skipped", info.accepted, info.rejected));
        if info.current_frame.is_none() {
            self.bar.finish();
        }
    }
}

fn build_options(
    args: &RunArgs,
    output_directory: &Path,
    token: RunToken,
) -> Result<PipelineOptions, Box<dyn std::error::Error>> {
    let mut options = PipelineOptions::new(output_directory)
        .with_run_token(token)
        .with_crop_size(args.crop_size)
        .with_brightness(args.bright_min, args.bright_max)
        .with_samples_per_second(args.fps)
        .with_write_failure_policy(args.on_write_error.into())
        .with_resize_filter(args.filter.into());

    if let Some(seed) = args.seed {
        options = options.with_seed(seed);
    }

    if args.progress {
        options = options.with_progress(Arc::new(TerminalProgress::new()?));
    }

    Ok(options)
}

fn run_extraction(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(level) = &args.log_level {
        vid2train::set_ffmpeg_log_level(level.parse::<FfmpegLogLevel>()?);
    }

    let stdin = io::stdin();
    let mut input_lines = stdin.lock();
    let mut stdout = io::stdout();

    let token = RunToken::from_system_time();

    let input = match &args.input {
        Some(input) => input.clone(),
        None => PathBuf::from(prompt_line(
            "Enter the source video file path: ",
            &mut input_lines,
            &mut stdout,
        )?),
    };
    if input.as_os_str().is_empty() {
        return Err("no input video given".into());
    }
    println!("The input video file path is {}.", input.display());

    let output_directory = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_directory(&input, &token));
    println!("The output directory path is {}.", output_directory.display());

    let options = build_options(&args, &output_directory, token)?;
    let pipeline = Pipeline::new(options)?;

    if !args.yes
        && !confirm_prompt(
            "Do you want to proceed with these settings?",
            &mut input_lines,
            &mut stdout,
        )?
    {
        println!("{}", "Operation aborted.".yellow());
        return Ok(());
    }

    if !output_directory.exists() {
        fs::create_dir_all(&output_directory)?;
        println!(
            "The directory path {} has been created.",
            output_directory.display()
        );
    }

    let video = VideoFile::open(&input)?;
    let metadata = video.metadata().clone();
    log::debug!(
        "{}x{} @ {:.2} fps, {} frames",
        metadata.width,
        metadata.height,
        metadata.frames_per_second,
        metadata.frame_count
    );

    let mut sink = DirectorySink::new(&output_directory);
    let summary = pipeline.run(video, &mut sink)?;

    if args.json {
        let payload = json!({
            "input": input.display().to_string(),
            "output_directory": output_directory.display().to_string(),
            "run_token": pipeline.options().run_token().as_str(),
            "images_created": summary.accepted,
            "frames_skipped": summary.rejected,
            "ticks": summary.ticks,
            "elapsed_seconds": summary.elapsed.as_secs_f64(),
            "video": {
                "width": metadata.width,
                "height": metadata.height,
                "fps": metadata.frames_per_second,
                "frame_count": metadata.frame_count,
                "codec": metadata.codec,
            },
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        println!(
            "{} {}",
            "Total images created:".green().bold(),
            summary.accepted
        );
        println!(
            "{} {}",
            "Total frames skipped:".yellow().bold(),
            summary.rejected
        );
    }

    Ok(())
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.run.verbose);

    match cli.command {
        Some(Commands::Completions { shell }) => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "vid2train", &mut io::stdout());
            Ok(())
        }
        None => run_extraction(cli.run),
    }
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
