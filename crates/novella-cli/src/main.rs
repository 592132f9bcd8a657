use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use novella_core::audio::open_output;
use novella_core::config::DEFAULT_FONT;
use novella_core::preflight::{check, preflight};
use novella_core::story::Story;
use novella_core::systems::{FontSet, WindowStage};
use novella_core::types::Viewport;
use novella_core::video_wrapper::DecoderOpener;
use novella_core::{narrative, DefaultAssetLoader, PlaybackDriver, PlayerConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Story JSON file (defaults to the built-in story)
    #[arg(long, global = true, value_name = "JSON")]
    story: Option<PathBuf>,

    /// Asset root directory (overrides NOVELLA_ASSET_ROOT)
    #[arg(long, global = true, value_name = "DIR")]
    assets: Option<PathBuf>,

    /// Font file, relative to the asset root
    #[arg(long, global = true, default_value = DEFAULT_FONT)]
    font: String,

    /// Window width
    #[arg(long, global = true, default_value_t = 1280)]
    width: u32,

    /// Window height
    #[arg(long, global = true, default_value_t = 720)]
    height: u32,

    /// Open the window without decorations
    #[arg(long, global = true)]
    borderless: bool,

    /// Minimum swipe distance in pixels
    #[arg(long, global = true, default_value_t = 100.0)]
    swipe_threshold: f32,

    /// Log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Log format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Play the story (default)
    Play,
    /// Verify every asset the story references
    Check,
    /// Print the story as JSON
    DumpStory,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
enum LogFormat {
    Pretty,
    Json,
}

fn init_logging(level: LogLevel, format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(level.to_string().parse()?)
        .from_env_lossy();

    let subscriber_builder = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Json => subscriber_builder.json().init(),
        LogFormat::Pretty => subscriber_builder.pretty().init(),
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = init_logging(cli.log_level, cli.log_format) {
        eprintln!("Failed to initialise logging: {e:#}");
        return ExitCode::FAILURE;
    }

    let result = match cli.command.unwrap_or(Command::Play) {
        Command::Play => play(&cli),
        Command::Check => run_check(&cli),
        Command::DumpStory => dump_story(&cli),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_story(cli: &Cli) -> anyhow::Result<Story> {
    match &cli.story {
        Some(path) => {
            Story::load(path).with_context(|| format!("Loading story {}", path.display()))
        }
        None => Story::built_in().context("Building the built-in story"),
    }
}

fn player_config(cli: &Cli) -> PlayerConfig {
    let mut config = PlayerConfig {
        viewport: Viewport::new(cli.width, cli.height),
        font: cli.font.clone(),
        borderless: cli.borderless,
        ..PlayerConfig::default()
    };
    config.swipe.threshold = cli.swipe_threshold;
    config
}

fn play(cli: &Cli) -> anyhow::Result<ExitCode> {
    let story = load_story(cli)?;
    let config = player_config(cli);
    let loader = DefaultAssetLoader::new(cli.assets.clone());

    info!(title = %story.title, "Starting player");
    preflight(&story, &loader, &config.font)?;
    let fonts = FontSet::load(&loader, &config.font, config.font_large, config.font_small)?;

    let stage = WindowStage::open(&story.title, &config, fonts)?;
    let mut driver = PlaybackDriver::new(
        &config,
        Box::new(stage),
        open_output(),
        Box::new(DecoderOpener),
        Arc::new(loader),
    );

    match narrative::run(&mut driver, &story.root) {
        Ok(report) => {
            info!(
                scenes = report.sessions.len(),
                choices = ?report.choices,
                ending = report.ending.as_deref().unwrap_or("-"),
                "Story finished"
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) if e.is_quit() => {
            info!("Player closed");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => Err(e.into()),
    }
}

fn run_check(cli: &Cli) -> anyhow::Result<ExitCode> {
    let story = load_story(cli)?;
    let loader = DefaultAssetLoader::new(cli.assets.clone());
    let report = check(&story, &loader, &DecoderOpener, &cli.font);
    println!("{report}");
    Ok(if report.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn dump_story(cli: &Cli) -> anyhow::Result<ExitCode> {
    let story = load_story(cli)?;
    println!("{}", story.to_json_pretty()?);
    Ok(ExitCode::SUCCESS)
}
