mod config;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;

use clap::Parser;

use framescout_core::detection::domain::frame_oracle::FrameOracle;
use framescout_core::detection::domain::object_detector::DetectorOracle;
use framescout_core::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;
use framescout_core::detection::infrastructure::shared_oracle::SharedOracle;
use framescout_core::pipeline::locate_target_use_case::{
    LocateError, LocateResult, LocateTargetUseCase,
};
use framescout_core::pipeline::search_report::SearchReport;
use framescout_core::search::domain::search_strategy::StrategyKind;
use framescout_core::shared::constants::{COCO_CLASS_NAMES, YOLO_MODEL_NAME, YOLO_MODEL_URL};
use framescout_core::shared::model_resolver;
use framescout_core::video::infrastructure::source_opener::DefaultSourceOpener;

use config::Settings;

/// Find the first and last frame of a video in which an object class appears.
#[derive(Parser)]
#[command(name = "framescout")]
struct Cli {
    /// Input video, directory of images, or '-' to read a video from stdin.
    input: PathBuf,

    /// Object classes to look for (comma-separated COCO labels).
    #[arg(long, value_delimiter = ',')]
    target: Option<Vec<String>>,

    /// Search strategy: binary (fast, assumes one contiguous appearance) or
    /// linear (every frame).
    #[arg(long)]
    strategy: Option<StrategyKind>,

    /// Detection confidence threshold (0.0-1.0).
    #[arg(long)]
    confidence: Option<f64>,

    /// ONNX model file. Defaults to a cached or downloaded YOLOv8n.
    #[arg(long)]
    model: Option<PathBuf>,

    /// Abort a search that runs longer than this many seconds.
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Number of model instances to load for concurrent searches.
    #[arg(long)]
    pool_size: Option<usize>,

    /// File extension of a video read from stdin, so it can be demuxed.
    #[arg(long, default_value = "mp4")]
    stdin_format: String,

    /// Print reports as JSON.
    #[arg(long)]
    json: bool,

    /// Settings file (defaults to settings.json in the user config directory).
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Flags merged over settings.
#[derive(Debug, PartialEq)]
struct Options {
    targets: Vec<String>,
    strategy: StrategyKind,
    confidence: f64,
    model: Option<PathBuf>,
    timeout: Option<Duration>,
    pool_size: usize,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref())?;
    let options = merge(&cli, settings);
    validate(&cli, &options)?;

    let oracle = build_oracle(&options)?;
    let use_case = LocateTargetUseCase::new(Box::new(DefaultSourceOpener), oracle, options.strategy)
        .with_timeout(options.timeout);

    let results: Vec<Result<LocateResult, LocateError>> = if is_stdin(&cli.input) {
        let mut bytes = Vec::new();
        std::io::stdin().read_to_end(&mut bytes)?;
        let filename = format!("stdin.{}", cli.stdin_format);
        options
            .targets
            .iter()
            .map(|target| use_case.execute_upload(&bytes, &filename, target))
            .collect()
    } else if options.targets.len() == 1 {
        vec![use_case.execute(&cli.input, &options.targets[0])]
    } else {
        use_case.execute_many(&cli.input, options.targets.as_slice())
    };

    let mut reports = Vec::new();
    let mut failures = 0;
    for (target, result) in options.targets.iter().zip(results) {
        match result {
            Ok(result) => {
                if !cli.json {
                    print_result(&result);
                }
                reports.push(result.report);
            }
            Err(e) => {
                eprintln!("Error searching for '{target}': {e}");
                failures += 1;
            }
        }
    }
    if cli.json {
        print_json(&reports)?;
    }

    if failures > 0 {
        return Err(format!("{failures} of {} searches failed", options.targets.len()).into());
    }
    Ok(())
}

fn merge(cli: &Cli, settings: Settings) -> Options {
    Options {
        targets: cli.target.clone().unwrap_or_else(|| vec![settings.target]),
        strategy: cli.strategy.unwrap_or(settings.strategy),
        confidence: cli.confidence.unwrap_or(settings.confidence),
        model: cli.model.clone().or(settings.model),
        timeout: cli
            .timeout_secs
            .or(settings.timeout_secs)
            .map(Duration::from_secs),
        pool_size: cli.pool_size.unwrap_or(settings.pool_size),
    }
}

fn validate(cli: &Cli, options: &Options) -> Result<(), Box<dyn std::error::Error>> {
    if !is_stdin(&cli.input) && !cli.input.exists() {
        return Err(format!("Input not found: {}", cli.input.display()).into());
    }
    if options.targets.is_empty() || options.targets.iter().any(|t| t.trim().is_empty()) {
        return Err("Target classes must be non-empty labels".into());
    }
    if !(0.0..=1.0).contains(&options.confidence) {
        return Err(format!(
            "Confidence must be between 0.0 and 1.0, got {}",
            options.confidence
        )
        .into());
    }
    if options.pool_size == 0 {
        return Err("Pool size must be at least 1".into());
    }
    if options.timeout == Some(Duration::ZERO) {
        return Err("Timeout must be at least 1 second".into());
    }
    if let Some(model) = &options.model {
        if !model.is_file() {
            return Err(format!("Model file not found: {}", model.display()).into());
        }
    }
    if options.model.is_none() {
        for target in &options.targets {
            if !COCO_CLASS_NAMES.iter().any(|c| c.eq_ignore_ascii_case(target.trim())) {
                log::warn!("'{target}' is not a class of the default model; it will never be found");
            }
        }
    }
    Ok(())
}

fn build_oracle(options: &Options) -> Result<SharedOracle, Box<dyn std::error::Error>> {
    let model_path = match &options.model {
        Some(path) => path.clone(),
        None => {
            log::info!("Resolving model: {YOLO_MODEL_NAME}");
            let path = model_resolver::resolve(
                YOLO_MODEL_NAME,
                YOLO_MODEL_URL,
                None,
                Some(Box::new(download_progress)),
            )?;
            eprintln!();
            path
        }
    };

    let mut oracles: Vec<Box<dyn FrameOracle>> = Vec::with_capacity(options.pool_size);
    for _ in 0..options.pool_size {
        let detector = OnnxYoloDetector::new(&model_path, options.confidence)?;
        oracles.push(Box::new(DetectorOracle::new(detector)));
    }
    log::info!(
        "Loaded {} instance(s) of {}",
        oracles.len(),
        model_path.display()
    );
    Ok(SharedOracle::pool(oracles)?)
}

fn print_result(result: &LocateResult) {
    println!("{}", result.report.message);
    if let Some((start, end)) = result.timestamps_secs() {
        println!("  time: {start:.2}s - {end:.2}s");
    }
    println!(
        "  {} probes, {} detector calls",
        result.stats.probes, result.stats.oracle_calls
    );
    if result.stats.has_read_failures() {
        println!(
            "  unreadable frames treated as absent: {:?}",
            result.stats.read_failures
        );
    }
}

fn print_json(reports: &[SearchReport]) -> Result<(), serde_json::Error> {
    let json = match reports {
        [single] => serde_json::to_string_pretty(single)?,
        many => serde_json::to_string_pretty(many)?,
    };
    println!("{json}");
    Ok(())
}

fn is_stdin(path: &Path) -> bool {
    path.as_os_str() == "-"
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading detection model... {pct}%");
    } else {
        eprint!("\rDownloading detection model... {downloaded} bytes");
    }
}
