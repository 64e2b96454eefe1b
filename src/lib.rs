//! yoloprep: dataset preparation for YOLO-style detector training.
//!
//! Two pipelines share this crate:
//!
//! - [`conversion`]: turn the newest COCO JSON manifest under a folder into
//!   an `images/` + `labels/` folder with one label file per image.
//! - [`split`]: partition such a folder into reproducible train, valid and
//!   test subsets and write the `data.yaml` a trainer reads.
//!
//! # Modules
//!
//! - [`ir`]: typed manifest records, class mapping, on-disk formats
//! - [`metrics`]: the [`MetricsSink`](metrics::MetricsSink) both pipelines report through
//! - [`error`]: error types

pub mod conversion;
pub mod error;
pub mod ir;
pub mod metrics;
pub mod report;
pub mod split;

use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

pub use error::PrepError;

use conversion::{convert_coco_to_yolo, ConvertOptions};
use metrics::LogSink;
use split::{partition_dataset, SplitOptions, SplitRatios, DEFAULT_SPLIT_SEED};

/// The yoloprep CLI application.
#[derive(Parser)]
#[command(name = "yoloprep")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert the newest COCO JSON manifest into per-image label files.
    Convert(ConvertArgs),
    /// Split an images/ + labels/ folder into train, valid and test.
    Split(SplitArgs),
}

/// Arguments for the convert subcommand.
#[derive(clap::Args)]
struct ConvertArgs {
    /// Folder searched recursively for the newest COCO JSON manifest.
    #[arg(long = "coco-json-folder")]
    coco_json_folder: PathBuf,

    /// Folder holding the source images.
    #[arg(long = "image-folder")]
    image_folder: PathBuf,

    /// Folder that receives images/, labels/ and data.yaml.
    #[arg(long = "output-folder")]
    output_folder: PathBuf,

    /// Divide box coordinates by the image size.
    #[arg(long)]
    normalize: bool,

    /// Format of the run report printed on stdout.
    #[arg(long, value_enum, default_value = "text")]
    output: ReportFormat,
}

/// Arguments for the split subcommand.
#[derive(clap::Args)]
struct SplitArgs {
    /// Folder holding images/ and labels/.
    #[arg(long = "data-folder")]
    data_folder: PathBuf,

    /// Folder that receives train/, valid/, test/ and data.yaml.
    #[arg(long = "output-folder")]
    output_folder: PathBuf,

    /// Fraction of images held out for validation.
    #[arg(long = "val-ratio", default_value_t = 0.1, value_parser = validate_ratio)]
    val_ratio: f64,

    /// Fraction of images held out for testing.
    #[arg(long = "test-ratio", default_value_t = 0.1, value_parser = validate_ratio)]
    test_ratio: f64,

    /// Seed for the shuffle.
    #[arg(long, default_value_t = DEFAULT_SPLIT_SEED)]
    seed: u64,

    /// Ordered class names, comma separated. Read from the data folder when omitted.
    #[arg(long, value_delimiter = ',')]
    names: Vec<String>,

    /// Format of the run report printed on stdout.
    #[arg(long, value_enum, default_value = "text")]
    output: ReportFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    Text,
    Json,
}

fn validate_ratio(s: &str) -> Result<f64, String> {
    match f64::from_str(s) {
        Ok(val) if (0.0..1.0).contains(&val) => Ok(val),
        _ => Err("RATIO must be in [0.0, 1.0)".to_string()),
    }
}

/// Run the yoloprep CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), PrepError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::Split(args)) => run_split(args),
        None => {
            println!("yoloprep {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("COCO to YOLO conversion and train/valid/test partitioning.");
            println!();
            println!("Run 'yoloprep --help' for usage information.");
            Ok(())
        }
    }
}

fn run_convert(args: ConvertArgs) -> Result<(), PrepError> {
    let opts = ConvertOptions {
        manifest_root: args.coco_json_folder,
        image_folder: args.image_folder,
        output_folder: args.output_folder,
        normalize: args.normalize,
    };

    let report = convert_coco_to_yolo(&opts, &mut LogSink)?;
    print_report(&report, args.output)
}

fn run_split(args: SplitArgs) -> Result<(), PrepError> {
    let names = args
        .names
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    let opts = SplitOptions {
        data_folder: args.data_folder,
        output_folder: args.output_folder,
        ratios: SplitRatios::new(args.val_ratio, args.test_ratio)?,
        seed: args.seed,
        names,
    };

    let report = partition_dataset(&opts, &mut LogSink)?;
    print_report(&report, args.output)
}

fn print_report<R: Serialize + std::fmt::Display>(
    report: &R,
    format: ReportFormat,
) -> Result<(), PrepError> {
    match format {
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(report).map_err(PrepError::ReportJson)?;
            println!("{json}");
        }
        ReportFormat::Text => print!("{report}"),
    }
    Ok(())
}
