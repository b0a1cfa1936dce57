//! Build a scale pyramid for an array in a filesystem hierarchy.

use std::{io::Write, path::PathBuf, process::ExitCode, sync::Arc};

use clap::Parser;
use env_logger::{Builder, Env, Target};
use log::error;

use zarrs_pyramid::{
    pyramid::{create_scale_pyramid, PyramidOptions, ScaleFactors, ShapeArg},
    storage::store::FilesystemStore,
};

/// Create a scale pyramid by downsampling an array level by level.
///
/// If the dataset is not named `s<n>`, it is moved to `<dataset>/s0` and new levels are written next to it.
#[derive(Parser, Debug)]
#[command(author, version)]
struct Cli {
    /// The path to the container (the root of the hierarchy).
    container: PathBuf,

    /// The path of the dataset within the container, e.g. `volumes/raw`.
    dataset: String,

    /// Scale factors for each new level, separated by `;`.
    ///
    /// Each factor is an integer, or comma-separated integers with one per spatial axis.
    /// Factors are relative to the previous level, e.g. `2,2,1;2,2,1;2;2`.
    scales: ScaleFactors,

    /// The chunk shape of new levels: an integer or comma-separated integers.
    ///
    /// Defaults to the chunk shape of the base level.
    #[arg(short, long)]
    chunk_shape: Option<ShapeArg>,

    /// The number of workers processing blocks.
    #[arg(short, long, default_value_t = 60)]
    workers: usize,

    /// Append log output to this file instead of stderr.
    #[arg(short, long)]
    log_file: Option<PathBuf>,

    /// The number of times a failing block is retried.
    #[arg(long, default_value_t = 0)]
    max_retries: usize,
}

fn logger_builder(log_file: Option<&PathBuf>) -> std::io::Result<Builder> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} {:<5} {}",
            buf.timestamp_seconds(),
            record.level(),
            record.args()
        )
    });
    if let Some(log_file) = log_file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_file)?;
        builder.target(Target::Pipe(Box::new(file)));
    }
    Ok(builder)
}

fn init_logging(log_file: Option<&PathBuf>) -> std::io::Result<()> {
    logger_builder(log_file)?.init();
    Ok(())
}

/// Normalise a dataset path to an absolute node path without a trailing `/`.
fn normalise_dataset_path(dataset: &str) -> String {
    format!("/{}", dataset.trim_matches('/'))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = init_logging(cli.log_file.as_ref()) {
        eprintln!("Failed to open log file: {err}");
        return ExitCode::from(2);
    }

    let store = match FilesystemStore::new(&cli.container) {
        Ok(store) => Arc::new(store),
        Err(err) => {
            error!("Failed to open container {}: {err}", cli.container.display());
            return ExitCode::from(2);
        }
    };
    let options = PyramidOptions::builder()
        .num_workers(cli.workers)
        .max_retries(cli.max_retries)
        .chunk_shape(cli.chunk_shape)
        .build();
    let dataset = normalise_dataset_path(&cli.dataset);

    match create_scale_pyramid(store, &dataset, &cli.scales, &options) {
        Ok(levels) => {
            for level in levels {
                log::info!(
                    "{}: shape {:?}, voxel size {}, roi {}",
                    level.path,
                    level.shape,
                    level.voxel_size,
                    level.roi
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) if err.is_validation_error() => {
            error!("{err}");
            ExitCode::from(2)
        }
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}
