/*
  Writes a large 3-D dataset to an HDF5 file one plane at a time, and checks the result.
*/

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use h5slab::{
    verify_as, Driver, ElementType, FailurePolicy, PlaneErrorPolicy, Shape, SlabWriter,
    WriterConfig, DEFAULT_DATASET,
};

/// clap parser
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the container and write every plane of the dataset
    Write(WriteArgs),
    /// Reopen a container and compare its planes with the pattern
    Verify(VerifyArgs),
}

#[derive(Args, Debug)]
struct WriteArgs {
    /// TOML writer configuration; the flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output HDF5 file
    #[arg(long)]
    path: Option<PathBuf>,
    #[arg(long)]
    dataset: Option<String>,
    #[arg(long)]
    depth: Option<usize>,
    #[arg(long)]
    height: Option<usize>,
    #[arg(long)]
    width: Option<usize>,
    /// char or uchar
    #[arg(long)]
    element_type: Option<ElementType>,
    /// sec2, stdio or core
    #[arg(long)]
    driver: Option<Driver>,
    /// Keep writing the remaining planes after a plane fails
    #[arg(long)]
    continue_on_error: bool,
    /// Delete the output file if the run fails
    #[arg(long)]
    remove_on_failure: bool,
}

#[derive(Args, Debug)]
struct VerifyArgs {
    #[arg(long)]
    path: PathBuf,
    #[arg(long, default_value = DEFAULT_DATASET)]
    dataset: String,
    #[arg(long)]
    depth: usize,
    #[arg(long)]
    height: usize,
    #[arg(long)]
    width: usize,
    #[arg(long, default_value = "char")]
    element_type: ElementType,
    /// Comma-separated depth indices to check (default: all)
    #[arg(long, value_delimiter = ',')]
    planes: Option<Vec<usize>>,
}

impl WriteArgs {
    fn into_config(self) -> anyhow::Result<WriterConfig> {
        let mut config = match self.config {
            Some(ref file) => WriterConfig::load(file)
                .with_context(|| format!("loading {}", file.display()))?,
            None => match (self.path.clone(), self.depth, self.height, self.width) {
                (Some(path), Some(depth), Some(height), Some(width)) => {
                    WriterConfig::new(path, depth, height, width)
                }
                _ => bail!("--path, --depth, --height and --width are required without --config"),
            },
        };
        if let Some(path) = self.path {
            config.path = path;
        }
        if let Some(dataset) = self.dataset {
            config.dataset = dataset;
        }
        if let Some(depth) = self.depth {
            config.depth = depth;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(element_type) = self.element_type {
            config.element_type = element_type;
        }
        if let Some(driver) = self.driver {
            config.driver = driver;
        }
        if self.continue_on_error {
            config.on_plane_error = PlaneErrorPolicy::Continue;
        }
        if self.remove_on_failure {
            config.on_failure = FailurePolicy::Remove;
        }
        Ok(config)
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Write(args) => {
            let config = args.into_config()?;
            log::debug!("Configuration: {config:?}");
            let report = SlabWriter::new(config).run().context("write failed")?;
            println!("{report}");
        }
        Command::Verify(args) => {
            let shape = Shape::new(args.depth, args.height, args.width);
            let report = verify_as(
                args.element_type,
                &args.path,
                &args.dataset,
                shape,
                args.planes.as_deref(),
            )
            .context("verification failed")?;
            println!(
                "{}: {} plane(s) of {} {} dataset {:?} match ({:?} byte order)",
                report.path.display(),
                report.planes_checked,
                report.shape,
                report.element_type,
                report.dataset,
                report.byte_order
            );
        }
    }
    Ok(())
}

pub fn main() -> ExitCode {
    pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
