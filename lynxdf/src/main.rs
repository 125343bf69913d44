use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use clap::Parser;
use log::info;
use lynxdf::data::config::DecodeConfig;
use lynxdf::data::dataset::WatersDataset;

/// Decode a Waters MassLynx .raw directory into JSON.
#[derive(Parser, Debug)]
#[command(name = "lynxdf", version, about)]
struct Args {
    /// Path to the .raw directory
    path: PathBuf,

    /// Decimal digits kept when rounding m/z keys
    #[arg(
        short,
        long,
        default_value_t = 0,
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(i32).range(-15..=15)
    )]
    precision: i32,

    /// Number of threads used to decode functions
    #[arg(short = 'j', long, default_value_t = 4)]
    num_threads: usize,

    /// Write the decoded content to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Only print one summary line per decoded entity
    #[arg(short, long)]
    summary: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args = Args::parse();

    let config = DecodeConfig::new(args.precision, args.num_threads);
    let dataset = WatersDataset::new(&args.path)?;
    let content = dataset.read_all(&config)?;
    info!(
        "decoded {} spectra and {} analog traces from {}",
        content.spectra.len(),
        content.analog.len(),
        args.path.display()
    );

    match (&args.output, args.summary) {
        (Some(path), true) => {
            serde_json::to_writer_pretty(BufWriter::new(File::create(path)?), &content.summary())?
        }
        (Some(path), false) => serde_json::to_writer(BufWriter::new(File::create(path)?), &content)?,
        (None, true) => {
            for entity in content.summary() {
                println!("{}", serde_json::to_string(&entity)?);
            }
        }
        (None, false) => println!("{}", serde_json::to_string(&content)?),
    }

    Ok(())
}
