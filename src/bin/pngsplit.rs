//! pngsplit
//!
//! Splits a stream of concatenated PNG images into numbered files and
//! reports format, metadata and frame events on stdout.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use png_split::stream::DEFAULT_BLOCK_SIZE;
use png_split::{Event, SplitReader, SplitterConfig};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// CLI arguments for pngsplit
#[derive(Parser, Debug)]
#[command(name = "pngsplit")]
#[command(version)]
#[command(about = "Split concatenated PNG images into separate files", long_about = None)]
struct CliArgs {
    /// Input file (reads stdin when omitted)
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Directory for the extracted images
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// File name prefix for the extracted images
    #[arg(long, value_name = "PREFIX", default_value = "image-")]
    prefix: String,

    /// Splitter config file (JSON)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Report indexed images as indexed with their palette
    #[arg(long)]
    indexed: bool,

    /// Verify chunk CRCs
    #[arg(long)]
    verify_crc: bool,

    /// Read size in bytes
    #[arg(long, value_name = "BYTES", default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Print events as JSON lines
    #[arg(short, long)]
    json: bool,
}

fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = CliArgs::parse();

    match run(&args) {
        Ok(count) => {
            tracing::info!("wrote {} images to {}", count, args.out_dir.display());
            ExitCode::SUCCESS
        },
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("pngsplit: {}", e);
            ExitCode::FAILURE
        },
    }
}

fn load_config(args: &CliArgs) -> Result<SplitterConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => SplitterConfig::default(),
    };
    // Flags can only switch options on
    config.indexed |= args.indexed;
    config.verify_crc |= args.verify_crc;
    Ok(config)
}

fn run(args: &CliArgs) -> Result<usize, Box<dyn std::error::Error>> {
    let config = load_config(args)?;
    tracing::debug!("config: {:?}", config);

    let input: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(File::open(path)?),
        None => Box::new(io::stdin().lock()),
    };

    fs::create_dir_all(&args.out_dir)?;

    let reader = SplitReader::with_config(input, config).with_block_size(args.block_size);
    let mut count = 0;
    for event in reader {
        let event = event?;
        if args.json {
            println!("{}", serde_json::to_string(&event)?);
        } else {
            print_event(&event);
        }

        if let Event::Image(bytes) = event {
            count += 1;
            write_image(&args.out_dir, &args.prefix, count, &bytes)?;
        }
    }

    Ok(count)
}

fn write_image(dir: &Path, prefix: &str, index: usize, bytes: &[u8]) -> io::Result<()> {
    let path = dir.join(format!("{}{}.png", prefix, index));
    fs::write(&path, bytes)?;
    tracing::debug!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

fn print_event(event: &Event) {
    match event {
        Event::Format(format) => {
            println!(
                "format: {}x{} {:?} depth {}{}",
                format.width,
                format.height,
                format.color_space,
                format.bit_depth,
                if format.animated {
                    format!(", {} frames, repeat {:?}", format.num_frames, format.repeat_count)
                } else {
                    String::new()
                }
            );
        },
        Event::Metadata(meta) => {
            for (key, value) in meta {
                println!("  {}: {}", key, value);
            }
        },
        Event::Frame(frame) => {
            println!(
                "frame {}: {}x{} at ({}, {}) delay {}ms",
                frame.sequence_number, frame.width, frame.height, frame.x, frame.y, frame.delay_ms
            );
        },
        Event::ImageData(_) => {},
        Event::Image(bytes) => {
            println!("image: {} bytes", bytes.len());
        },
    }
}
