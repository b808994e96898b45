use clap::Parser;
use clap::builder::{PossibleValuesParser, TypedValueParser};
use photo_watermark::config::{self, ConfigOverrides};
use photo_watermark::imaging::{Anchor, FontSelector, MAX_FONT_SIZE};
use photo_watermark::output;
use photo_watermark::process::{self, RunContext};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn version_string() -> &'static str {
    let hash = env!("PW_GIT_HASH");
    if hash.is_empty() {
        return env!("CARGO_PKG_VERSION");
    }
    let dirty = if env!("PW_GIT_DIRTY") == "true" {
        "-dirty"
    } else {
        ""
    };
    // Leaked once at startup
    Box::leak(format!("{}+{}{}", env!("CARGO_PKG_VERSION"), hash, dirty).into_boxed_str())
}

#[derive(Parser)]
#[command(name = "photo-watermark")]
#[command(about = "Stamp photos with the date they were taken")]
#[command(long_about = "\
Stamp photos with the date they were taken

Every .jpg .jpeg .png .tif .tiff .bmp file directly inside INPUT_DIR gets a
shadowed date label such as 2023年05月01日. Results are written with the same
file names to a sibling directory named <INPUT_DIR>_watermark; originals are
never modified.

Date resolution (first available wins):
  EXIF DateTime → DateTimeOriginal → DateTimeDigitized
  → file modification time → today

Settings are read from INPUT_DIR/watermark.toml when present (or the file
given with --config). Flags override the file.

Run 'photo-watermark --gen-config' to print a documented watermark.toml.
Set RUST_LOG=debug to see font selection and label placement.")]
#[command(version = version_string())]
struct Cli {
    /// Directory of photos to watermark
    #[arg(required_unless_present = "gen_config")]
    input_dir: Option<PathBuf>,

    /// Label height in pixels, 1-1000 [default: 24]
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=MAX_FONT_SIZE as i64))]
    font_size: Option<u32>,

    /// Label color: a name (white, black, red, ...) or #RGB / #RRGGBB [default: white]
    #[arg(long)]
    color: Option<String>,

    /// Label position [default: bottom-right]
    #[arg(
        long,
        value_parser = PossibleValuesParser::new(Anchor::names())
            .map(|name| Anchor::from_name_or_default(&name))
    )]
    position: Option<Anchor>,

    /// Config file to use instead of INPUT_DIR/watermark.toml
    #[arg(long)]
    config: Option<PathBuf>,

    /// Resolve and print dates without writing any files
    #[arg(long)]
    dry_run: bool,

    /// Print a stock watermark.toml with all options documented
    #[arg(long)]
    gen_config: bool,
}

fn main() -> ExitCode {
    init_logging();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.gen_config {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }
    let Some(input_dir) = cli.input_dir else {
        return Ok(());
    };
    process::ensure_input_dir(&input_dir)?;

    let overrides = ConfigOverrides {
        font_size: cli.font_size,
        color: cli.color,
        position: cli.position,
    };
    let config = config::load_config(&input_dir, cli.config.as_deref(), &overrides)?;
    let ctx = RunContext::new(&input_dir, &config, &FontSelector::system(), cli.dry_run)?;

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_process_event(&event);
        }
    });
    let result = process::run(&ctx, Some(tx));
    printer.join().map_err(|_| "output thread panicked")?;

    let summary = result?;
    output::print_summary(&summary, &ctx.output_dir);
    Ok(())
}

/// Diagnostics go to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
