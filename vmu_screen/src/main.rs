/*!
# VMU Screen Converter

Converts between Dreamcast VMU screen commands (the block-write command for the
48x32 LCD, as hex words) and 1-bit bitmap files.

## Usage

### Image to command
```bash
vmu-screen encode icon.png --maple-index 1
vmu-screen encode screen.bmp --screen-only --output-endian little
```

### Command to image
```bash
vmu-screen decode "0C010032 00000004 00000000 ..." --output screen.bmp
vmu-screen decode --input command.txt --invert
```

### Defaults
```bash
vmu-screen sample --bitmap default.bmp
vmu-screen config --output vmu-screen.toml
```

Logging goes to stderr; stdout only carries command text.
*/

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use screen_codec::Endianness;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod convert;
mod raster;

use config::AppConfig;

#[derive(Parser)]
#[command(name = "vmu-screen")]
#[command(about = "Convert between VMU screen commands and 48x32 monochrome bitmaps")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to ./vmu-screen.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a 48x32 monochrome bitmap (or any other image) to a command
    Encode {
        /// Path to a bitmap or other image file
        image: PathBuf,

        /// Keep raw pixel polarity
        #[arg(long)]
        invert: bool,

        /// Output screen data only, without the frame header
        #[arg(long)]
        screen_only: bool,

        /// The maple/player index to send this command to [0,3]
        #[arg(long)]
        maple_index: Option<usize>,

        /// Per-word format template (default: %02X%02X%02X%02X)
        #[arg(long)]
        format: Option<String>,

        /// Output endian: big or little (default: big)
        #[arg(long)]
        output_endian: Option<Endianness>,

        /// Luma threshold for white pixels when converting non-bitmap images (no dithering)
        #[arg(long)]
        threshold: Option<u8>,

        /// Save the intermediate bitmap next to a non-bitmap image
        #[arg(long)]
        keep_bitmap: bool,

        /// Write the command to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert a command to a monochrome bitmap
    Decode {
        /// The screen command (must start with "0CXXXX32 00000004 00000000" unless --screen-only)
        command: Option<String>,

        /// Read the command from a file ("-" for stdin)
        #[arg(short, long, conflicts_with = "command")]
        input: Option<PathBuf>,

        /// Keep raw pixel polarity
        #[arg(long)]
        invert: bool,

        /// Output bitmap path (default: screen.bmp)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Input endian: big or little (default: big)
        #[arg(long)]
        input_endian: Option<Endianness>,

        /// Input holds screen data only, without the frame header
        #[arg(long)]
        screen_only: bool,
    },

    /// Print the built-in default VMU screen as a command
    Sample {
        /// Also write the screen as a bitmap
        #[arg(long)]
        bitmap: Option<PathBuf>,
    },

    /// Generate configuration file
    Config {
        /// Output path for configuration file
        #[arg(short, long, default_value = config::DEFAULT_CONFIG_FILE)]
        output: PathBuf,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging to stderr keeps stdout clean for command text
    let default_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Encode {
            image,
            invert,
            screen_only,
            maple_index,
            format,
            output_endian,
            threshold,
            keep_bitmap,
            output,
        } => {
            let mut config = AppConfig::resolve(cli.config.as_deref())?.encode;
            config.invert |= invert;
            config.screen_only |= screen_only;
            config.keep_bitmap |= keep_bitmap;
            if let Some(maple_index) = maple_index {
                config.maple_index = maple_index;
            }
            if let Some(format) = format {
                config.format = format;
            }
            if let Some(output_endian) = output_endian {
                config.output_endian = output_endian;
            }
            if let Some(threshold) = threshold {
                config.threshold = threshold;
            }

            let command = convert::encode_image_file(&image, &config)?;
            emit_command(&command, output)
        }

        Commands::Decode {
            command,
            input,
            invert,
            output,
            input_endian,
            screen_only,
        } => {
            let mut config = AppConfig::resolve(cli.config.as_deref())?.decode;
            config.invert |= invert;
            config.screen_only |= screen_only;
            if let Some(output) = output {
                config.output = output;
            }
            if let Some(input_endian) = input_endian {
                config.input_endian = input_endian;
            }

            let text = read_command_text(command, input)?;
            convert::decode_to_file(&text, &config)
        }

        Commands::Sample { bitmap } => {
            let config = AppConfig::resolve(cli.config.as_deref())?;
            let command = convert::sample_command(&config.encode)?;
            if let Some(path) = bitmap {
                convert::write_sample_bitmap(&path, config.decode.invert)?;
            }
            emit_command(&command, None)
        }

        Commands::Config { output } => generate_config_file(output),
    }
}

/// Command text from the argument, a file, or stdin
fn read_command_text(command: Option<String>, input: Option<PathBuf>) -> Result<String> {
    if let Some(command) = command {
        return Ok(command);
    }

    match input {
        Some(path) if path.as_os_str() != "-" => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read command file: {}", path.display())),
        _ => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read command from stdin")?;
            Ok(text)
        }
    }
}

fn emit_command(command: &str, output: Option<PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(&path, format!("{command}\n"))
                .with_context(|| format!("Failed to write command file: {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => println!("{command}"),
    }
    Ok(())
}

/// Generate a default configuration file
fn generate_config_file(output_path: PathBuf) -> Result<()> {
    let config = AppConfig::new();
    config.save_to_file(&output_path)?;

    println!("✅ Generated configuration file: {}", output_path.display());
    println!("📝 Edit the file to customize settings, then run:");
    println!("   vmu-screen --config {} encode <IMAGE>", output_path.display());

    Ok(())
}
