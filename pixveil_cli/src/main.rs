use std::path::PathBuf;

use clap::{Parser, Subcommand};
use pixveil_core::{CompressionStrategy, PixVeilConfig};

/// Command-line front end for the steganography core.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Hide a file inside a folder of PNG carriers.
    Encode {
        /// File to hide.
        #[arg(long)]
        input: PathBuf,

        /// Folder of PNG carrier images to embed into.
        #[arg(long = "png-folder")]
        png_folder: PathBuf,

        /// Folder to write the resulting carrier PNGs into.
        #[arg(long)]
        output: PathBuf,

        /// Password used to derive the encryption key.
        #[arg(long)]
        password: String,

        /// Raise logging to debug.
        #[arg(short, long)]
        verbose: bool,

        /// Accepted for CLI-surface parity; debug-visual markers are not
        /// part of the core and have no effect.
        #[arg(long = "dv")]
        debug_visual: bool,
    },

    /// Recover a file previously hidden in a folder of PNG carriers.
    Decode {
        /// Folder containing the carrier PNGs.
        #[arg(long)]
        input: PathBuf,

        /// Folder to write the recovered file into.
        #[arg(long)]
        output: PathBuf,

        /// Password used to derive the decryption key.
        #[arg(long)]
        password: String,

        /// Raise logging to debug.
        #[arg(short, long)]
        verbose: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = match &args.command {
        Command::Encode { verbose, .. } | Command::Decode { verbose, .. } if *verbose => log::LevelFilter::Debug,
        _ => log::LevelFilter::Info,
    };
    let _ = env_logger::builder().filter_level(level).try_init();

    let config = PixVeilConfig::load(&PathBuf::from("pixveil.toml"))?;

    match args.command {
        Command::Encode {
            input,
            png_folder,
            output,
            password,
            debug_visual: _,
            verbose: _,
        } => pixveil_core::encode(&input, &png_folder, &output, &password, CompressionStrategy::Brotli, &config)?,
        Command::Decode {
            input,
            output,
            password,
            verbose: _,
        } => pixveil_core::decode(&input, &output, &password)?,
    };

    Ok(())
}
