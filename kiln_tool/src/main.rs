use std::{io, path::PathBuf};

use clap::Parser;
use color_eyre as ey;
use ey::eyre::{bail, Context};
use kiln_content::{config::DEFAULT_CONFIG_FILE_NAME, output::WriteOutcome, pipeline, ManifestConfig};
use kiln_shared::log::{self, info};

/// Compiles the asset directory into the visual asset manifest
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct CommandLineArguments {
    /// Configuration file. The defaults are used when it doesn't exist.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE_NAME)]
    config: PathBuf,

    /// Only check whether the manifest is up to date without writing it
    #[arg(long)]
    check: bool,

    /// Maximum level of the log messages
    #[arg(short, long, default_value = "info")]
    log_level: log::LevelFilter,
}

fn main() -> ey::Result<()> {
    let command_line_arguments = CommandLineArguments::parse();

    // Setup logging
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                kiln_shared::chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(command_line_arguments.log_level)
        .chain(io::stdout())
        .apply()
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;

    let config = ManifestConfig::load(&command_line_arguments.config).wrap_err("Failed to load the configuration")?;

    if command_line_arguments.check {
        let up_to_date = pipeline::check(&config).wrap_err("Failed to compile the manifest")?;
        if !up_to_date {
            bail!("Manifest '{}' is out of date", config.output_path.display());
        }
        info!("Manifest '{}' is up to date", config.output_path.display());
        return Ok(());
    }

    let report = pipeline::compile(&config).wrap_err("Failed to compile the manifest")?;
    match report.outcome {
        WriteOutcome::Written => info!(
            "Wrote {} identifiers with {} frames to '{}'",
            report.identifiers,
            report.frames,
            config.output_path.display()
        ),
        WriteOutcome::Unchanged => info!("Manifest '{}' didn't change", config.output_path.display()),
    }
    Ok(())
}
