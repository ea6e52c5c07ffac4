use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;
use std::io::Write;
use std::path::Path;

mod analysis;
mod cli;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    // Set up logging level
    let filter = match args.verbosity {
        cli::LogLevel::Silent => "off",
        cli::LogLevel::Normal => "info",
        cli::LogLevel::Verbose => "debug",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(filter)).init();

    info!("Running Euro problem with {} prior", args.prior);
    let posterior = analysis::run(&args)?;

    if let Some(out) = &args.out {
        let out_path = Path::new(out);
        if out_path.exists() {
            anyhow::bail!("Output file already exists: {}", out);
        }
        analysis::write_grids(out_path, &posterior)?;
    }

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    match args.format {
        cli::Format::Text => analysis::write_text(&mut handle, &posterior.summary)?,
        cli::Format::Json => {
            serde_json::to_writer_pretty(&mut handle, &posterior.summary)?;
            writeln!(handle)?;
        }
    }
    Ok(())
}
