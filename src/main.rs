use changetrack::config::Args;
use changetrack::engine::ScanEngine;
use changetrack::report;
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else if args.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    // Logs go to stderr so stdout carries only the report.
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let engine = match ScanEngine::from_args(&args) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Failed to initialize: {}", e);
            std::process::exit(1);
        }
    };

    if let Some(path) = &args.forget {
        match engine.forget(path) {
            Ok(true) => println!("No longer tracking {}", path),
            Ok(false) => println!("{} was not tracked", path),
            Err(e) => {
                error!("Failed to forget {}: {}", path, e);
                std::process::exit(1);
            }
        }
    }

    if args.list {
        match engine.tracked() {
            Ok(snapshots) => print!("{}", report::render_tracked(&snapshots)),
            Err(e) => {
                error!("Failed to load scan history: {}", e);
                std::process::exit(1);
            }
        }
    }

    let mut failed = 0;
    for path in &args.paths {
        match engine.scan_directory(path) {
            Ok(changes) => {
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&changes)?);
                } else {
                    print!("{}", report::render_text(&changes));
                }
            }
            Err(e) => {
                error!("Scan of {} failed: {}", path, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        error!("{} of {} scans failed.", failed, args.paths.len());
        std::process::exit(1);
    }

    if args.dry_run && !args.paths.is_empty() {
        info!("Dry run: scan history left untouched.");
    }

    Ok(())
}
