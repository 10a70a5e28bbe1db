use crate::cli::DockArgs;
use crate::config::PartialDockingConfig;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use gridock::engine::progress::ProgressReporter;
use gridock::workflows;
use gridock::workflows::dock::DockingResult;
use tracing::{info, warn};

pub fn run(args: DockArgs) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialDockingConfig::from_file(path)?,
        None => PartialDockingConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let config = partial_config.merge_with_cli(&args)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    if config.rescue {
        println!("Resuming docking scan from {}...", config.checkpoint.dir().display());
    } else {
        println!("Starting docking scan...");
    }
    info!("Invoking the core docking workflow...");
    let result = workflows::dock::run(&config, &reporter)?;

    print_summary(&result);
    Ok(())
}

fn print_summary(result: &DockingResult) {
    let parameters = &result.parameters;
    println!(
        "Scanned {} rotation(s) on a {}^3 grid ({:.3} A cells).",
        result.rotations_scored, parameters.grid_size, parameters.cell_span
    );
    match result.ranked.first() {
        Some(best) => {
            let e = &best.entry;
            println!(
                "Best score {} at displacement ({}, {}, {}) and angles ({}, {}, {}).",
                e.score,
                e.displacement.x,
                e.displacement.y,
                e.displacement.z,
                e.angles.z_twist,
                e.angles.theta,
                e.angles.phi
            );
        }
        None => {
            warn!("The scan retained no entries.");
            println!("Warning: the scan retained no entries.");
        }
    }
    println!(
        "{} ranked entries written to: {}",
        result.ranked.len(),
        parameters.output_path.display()
    );
}
