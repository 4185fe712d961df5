use super::{colorize_status, json_pretty, report_error, EXIT_SUCCESS};
use infrabox_core::{Engine, InitOptions, InitReport, InitStatus, Prompter};

pub fn run(
    engine: &Engine,
    environment: &str,
    prompter: &dyn Prompter,
    options: &InitOptions,
    json: bool,
) -> Result<u8, String> {
    let report = match engine.initialize(environment, prompter, options) {
        Ok(report) => report,
        Err(e) => return report_error(&e, "initialization", environment),
    };

    if json {
        println!("{}", json_pretty(&report)?);
        return Ok(EXIT_SUCCESS);
    }

    match report.status {
        InitStatus::AlreadyInitialized => {
            println!(
                "Environment files for environment '{}' already exist. Aborting.",
                report.environment
            );
        }
        InitStatus::DryRun => print_dry_run(&report),
        InitStatus::Created => {
            println!(
                "{} environment '{}' at {}",
                colorize_status("created"),
                report.environment,
                report.path.display()
            );
            for rendered in &report.rendered {
                println!("  {}", rendered.artifact);
            }
            println!(
                "Initialization and validation complete. Next: infrabox create {}",
                report.environment
            );
        }
    }
    Ok(EXIT_SUCCESS)
}

fn print_dry_run(report: &InitReport) {
    println!(
        "{}: would create {}",
        colorize_status("dry run"),
        report.path.display()
    );
    for rendered in &report.rendered {
        println!("--- {} (not written) ---", rendered.path.display());
        print!("{}", rendered.content);
        if !rendered.content.ends_with('\n') {
            println!();
        }
    }
}
