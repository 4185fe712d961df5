use super::{colorize_status, json_pretty, report_error, EXIT_SUCCESS};
use infrabox_core::{ApplyOutcome, ApplyReport, Engine, PlanReport, Prompter};
use infrabox_runtime::{Action, PlanStatus};

pub fn run(
    engine: &Engine,
    environment: &str,
    action: Action,
    prompter: &dyn Prompter,
    dry_run: bool,
    json: bool,
) -> Result<u8, String> {
    let result = engine
        .plan(environment, action, dry_run)
        .and_then(|planned| {
            if let Some(verdict) = plan_verdict(&planned) {
                // keep stdout parseable under --json
                if json {
                    eprintln!("{verdict}");
                } else {
                    println!("{verdict}");
                }
            }
            engine.apply_plan(&planned, prompter)
        });
    let report = match result {
        Ok(report) => report,
        Err(e) => return report_error(&e, &action.to_string(), environment),
    };

    if json {
        println!("{}", json_pretty(&report)?);
    } else {
        print_outcome(&report);
    }
    Ok(EXIT_SUCCESS)
}

/// What the plan found, announced before any confirmation is asked. A
/// dry-run plan only described itself, so it has nothing to announce.
fn plan_verdict(planned: &PlanReport) -> Option<&'static str> {
    if planned.dry_run {
        return None;
    }
    match planned.status {
        PlanStatus::ChangesPending => Some("Changes detected."),
        PlanStatus::NoChanges => Some("No changes detected."),
        PlanStatus::Failed => None,
    }
}

fn print_outcome(report: &ApplyReport) {
    let env = &report.environment;
    let action = report.action;
    match report.outcome {
        ApplyOutcome::NoChanges => {
            println!("{}: environment '{env}' is up to date", colorize_status("no changes"));
        }
        ApplyOutcome::PlanFailed => {
            println!(
                "{}: plan for environment '{env}' reported an error; nothing was applied",
                colorize_status("failed")
            );
        }
        ApplyOutcome::Declined => {
            println!("{}: {action} of environment '{env}' cancelled", colorize_status("declined"));
        }
        ApplyOutcome::Applied => {
            let verb = if action.is_destroy() { "destroyed" } else { "applied" };
            println!("{}: environment '{env}' {verb}", colorize_status("applied"));
        }
        ApplyOutcome::DryRun => {
            println!(
                "{}: {action} of environment '{env}' described, nothing executed",
                colorize_status("dry run")
            );
        }
    }
}
