use super::{colorize_status, json_pretty, EXIT_FAILURE, EXIT_SUCCESS};
use infrabox_core::{Config, Engine};
use serde::Serialize;

pub fn run(config: &Config, json_output: bool) -> Result<u8, String> {
    let mut checks: Vec<Check> = Vec::new();

    checks.push(Check::info(
        "config",
        &format!(
            "driver '{}', environments in {}",
            config.driver,
            config.environments_dir.display()
        ),
    ));
    check_prereqs(config, &mut checks);

    match Engine::from_config(config) {
        Ok(engine) => {
            checks.push(Check::pass(
                "engine",
                &format!("templates loaded ({:?})", engine.renderer().source()),
            ));
            check_environments(&engine, &mut checks);
        }
        Err(e) => checks.push(Check::fail("engine", &format!("cannot set up: {e}"))),
    }

    print_results(&checks, json_output)
}

fn check_prereqs(config: &Config, checks: &mut Vec<Check>) {
    if config.driver != "terraform" {
        checks.push(Check::info(
            "prereqs",
            &format!("driver '{}' does not need terraform", config.driver),
        ));
        return;
    }
    let missing = infrabox_runtime::check_prereqs(&config.terraform_bin);
    if missing.is_empty() {
        checks.push(Check::pass(
            "prereqs",
            &format!("{} found", config.terraform_bin),
        ));
    } else {
        checks.push(Check::fail(
            "prereqs",
            &infrabox_runtime::format_missing(&missing),
        ));
    }
}

fn check_environments(engine: &Engine, checks: &mut Vec<Check>) {
    let root = engine.environments_root();
    if !root.is_dir() {
        checks.push(Check::info(
            "environments",
            &format!("{} does not exist yet (created by initialize)", root.display()),
        ));
        return;
    }

    let envs = match engine.list() {
        Ok(envs) => envs,
        Err(e) => {
            checks.push(Check::fail("environments", &format!("cannot list: {e}")));
            return;
        }
    };
    checks.push(Check::pass(
        "environments",
        &format!("{} environments in {}", envs.len(), root.display()),
    ));

    for env in &envs {
        match &env.declaration {
            None => checks.push(Check::warn(
                "declarations",
                &format!(
                    "'{}' declares no address blocks and is ignored by the overlap check",
                    env.name
                ),
            )),
            Some(decl) if !decl.skipped.is_empty() => checks.push(Check::warn(
                "declarations",
                &format!(
                    "'{}' has unparsable address blocks: {}",
                    env.name,
                    decl.skipped.join(", ")
                ),
            )),
            Some(_) => {}
        }
    }

    match engine.overlap_audit() {
        Ok(conflicts) if conflicts.is_empty() => {
            checks.push(Check::pass("overlaps", "no overlapping address blocks"));
        }
        Ok(conflicts) => {
            for conflict in conflicts {
                checks.push(Check::fail("overlaps", &conflict.to_string()));
            }
        }
        Err(e) => checks.push(Check::fail("overlaps", &format!("audit failed: {e}"))),
    }
}

fn print_results(checks: &[Check], json_output: bool) -> Result<u8, String> {
    let healthy = checks.iter().all(|c| c.status != Status::Fail);
    if json_output {
        let json = serde_json::json!({
            "healthy": healthy,
            "checks": checks,
        });
        println!("{}", json_pretty(&json)?);
    } else {
        println!("infrabox doctor\n");
        for check in checks {
            let icon = match check.status {
                Status::Pass => "✓",
                Status::Fail => "✗",
                Status::Warn => "⚠",
                Status::Info => "ℹ",
            };
            println!("  {icon} {:<13} {}", check.name, check.message);
        }
        println!();
        if healthy {
            println!("{}", colorize_status("pass"));
        } else {
            println!("{}: see above for details", colorize_status("fail"));
        }
    }
    Ok(if healthy { EXIT_SUCCESS } else { EXIT_FAILURE })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Pass,
    Warn,
    Fail,
    Info,
}

#[derive(Debug, Serialize)]
struct Check {
    name: &'static str,
    status: Status,
    message: String,
}

impl Check {
    fn new(name: &'static str, status: Status, message: &str) -> Self {
        Self {
            name,
            status,
            message: message.to_owned(),
        }
    }

    fn pass(name: &'static str, message: &str) -> Self {
        Self::new(name, Status::Pass, message)
    }

    fn warn(name: &'static str, message: &str) -> Self {
        Self::new(name, Status::Warn, message)
    }

    fn fail(name: &'static str, message: &str) -> Self {
        Self::new(name, Status::Fail, message)
    }

    fn info(name: &'static str, message: &str) -> Self {
        Self::new(name, Status::Info, message)
    }
}
