use super::{colorize_status, json_pretty, EXIT_SUCCESS};
use infrabox_core::{Engine, EnvSummary};
use infrabox_store::DeclarationSource;

pub fn run(engine: &Engine, json: bool) -> Result<u8, String> {
    let envs = engine.list().map_err(|e| e.to_string())?;
    if json {
        println!("{}", json_pretty(&envs)?);
    } else if envs.is_empty() {
        println!("no environments found in {}", engine.environments_root().display());
    } else {
        println!("{:<16} {:<20} {:<20} SOURCE", "NAME", "NETWORK", "SUBNET");
        for env in &envs {
            println!(
                "{:<16} {:<20} {:<20} {}",
                env.name,
                join_blocks(env, true),
                join_blocks(env, false),
                source_label(env)
            );
        }
    }
    Ok(EXIT_SUCCESS)
}

fn join_blocks(env: &EnvSummary, network: bool) -> String {
    let Some(decl) = &env.declaration else {
        return "-".to_owned();
    };
    let blocks = if network { &decl.network } else { &decl.subnet };
    if blocks.is_empty() {
        "-".to_owned()
    } else {
        blocks.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
    }
}

fn source_label(env: &EnvSummary) -> String {
    match env.declaration.as_ref().map(|d| d.source) {
        Some(DeclarationSource::Record) => colorize_status("record"),
        Some(DeclarationSource::VariablesFile) => colorize_status("variables"),
        None => "none".to_owned(),
    }
}
