mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{TerminalPrompter, EXIT_FAILURE};
use infrabox_core::{
    install_signal_handler, CancelToken, Config, DefaultsPrompter, Engine, InitOptions,
    ParamOverrides, Prompter,
};
use infrabox_runtime::{check_prereqs, format_missing, Action};
use infrabox_schema::EnvName;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;

#[derive(Debug, Parser)]
#[command(
    name = "infrabox",
    version,
    about = "Scaffold and manage Terraform environments with network overlap guards"
)]
struct Cli {
    /// Project root holding infrabox.toml and the environments directory.
    #[arg(long, default_value = ".", global = true)]
    root: String,

    /// Configuration file (default: <root>/infrabox.toml if present).
    #[arg(long, global = true)]
    config: Option<String>,

    /// Provisioning driver: terraform or mock (overrides the config file).
    #[arg(long, env = "INFRABOX_DRIVER", global = true)]
    driver: Option<String>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Scaffold a new environment directory and validate it.
    Initialize {
        /// Environment name (free text, sanitized).
        #[arg(default_value = "dev")]
        environment: String,
        /// Describe what would happen without writing files or running terraform.
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        /// Accept every default without prompting.
        #[arg(long, default_value_t = false)]
        defaults: bool,
        #[arg(long)]
        name_prefix: Option<String>,
        /// Azure location.
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        dns_zone: Option<String>,
        #[arg(long)]
        admin_username: Option<String>,
        /// Path to the SSH public key installed on the VM.
        #[arg(long)]
        ssh_key: Option<String>,
        /// VNet address block, e.g. 10.0.0.0/16.
        #[arg(long)]
        network_cidr: Option<String>,
        /// Subnet address block; must lie inside the VNet.
        #[arg(long)]
        subnet_cidr: Option<String>,
    },
    /// Plan and apply an environment's infrastructure.
    Create {
        /// One of dev, stage, prod.
        #[arg(value_parser = EnvName::known)]
        environment: EnvName,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// Plan and apply the destruction of an environment's infrastructure.
    Destroy {
        /// One of dev, stage, prod.
        #[arg(value_parser = EnvName::known)]
        environment: EnvName,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
    },
    /// List initialized environments and their address blocks.
    List,
    /// Show an environment's record, files, and declared address blocks.
    Inspect { environment: String },
    /// Check prerequisites, configuration, and overlaps between environments.
    Doctor,
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("INFRABOX_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .init();

    match dispatch(cli) {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn dispatch(cli: Cli) -> Result<u8, String> {
    let root = expand_tilde(&cli.root);
    let json = cli.json;
    let config = || {
        let explicit = cli.config.as_deref().map(expand_tilde);
        let mut config = Config::discover(&root, explicit.as_deref()).map_err(|e| e.to_string())?;
        if let Some(driver) = cli.driver.as_deref() {
            driver.clone_into(&mut config.driver);
        }
        Ok::<_, String>(config)
    };

    match cli.command {
        Commands::Initialize {
            environment,
            dry_run,
            defaults,
            name_prefix,
            location,
            dns_zone,
            admin_username,
            ssh_key,
            network_cidr,
            subnet_cidr,
        } => {
            let engine = build_engine(&config()?, !dry_run)?;
            let options = InitOptions {
                dry_run,
                overrides: ParamOverrides {
                    name_prefix,
                    location,
                    dns_zone_name: dns_zone,
                    admin_username,
                    ssh_public_key_path: ssh_key,
                    network_cidr,
                    subnet_cidr,
                },
            };
            let prompter: Box<dyn Prompter> = if defaults {
                Box::new(DefaultsPrompter)
            } else {
                Box::new(TerminalPrompter::detect())
            };
            commands::initialize::run(&engine, &environment, prompter.as_ref(), &options, json)
        }
        Commands::Create {
            environment,
            dry_run,
        } => commands::apply::run(
            &build_engine(&config()?, !dry_run)?,
            environment.as_str(),
            Action::Apply,
            &TerminalPrompter::detect(),
            dry_run,
            json,
        ),
        Commands::Destroy {
            environment,
            dry_run,
        } => commands::apply::run(
            &build_engine(&config()?, !dry_run)?,
            environment.as_str(),
            Action::Destroy,
            &TerminalPrompter::detect(),
            dry_run,
            json,
        ),
        Commands::List => commands::list::run(&build_engine(&config()?, false)?, json),
        Commands::Inspect { environment } => {
            commands::inspect::run(&build_engine(&config()?, false)?, &environment, json)
        }
        Commands::Doctor => commands::doctor::run(&config()?, json),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    }
}

/// Build the engine and route Ctrl-C into its cancel token. With
/// `needs_driver`, fail early when the provisioning tool is missing.
fn build_engine(config: &Config, needs_driver: bool) -> Result<Engine, String> {
    let token = CancelToken::new();
    install_signal_handler(&token);
    let engine = Engine::from_config(config)
        .map_err(|e| e.to_string())?
        .with_cancel_token(token);
    debug!(
        "driver '{}' over {}",
        engine.driver().name(),
        engine.environments_root().display()
    );
    if needs_driver && !engine.driver().available() {
        return Err(format_missing(&check_prereqs(&config.terraform_bin)));
    }
    Ok(engine)
}

fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home).join(stripped);
        }
    }
    PathBuf::from(path)
}
