use std::fmt;
use std::path::Path;
use std::process::Command;

/// A missing prerequisite with actionable install instructions.
#[derive(Debug)]
pub struct MissingPrereq {
    pub name: String,
    pub purpose: &'static str,
    pub install_hint: &'static str,
}

impl fmt::Display for MissingPrereq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "  - {}: {} (install: {})",
            self.name, self.purpose, self.install_hint
        )
    }
}

fn command_exists(name: &str) -> bool {
    if name.contains(std::path::MAIN_SEPARATOR) {
        return Path::new(name).is_file();
    }
    Command::new("which")
        .arg(name)
        .output()
        .is_ok_and(|o| o.status.success())
}

/// Check everything the Terraform driver needs.
/// Empty result means all prerequisites are met.
pub fn check_prereqs(terraform_bin: &str) -> Vec<MissingPrereq> {
    let mut missing = Vec::new();

    if !command_exists(terraform_bin) {
        missing.push(MissingPrereq {
            name: terraform_bin.to_owned(),
            purpose: "provisioning infrastructure from the generated configuration",
            install_hint: "https://developer.hashicorp.com/terraform/install, or set `terraform_bin` in infrabox.toml",
        });
    }

    missing
}

/// Format a list of missing prerequisites into a user-friendly error message.
pub fn format_missing(missing: &[MissingPrereq]) -> String {
    use std::fmt::Write as _;
    let mut msg = String::from("missing prerequisites:\n");
    for m in missing {
        let _ = writeln!(msg, "{m}");
    }
    msg.push_str("\ninfrabox needs these tools to create and destroy environments.");
    msg
}
