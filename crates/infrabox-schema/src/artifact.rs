use serde::{Deserialize, Serialize};
use std::fmt;

/// A configuration file generated into every environment directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    Variables,
    Main,
    Outputs,
    Provider,
}

impl Artifact {
    /// Render order. Variables come first so a partially written directory
    /// still carries its address-block declaration.
    pub const ALL: [Artifact; 4] = [
        Artifact::Variables,
        Artifact::Main,
        Artifact::Outputs,
        Artifact::Provider,
    ];

    pub fn file_name(self) -> &'static str {
        match self {
            Artifact::Variables => "variables.tf",
            Artifact::Main => "main.tf",
            Artifact::Outputs => "outputs.tf",
            Artifact::Provider => "provider.tf",
        }
    }

    pub fn template_name(self) -> &'static str {
        match self {
            Artifact::Variables => "variables.tf.hbs",
            Artifact::Main => "main.tf.hbs",
            Artifact::Outputs => "outputs.tf.hbs",
            Artifact::Provider => "provider.tf.hbs",
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}
