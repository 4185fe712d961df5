//! Terraform file rendering.
//!
//! Templates are Handlebars files named `<artifact>.tf.hbs`. The built-in set
//! is compiled into the binary; a configured directory replaces it wholesale
//! and must provide all four templates.

use handlebars::Handlebars;
use infrabox_schema::Artifact;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

const BUILTIN: [(Artifact, &str); 4] = [
    (
        Artifact::Variables,
        include_str!("../../../templates/variables.tf.hbs"),
    ),
    (Artifact::Main, include_str!("../../../templates/main.tf.hbs")),
    (
        Artifact::Outputs,
        include_str!("../../../templates/outputs.tf.hbs"),
    ),
    (
        Artifact::Provider,
        include_str!("../../../templates/provider.tf.hbs"),
    ),
];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("template I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("template '{template}' not found in {}", dir.display())]
    Missing { template: String, dir: PathBuf },
    #[error("invalid template '{template}': {message}")]
    Invalid { template: String, message: String },
    #[error("failed to render '{template}': {message}")]
    Render { template: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Builtin,
    Directory(PathBuf),
}

/// Renders environment artifacts. Constructed once and handed to the engine.
pub struct TemplateRenderer {
    handlebars: Handlebars<'static>,
    source: TemplateSource,
}

impl std::fmt::Debug for TemplateRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TemplateRenderer")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// Escape a value for the inside of an HCL quoted string. Interpolation
/// and directive openers are doubled so they stay literal.
pub fn escape_hcl(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", u32::from(c))),
            c => out.push(c),
        }
    }
    out
}

fn engine() -> Handlebars<'static> {
    let mut hb = Handlebars::new();
    // A missing context key is an error, never an empty string in the output.
    hb.set_strict_mode(true);
    // Every placeholder sits inside a quoted HCL string or a comment.
    hb.register_escape_fn(escape_hcl);
    hb
}

fn register(hb: &mut Handlebars<'static>, artifact: Artifact, content: &str) -> Result<(), RenderError> {
    hb.register_template_string(artifact.template_name(), content)
        .map_err(|e| RenderError::Invalid {
            template: artifact.template_name().to_owned(),
            message: e.to_string(),
        })
}

impl TemplateRenderer {
    pub fn builtin() -> Result<Self, RenderError> {
        let mut handlebars = engine();
        for (artifact, content) in BUILTIN {
            register(&mut handlebars, artifact, content)?;
        }
        Ok(Self {
            handlebars,
            source: TemplateSource::Builtin,
        })
    }

    pub fn from_dir(dir: &Path) -> Result<Self, RenderError> {
        let mut handlebars = engine();
        for artifact in Artifact::ALL {
            let path = dir.join(artifact.template_name());
            if !path.is_file() {
                return Err(RenderError::Missing {
                    template: artifact.template_name().to_owned(),
                    dir: dir.to_path_buf(),
                });
            }
            let content = std::fs::read_to_string(&path)?;
            register(&mut handlebars, artifact, &content)?;
            debug!("loaded template {}", path.display());
        }
        Ok(Self {
            handlebars,
            source: TemplateSource::Directory(dir.to_path_buf()),
        })
    }

    /// Built-in templates unless `dir` is given.
    pub fn new(dir: Option<&Path>) -> Result<Self, RenderError> {
        match dir {
            Some(dir) => Self::from_dir(dir),
            None => Self::builtin(),
        }
    }

    pub fn source(&self) -> &TemplateSource {
        &self.source
    }

    pub fn render<T: Serialize>(&self, artifact: Artifact, context: &T) -> Result<String, RenderError> {
        self.handlebars
            .render(artifact.template_name(), context)
            .map_err(|e| RenderError::Render {
                template: artifact.template_name().to_owned(),
                message: e.to_string(),
            })
    }
}
