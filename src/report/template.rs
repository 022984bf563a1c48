//! `{{package:action}}` template rendering
//!
//! The only action is `versions`, replaced with the supported-version text
//! of the package for one major runtime version. One file is written per
//! major version: `nodejs<major>.txt`, or `nodejs<major>.err` when any
//! substitution failed so a clean earlier rendering is never overwritten.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use tokio::io::AsyncWriteExt;
use tracing::info;

use crate::report::error::ReportError;

static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([-a-zA-Z0-9_]+):([-a-zA-Z0-9_]+)\}\}").expect("valid template token pattern")
});

pub const VERSIONS_ACTION: &str = "versions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    Token { package: String, action: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        let mut position = 0;
        for caps in TOKEN_PATTERN.captures_iter(text) {
            let Some(whole) = caps.get(0) else { continue };
            segments.push(Segment::Text(text[position..whole.start()].to_string()));
            segments.push(Segment::Token {
                package: caps[1].to_string(),
                action: caps[2].to_string(),
            });
            position = whole.end();
        }
        segments.push(Segment::Text(text[position..].to_string()));
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Fill every token from `supported`; failures become `N/A` plus an error
    pub fn render(&self, supported: &IndexMap<String, String>) -> Rendered {
        let mut parts = Vec::with_capacity(self.segments.len());
        let mut errors = Vec::new();

        for segment in &self.segments {
            match segment {
                Segment::Text(text) => parts.push(text.clone()),
                Segment::Token { package, action } if action != VERSIONS_ACTION => {
                    parts.push("N/A".to_string());
                    errors.push(format!("Unknown action: {} for package: {}", action, package));
                }
                Segment::Token { package, .. } => match supported.get(package) {
                    Some(text) if !text.is_empty() => parts.push(text.clone()),
                    _ => {
                        parts.push("N/A".to_string());
                        errors.push(format!("No supported versions for {}", package));
                    }
                },
            }
        }

        Rendered { parts, errors }
    }
}

/// A template filled in for one major runtime version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub parts: Vec<String>,
    pub errors: Vec<String>,
}

impl Rendered {
    pub fn file_name(&self, major: u64) -> String {
        let extension = if self.errors.is_empty() { "txt" } else { "err" };
        format!("nodejs{}.{}", major, extension)
    }

    /// Write into `dir`, appending an `Errors:` section when substitutions failed
    pub async fn write_to(&self, dir: &Path, major: u64) -> Result<PathBuf, ReportError> {
        let path = dir.join(self.file_name(major));
        let io_error = |source| ReportError::Io {
            path: path.clone(),
            source,
        };

        let mut file = tokio::fs::File::create(&path).await.map_err(io_error)?;
        for part in &self.parts {
            file.write_all(part.as_bytes()).await.map_err(io_error)?;
        }
        if !self.errors.is_empty() {
            let trailer = format!("\nErrors:\n{}\n", self.errors.join("\n"));
            file.write_all(trailer.as_bytes()).await.map_err(io_error)?;
        }
        file.flush().await.map_err(io_error)?;

        info!("Wrote {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn supported(entries: &[(&str, &str)]) -> IndexMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parse_splits_text_and_tokens() {
        let template = Template::parse("a {{ap:versions}} b {{bson:versions}}");

        assert_eq!(
            template.segments(),
            &[
                Segment::Text("a ".to_string()),
                Segment::Token {
                    package: "ap".to_string(),
                    action: "versions".to_string()
                },
                Segment::Text(" b ".to_string()),
                Segment::Token {
                    package: "bson".to_string(),
                    action: "versions".to_string()
                },
                Segment::Text(String::new()),
            ]
        );
    }

    #[test]
    fn parse_leaves_malformed_tokens_as_text() {
        let template = Template::parse("{{ap}} {{a b:versions}}");
        assert_eq!(
            template.segments(),
            &[Segment::Text("{{ap}} {{a b:versions}}".to_string())]
        );
    }

    #[test]
    fn render_substitutes_supported_versions() {
        let rendered = Template::parse("mysql: {{mysql:versions}}\n")
            .render(&supported(&[("mysql", "2.0.0-2.16.0")]));

        assert_eq!(rendered.parts.concat(), "mysql: 2.0.0-2.16.0\n");
        assert!(rendered.errors.is_empty());
        assert_eq!(rendered.file_name(10), "nodejs10.txt");
    }

    #[test]
    fn render_records_unknown_action_and_missing_package() {
        let rendered = Template::parse("{{ap:license}} {{pg:versions}} {{empty:versions}}")
            .render(&supported(&[("ap", "1.0.0"), ("empty", "")]));

        assert_eq!(rendered.parts.concat(), "N/A N/A N/A");
        assert_eq!(
            rendered.errors,
            vec![
                "Unknown action: license for package: ap",
                "No supported versions for pg",
                "No supported versions for empty",
            ]
        );
        assert_eq!(rendered.file_name(8), "nodejs8.err");
    }

    #[tokio::test]
    async fn write_to_appends_errors_section() {
        let dir = TempDir::new().unwrap();
        let rendered = Template::parse("x={{pg:versions}}").render(&IndexMap::new());

        let path = rendered.write_to(dir.path(), 12).await.unwrap();

        assert_eq!(path, dir.path().join("nodejs12.err"));
        assert_eq!(
            std::fs::read_to_string(path).unwrap(),
            "x=N/A\nErrors:\nNo supported versions for pg\n"
        );
    }
}
