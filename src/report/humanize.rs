//! The full report pipeline: summary files in, text report and templates out

use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::DEFAULT_BASELINE_OS;
use crate::report::diff::diff_group;
use crate::report::error::ReportError;
use crate::report::files::{collect_paths, dedupe_latest, load_summaries, select_summary_files};
use crate::report::grouping::{Group, group_by_major};
use crate::report::ranges::Filter;
use crate::report::template::Template;
use crate::report::text::{ReportOptions, write_differences, write_report};

#[derive(Debug, Clone)]
pub struct HumanizeOptions {
    /// Keep every file for an (OS, major runtime version) pair
    pub duplicates: bool,
    /// Merge adjacent same-OS files instead of keeping only the latest
    pub merge_duplicates: bool,
    pub fold_over_skips: bool,
    pub verbose: bool,
    pub report: ReportOptions,
    pub baseline_os: String,
    /// Template to fill per major runtime version
    pub template: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Default for HumanizeOptions {
    fn default() -> Self {
        Self {
            duplicates: false,
            merge_duplicates: false,
            fold_over_skips: true,
            verbose: false,
            report: ReportOptions::default(),
            baseline_os: DEFAULT_BASELINE_OS.to_string(),
            template: None,
            output_dir: PathBuf::from("."),
        }
    }
}

impl HumanizeOptions {
    pub fn filter(&self) -> &Filter {
        &self.report.filter
    }
}

/// Load, order, dedupe or merge, and group the summaries under `paths`
pub async fn load_groups(
    paths: &[PathBuf],
    options: &HumanizeOptions,
) -> Result<Vec<Group>, ReportError> {
    let candidates = collect_paths(paths).await?;
    let mut files = select_summary_files(&candidates)?;
    if !options.duplicates && !options.merge_duplicates {
        files = dedupe_latest(files);
    }
    info!("{} summary files selected", files.len());

    let mut groups = group_by_major(load_summaries(files).await?);
    for group in &mut groups {
        if options.merge_duplicates {
            group.merge_duplicates();
        }
        // showing skips overrides folding
        if options.fold_over_skips && !options.filter().skip {
            group.fold_over_skips();
        }
    }
    Ok(groups)
}

/// Run the whole pipeline, writing the text report to `out`.
///
/// Returns the template files written, if a template was given.
pub async fn humanize(
    paths: &[PathBuf],
    options: &HumanizeOptions,
    out: &mut dyn Write,
) -> Result<Vec<PathBuf>, ReportError> {
    let groups = load_groups(paths, options).await?;
    write_report(out, &groups, &options.report)?;

    let Some(template_path) = &options.template else {
        return Ok(Vec::new());
    };
    let template = read_template(template_path).await?;

    let mut diffs = Vec::with_capacity(groups.len());
    for group in &groups {
        let diff = diff_group(group, &options.baseline_os)?;
        write_differences(out, &diff, options.verbose)?;
        diffs.push(diff);
    }

    let mut written = Vec::with_capacity(diffs.len());
    for diff in &diffs {
        let rendered = template.render(&diff.supported);
        written.push(rendered.write_to(&options.output_dir, diff.major).await?);
    }
    Ok(written)
}

async fn read_template(path: &Path) -> Result<Template, ReportError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(Template::parse(&text))
}
