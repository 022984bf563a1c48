//! Human-readable report output

use std::io::Write;

use crate::config::REPORT_BAR_WIDTH;
use crate::report::diff::GroupDiff;
use crate::report::grouping::Group;
use crate::report::ranges::Filter;

#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    pub filter: Filter,
    /// Show the last version tested for each package
    pub last: bool,
}

/// One section per major runtime version, one block per OS run
pub fn write_report(
    out: &mut dyn Write,
    groups: &[Group],
    options: &ReportOptions,
) -> std::io::Result<()> {
    let bar = "=".repeat(REPORT_BAR_WIDTH);

    for group in groups {
        write!(out, "\n{bar}\nnode version {}\n{bar}", group.major)?;

        for member in &group.members {
            let meta = &member.summary.meta;
            write!(out, "\n{} {} commit {}", meta.package, meta.version, meta.commit)?;
            write!(
                out,
                "\n node {} on {} {} at {}",
                meta.node, meta.os.id, meta.os.version, meta.timestamp
            )?;
            write!(out, "\n {} branch: {} et: {}", meta.package, meta.branch, meta.elapsed())?;
            write!(out, "\n{}", meta.versions_text())?;
            write!(out, "\npackages:\n")?;

            for (name, package) in &member.summary.packages {
                write!(out, "\n{}", name)?;
                if options.last {
                    write!(out, " (last tested: {})", package.latest)?;
                }
                for line in options.filter.lines(&package.ranges) {
                    write!(out, "\n  {}", line)?;
                }
            }

            writeln!(out)?;
        }
    }

    Ok(())
}

/// Differences against the baseline; with `verbose` also every package's text
pub fn write_differences(
    out: &mut dyn Write,
    diff: &GroupDiff,
    verbose: bool,
) -> std::io::Result<()> {
    if verbose {
        write!(out, "\nfor node version {}:\n", diff.node)?;
        write!(out, "  base is {} others are {}", diff.base_os, diff.others.join(", "))?;
        for (name, text) in &diff.supported {
            write!(out, "\n{} {}", name, text)?;
        }
        writeln!(out)?;
    }

    if !diff.differences.is_empty() {
        write!(out, "\nWARNING - differences for node version {}", diff.major)?;
        for name in &diff.differences {
            let text = diff.supported.get(name).map(String::as_str).unwrap_or_default();
            write!(out, "\n - {} {}", name, text)?;
        }
        writeln!(out)?;
    }

    Ok(())
}
