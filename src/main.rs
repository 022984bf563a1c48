use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::{Level, info, warn};

use version_matrix::config::{self, HarnessConfig};
use version_matrix::entity::{Entity, InstallContext, LoggingObserver};
use version_matrix::logging::init_logging;
use version_matrix::process::{
    CommandRunner, OutputMode, PackageManager, ProcessRunner, detect_runtime_version,
};
use version_matrix::report::{
    Filter, HumanizeOptions, ReportOptions, RunInfo, SummaryBuilder, builder, humanize,
};
use version_matrix::sequencer::{InstallLocation, Sequencer, parse_versions_file};
use version_matrix::version::matcher::NpmRangeMatcher;
use version_matrix::version::registries::NpmRegistry;

#[derive(Parser)]
#[command(name = "version-matrix")]
#[command(
    version,
    about = "Test a package against every version of its dependencies and report the supported ranges"
)]
struct Cli {
    /// Config file (defaults to <data dir>/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run every version matrix in a versions file
    Run(RunArgs),
    /// Summarize summary files as text and optionally fill a template
    Humanize(HumanizeArgs),
}

#[derive(Args)]
struct RunArgs {
    /// JSON array of version specs
    versions: PathBuf,

    /// Package under test, recorded in the summary
    #[arg(long, default_value = "")]
    package: String,

    #[arg(long, default_value = "")]
    package_version: String,

    #[arg(long, default_value = "")]
    commit: String,

    #[arg(long, default_value = "")]
    branch: String,

    /// Write a summary file into this directory
    #[arg(long)]
    summary_dir: Option<PathBuf>,

    /// Print one JSON record per tested version instead of text
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args)]
struct HumanizeArgs {
    /// Summary files or directories containing them
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Allow duplicate os-node-version matches
    #[arg(short = 'D', long)]
    duplicates: bool,

    /// What to output: [p]asses, [f]ails, [s]kips, [t]railing-fails
    #[arg(short, long, default_value = "p")]
    filter: String,

    /// Output file for the text report
    #[arg(short, long, default_value = "stdout")]
    output: String,

    /// Fill in this template once per node version
    #[arg(short, long)]
    template: Option<PathBuf>,

    /// Output the last version of each package tested
    #[arg(short, long)]
    last: bool,

    /// Write out intermediate data and information
    #[arg(short, long)]
    verbose: bool,

    /// Keep ranges separated by skips apart
    #[arg(long)]
    no_fold_over_skips: bool,

    /// Merge the summary files of each os-node combination
    #[arg(short, long)]
    merge_duplicates: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = HarnessConfig::load(cli.config.as_deref())?;

    let verbose = match &cli.command {
        Command::Run(args) => args.verbose,
        Command::Humanize(args) => args.verbose,
    };
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let log_file = config.logging.file.then(config::log_path);
    let _guard = init_logging(level, log_file.as_deref());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    match cli.command {
        Command::Run(args) => runtime.block_on(run(args, config)),
        Command::Humanize(args) => runtime.block_on(humanize_summaries(args, config)),
    }
}

async fn run(args: RunArgs, config: HarnessConfig) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(&args.versions)
        .await
        .with_context(|| format!("Failed to read {}", args.versions.display()))?;
    let specs = parse_versions_file(&content)
        .with_context(|| format!("Invalid versions file {}", args.versions.display()))?;

    let working_dir = config.working_dir();
    let runner: Arc<dyn ProcessRunner> = Arc::new(CommandRunner);
    let runtime_version = match &config.runtime.version {
        Some(version) => version.clone(),
        None => detect_runtime_version(runner.as_ref(), &config.runtime.command, &working_dir)
            .await
            .unwrap_or_else(|| {
                warn!("Could not detect the runtime version; builtins are recorded as unknown");
                "unknown".to_string()
            }),
    };
    info!("Runtime {} {}", config.runtime.command, runtime_version);

    let output = match &config.install.log_file {
        Some(path) => OutputMode::File(path.clone()),
        None if config.install.capture_output => OutputMode::Capture,
        None => OutputMode::Inherit,
    };
    let context = InstallContext::new(
        runner,
        PackageManager::new(&config.install.package_manager),
        working_dir,
    )
    .with_output(output);

    let sequencer = Sequencer::new(
        Arc::new(NpmRegistry::new(&config.registry.npm_url)),
        Arc::new(NpmRangeMatcher),
        Arc::new(InstallLocation::new(Arc::new(context))),
        runtime_version.as_str(),
    )
    .with_observer(Arc::new(LoggingObserver));

    let os = builder::detect_os().await;
    let summary = SummaryBuilder::new(
        RunInfo {
            package: args.package,
            version: args.package_version,
            commit: args.commit,
            branch: args.branch,
        },
        runtime_version.as_str(),
        os,
    );

    let results = sequencer.run_suite(specs).await;
    let finished = chrono::Utc::now();

    let mut stdout = std::io::stdout().lock();
    for spec in &results {
        for entity in &spec.results {
            if args.json {
                writeln!(stdout, "{}", serde_json::to_string(&entity.record())?)?;
            } else {
                writeln!(stdout, "{}", outcome_line(entity))?;
            }
        }
    }

    if let Some(dir) = &args.summary_dir {
        let path = summary.write(dir, &results, finished).await?;
        writeln!(stdout, "summary: {}", path.display())?;
    }

    Ok(())
}

fn outcome_line(entity: &Entity) -> String {
    if entity.skip {
        return format!("{} skipped", entity);
    }
    let status = |s: Option<version_matrix::entity::Status>| {
        s.map_or_else(|| "-".to_string(), |s| s.to_string())
    };
    format!(
        "{} install: {} test: {}",
        entity,
        status(entity.install_status()),
        status(entity.test_status())
    )
}

async fn humanize_summaries(args: HumanizeArgs, config: HarnessConfig) -> anyhow::Result<()> {
    let options = HumanizeOptions {
        duplicates: args.duplicates,
        merge_duplicates: args.merge_duplicates,
        fold_over_skips: !args.no_fold_over_skips,
        verbose: args.verbose,
        report: ReportOptions {
            filter: Filter::parse(&args.filter),
            last: args.last,
        },
        baseline_os: config.report.baseline_os,
        template: args.template,
        output_dir: config.report.output_dir,
    };

    let written = if args.output == "stdout" {
        let mut out = std::io::stdout().lock();
        humanize(&args.paths, &options, &mut out).await?
    } else {
        let path = Path::new(&args.output);
        let mut out = std::io::BufWriter::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        );
        let written = humanize(&args.paths, &options, &mut out).await?;
        out.flush()?;
        written
    };

    for path in written {
        println!("{}", path.display());
    }
    Ok(())
}
