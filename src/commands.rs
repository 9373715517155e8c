//! CLI command implementations

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Args;
use unitdiff_core::{BuildGraph, BuildUnit, ChangedFileSet, DiffEntry, GraphOrder, diff as diff_graphs};
use unitdiff_fs::paths;

use crate::output::{
    Formatter, JsonFormatter, OutputContext, OutputFormat, PlainFormatter, SlnfFormatter, TraversalFormatter,
};
use crate::selection::{Selection, StatusFilter};
use crate::settings::{Settings, load_settings, load_settings_file};

#[derive(Args, Debug)]
pub struct DiffArgs {
    /// Build graph of the base snapshot (JSON)
    #[arg(long)]
    pub base: PathBuf,

    /// Build graph of the head snapshot (JSON)
    #[arg(long)]
    pub head: PathBuf,

    /// File whose content changed between the snapshots (repeatable)
    #[arg(long = "changed-file", value_name = "PATH")]
    pub changed_files: Vec<PathBuf>,

    /// Read changed files from a file, one path per line
    #[arg(long, value_name = "FILE")]
    pub changed_files_from: Option<PathBuf>,

    /// Changed file to disregard entirely (repeatable)
    #[arg(long = "ignore-changed-file", value_name = "PATH")]
    pub ignore_changed_files: Vec<PathBuf>,

    /// Output format; inferred from the output file extension when absent
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Write absolute paths instead of paths relative to the output location
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub absolute_paths: Option<bool>,

    /// Report units that only exist in the head graph
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub include_added: Option<bool>,

    /// Report units that only exist in the base graph
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub include_removed: Option<bool>,

    /// Report units whose own inputs changed
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub include_modified: Option<bool>,

    /// Report units affected only through their references
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub include_referencing: Option<bool>,

    /// Only report units matching these globs
    #[arg(long, value_name = "GLOB")]
    pub include_units: Vec<String>,

    /// Never report units matching these globs
    #[arg(long, value_name = "GLOB")]
    pub exclude_units: Vec<String>,

    /// Version of the traversal SDK written into traversal projects
    #[arg(long)]
    pub traversal_sdk_version: Option<String>,

    /// Solution referenced by solution filter output
    #[arg(long)]
    pub solution: Option<PathBuf>,

    /// Order of the reported units
    #[arg(long, value_enum)]
    pub order: Option<OrderArg>,

    /// Settings file (defaults to unitdiff.toml in the working directory)
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
pub enum OrderArg {
    Topological,
    ReferenceCount,
}

impl From<OrderArg> for GraphOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::Topological => GraphOrder::Topological,
            OrderArg::ReferenceCount => GraphOrder::ReferenceCount,
        }
    }
}

async fn read_graph(path: &Path) -> anyhow::Result<BuildGraph> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read build graph {}", path.display()))?;
    let graph: BuildGraph = serde_json::from_str(&content)
        .with_context(|| format!("invalid build graph {}", path.display()))?;
    tracing::debug!("Read {:?} from {}", graph, path.display());
    Ok(graph)
}

async fn read_changed_files(args: &DiffArgs, cwd: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = args.changed_files.clone();
    if let Some(list) = &args.changed_files_from {
        let content = tokio::fs::read_to_string(list)
            .await
            .with_context(|| format!("failed to read changed files from {}", list.display()))?;
        files.extend(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(PathBuf::from),
        );
    }
    Ok(files.iter().map(|f| paths::absolutize(f, cwd)).collect())
}

/// Rebuild `graph` without the ignored files among its units' inputs.
fn without_inputs(graph: BuildGraph, ignored: &[PathBuf]) -> anyhow::Result<BuildGraph> {
    if ignored.is_empty() {
        return Ok(graph);
    }
    let mut units: Vec<BuildUnit> = graph.into();
    for unit in &mut units {
        for path in ignored {
            unit.input_files.remove(path);
        }
    }
    Ok(BuildGraph::new(units)?)
}

fn formatter(format: OutputFormat, args: &DiffArgs, settings: &Settings, cwd: &Path) -> anyhow::Result<Box<dyn Formatter>> {
    Ok(match format {
        OutputFormat::Plain => Box::new(PlainFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Slnf => {
            let Some(solution) = args.solution.as_ref().or(settings.solution.as_ref()) else {
                bail!("solution filter output needs --solution");
            };
            Box::new(SlnfFormatter::new(paths::absolutize(solution, cwd)))
        }
        OutputFormat::Traversal => Box::new(TraversalFormatter::new(
            args.traversal_sdk_version
                .clone()
                .or_else(|| settings.traversal_sdk_version.clone()),
        )),
    })
}

fn write_output(
    entries: &[DiffEntry],
    formatter: &dyn Formatter,
    context: &OutputContext,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            formatter.write(entries, context, &mut out)?;
            out.flush()?;
            tracing::info!("Wrote {} units to {}", entries.len(), path.display());
        }
        None => {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            formatter.write(entries, context, &mut out)?;
            out.flush()?;
        }
    }
    Ok(())
}

pub async fn diff(args: DiffArgs) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("failed to read the working directory")?;
    let settings = match &args.config {
        Some(path) => load_settings_file(path)?,
        None => load_settings(&cwd)?,
    };

    let (base, head, changed) = tokio::try_join!(
        read_graph(&args.base),
        read_graph(&args.head),
        read_changed_files(&args, &cwd),
    )?;

    let ignored: Vec<PathBuf> = args
        .ignore_changed_files
        .iter()
        .chain(&settings.ignore_changed_files)
        .map(|p| paths::absolutize(p, &cwd))
        .collect();
    let changed: ChangedFileSet = changed.into_iter().collect();
    let changed = changed.without(ignored.iter().map(PathBuf::as_path));
    tracing::info!("{} changed files", changed.len());

    let order = args.order.map(GraphOrder::from).or(settings.order);
    let mut base = without_inputs(base, &ignored)?;
    let mut head = without_inputs(head, &ignored)?;
    if let Some(order) = order {
        base = base.ordered(order);
        head = head.ordered(order);
    }

    let mut diff = diff_graphs(&base, &head, &changed);
    let entries: Vec<DiffEntry> = diff.by_ref().collect();
    tracing::debug!("Diff stats: {:?}", diff.stats());

    let statuses = StatusFilter {
        added: args.include_added.or(settings.include_added).unwrap_or(true),
        removed: args.include_removed.or(settings.include_removed).unwrap_or(false),
        modified: args.include_modified.or(settings.include_modified).unwrap_or(true),
        referencing: args.include_referencing.or(settings.include_referencing).unwrap_or(true),
    };
    let include = if args.include_units.is_empty() { &settings.include_units } else { &args.include_units };
    let exclude = if args.exclude_units.is_empty() { &settings.exclude_units } else { &args.exclude_units };
    let entries = Selection::new(statuses, include, exclude, &cwd)?.apply(entries);

    let output = args.output.as_ref().map(|p| paths::absolutize(p, &cwd));
    let format = args
        .format
        .or(settings.format)
        .or_else(|| output.as_deref().map(OutputFormat::from_extension))
        .unwrap_or(OutputFormat::Plain);
    let context = OutputContext {
        root: output
            .as_deref()
            .and_then(Path::parent)
            .map_or_else(|| cwd.clone(), Path::to_path_buf),
        absolute_paths: args.absolute_paths.or(settings.absolute_paths).unwrap_or(false),
    };
    let formatter = formatter(format, &args, &settings, &cwd)?;
    write_output(&entries, formatter.as_ref(), &context, output.as_deref())
}
