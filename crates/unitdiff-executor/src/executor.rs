//! Diff orchestration
//!
//! Resolves the two revisions, collects the change set, builds both graphs
//! concurrently and diffs them.

use std::path::PathBuf;

use tracing::{Instrument, debug, error, info, info_span, warn};
use unitdiff_core::{BuildGraph, ChangedFileSet, GraphCollector, InputFilter, RepositoryFilter, diff};
use unitdiff_fs::{FileSystem, LiveFileSystem, SnapshotFileSystem};

use crate::entry_points::EntryPointProvider;
use crate::error::ExecutorError;
use crate::evaluator::ProjectEvaluator;
use crate::options::{ExecutionStatus, ExecutorOptions, InputScope, ProjectDiffResult};
use crate::vcs::{SnapshotId, VersionControl};

pub struct ProjectDiffExecutor<V, E, P> {
    vcs: V,
    evaluator: E,
    entry_points: P,
    options: ExecutorOptions,
}

impl<V, E, P> ProjectDiffExecutor<V, E, P>
where
    V: VersionControl,
    E: ProjectEvaluator,
    P: EntryPointProvider,
{
    pub fn new(vcs: V, evaluator: E, entry_points: P, options: ExecutorOptions) -> Self {
        ProjectDiffExecutor {
            vcs,
            evaluator,
            entry_points,
            options,
        }
    }

    pub fn options(&self) -> &ExecutorOptions {
        &self.options
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Diff `base_revision` against `head_revision`, or against the working
    /// directory when no head is given.
    pub async fn diff(
        &self,
        base_revision: &str,
        head_revision: Option<&str>,
    ) -> Result<ProjectDiffResult, ExecutorError> {
        if self
            .vcs
            .is_shallow()
            .await
            .map_err(ExecutorError::version_control("is-shallow"))?
        {
            warn!("Repository is shallow, some operations may not work as expected");
        }

        debug!("Looking up base revision '{}'", base_revision);
        let Some(mut base) = self.resolve(base_revision).await? else {
            error!("Base revision '{}' not found in repository", base_revision);
            return Ok(ProjectDiffResult::failed(ExecutionStatus::BaseCommitNotFound));
        };

        let head = match head_revision {
            Some(revision) => {
                debug!("Looking up head revision '{}'", revision);
                let Some(id) = self.resolve(revision).await? else {
                    error!("Head revision '{}' not found in repository", revision);
                    return Ok(ProjectDiffResult::failed(ExecutionStatus::HeadCommitNotFound));
                };
                Some(id)
            }
            None => {
                debug!("No head revision given, using the working directory");
                None
            }
        };

        if self.options.find_merge_base {
            let tip = match &head {
                Some(id) => id.clone(),
                None => self
                    .vcs
                    .head()
                    .await
                    .map_err(ExecutorError::version_control("head"))?,
            };
            let merge_base = self
                .vcs
                .merge_base(&base, &tip)
                .await
                .map_err(ExecutorError::version_control("merge-base"))?;
            let Some(merge_base) = merge_base else {
                error!("No merge base between '{}' and '{}'", base, tip);
                return Ok(ProjectDiffResult::failed(ExecutionStatus::MergeBaseNotFound));
            };
            debug!("Using merge base {}", merge_base);
            base = merge_base;
        }

        let head_label = head.as_ref().map_or_else(|| "working directory".to_string(), |id| id.to_string());
        info!("Finding changed files between {} and {}", base, head_label);
        let changed: ChangedFileSet = self
            .vcs
            .changed_files(&base, head.as_ref())
            .await
            .map_err(ExecutorError::version_control("diff"))?
            .into_iter()
            .collect();
        let changed = changed.without(self.options.ignore_changed_files.iter().map(PathBuf::as_path));

        if changed.is_empty() {
            info!("No changed files between {} and {}", base, head_label);
            return Ok(ProjectDiffResult {
                status: ExecutionStatus::Success,
                changed_files: Vec::new(),
                entries: Vec::new(),
            });
        }
        info!("Found {} changed files", changed.len());
        debug!("Changed files: {:?}", changed.sorted());

        let (base_graph, head_graph) = tokio::try_join!(
            self.build_graph(Some(&base), &changed)
                .instrument(info_span!("build_graph", snapshot = %base)),
            self.build_graph(head.as_ref(), &changed)
                .instrument(info_span!("build_graph", snapshot = %head_label)),
        )?;

        let entries = diff(&base_graph, &head_graph, &changed).collect();
        Ok(ProjectDiffResult {
            status: ExecutionStatus::Success,
            changed_files: changed.sorted(),
            entries,
        })
    }

    async fn resolve(&self, revision: &str) -> Result<Option<SnapshotId>, ExecutorError> {
        self.vcs
            .resolve(revision)
            .await
            .map_err(ExecutorError::version_control("resolve"))
    }

    fn input_filter(&self, changed: &ChangedFileSet) -> Result<InputFilter, ExecutorError> {
        let filter = match self.options.input_scope {
            InputScope::ChangedFiles => InputFilter::changed_files(changed.clone()),
            InputScope::Repository => {
                InputFilter::repository(RepositoryFilter::load(self.vcs.working_directory())?)
            }
        };
        Ok(filter.ignoring(self.options.ignore_changed_files.iter().cloned()))
    }

    /// Build the graph for a snapshot, or for the working directory when `None`.
    async fn build_graph(
        &self,
        snapshot: Option<&SnapshotId>,
        changed: &ChangedFileSet,
    ) -> Result<BuildGraph, ExecutorError> {
        let root = self.vcs.working_directory();
        match snapshot {
            Some(id) => {
                let tree = self
                    .vcs
                    .tree(id)
                    .await
                    .map_err(ExecutorError::version_control("tree"))?;
                let discovery = SnapshotFileSystem::discover(root, tree);
                let entry_points = self.entry_points.entry_points(root, &discovery)?;
                let fs = discovery.materialize(self.evaluator.new_registry());
                self.evaluate(&fs, entry_points, changed, id.as_str()).await
            }
            None => {
                let fs = LiveFileSystem::new();
                let entry_points = self.entry_points.entry_points(root, &fs)?;
                self.evaluate(&fs, entry_points, changed, "working directory").await
            }
        }
    }

    async fn evaluate(
        &self,
        fs: &dyn FileSystem,
        entry_points: Vec<PathBuf>,
        changed: &ChangedFileSet,
        label: &str,
    ) -> Result<BuildGraph, ExecutorError> {
        info!("Evaluating {} entry points", entry_points.len());
        let evaluation_failed = |source| ExecutorError::Evaluation {
            snapshot: label.to_string(),
            source,
        };

        let units = self
            .evaluator
            .load_graph(fs, &entry_points)
            .await
            .map_err(evaluation_failed)?;
        let collector = GraphCollector::new(&units, self.input_filter(changed)?)
            .with_package_references(self.options.collect_package_references)
            .with_order(self.options.order);
        let nodes = self
            .evaluator
            .predict(fs, &units, &collector)
            .await
            .map_err(evaluation_failed)?;
        Ok(collector.finish(nodes)?)
    }
}
