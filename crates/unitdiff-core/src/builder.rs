//! Assembles a [`BuildGraph`] from evaluation output
//!
//! The evaluation engine predicts input files for many units in parallel and
//! reports each one through [`GraphCollector::observe_input_file`]. Every unit
//! gets its own lock, so observations for unrelated units never contend.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};
use unitdiff_fs::paths;

use crate::error::GraphError;
use crate::filter::InputFilter;
use crate::graph::{BuildGraph, GraphOrder};
use crate::model::BuildUnit;
use crate::packages::PackageDeclarations;

/// A unit node as finalized by the evaluation engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluatedUnit {
    pub path: PathBuf,
    #[serde(default)]
    pub references: Vec<PathBuf>,
    #[serde(default)]
    pub packages: Option<PackageDeclarations>,
}

impl EvaluatedUnit {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        EvaluatedUnit {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_references<I, P>(mut self, references: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.references.extend(references.into_iter().map(Into::into));
        self
    }

    pub fn with_packages(mut self, packages: PackageDeclarations) -> Self {
        self.packages = Some(packages);
        self
    }
}

struct UnitAccumulator {
    directory: PathBuf,
    input_files: Mutex<HashSet<PathBuf>>,
}

/// Collects input-file observations per unit, then builds the graph.
pub struct GraphCollector {
    accumulators: HashMap<PathBuf, UnitAccumulator>,
    filter: InputFilter,
    collect_package_references: bool,
    order: GraphOrder,
}

impl std::fmt::Debug for GraphCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphCollector")
            .field("unit_count", &self.accumulators.len())
            .field("collect_package_references", &self.collect_package_references)
            .field("order", &self.order)
            .finish()
    }
}

impl GraphCollector {
    /// Create one accumulator per unit path the engine enumerated.
    pub fn new<I, P>(units: I, filter: InputFilter) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let accumulators = units
            .into_iter()
            .map(|unit| {
                let path = paths::normalize(unit.as_ref());
                let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();
                (
                    path,
                    UnitAccumulator {
                        directory,
                        input_files: Mutex::new(HashSet::new()),
                    },
                )
            })
            .collect();
        GraphCollector {
            accumulators,
            filter,
            collect_package_references: false,
            order: GraphOrder::default(),
        }
    }

    pub fn with_package_references(mut self, enabled: bool) -> Self {
        self.collect_package_references = enabled;
        self
    }

    pub fn with_order(mut self, order: GraphOrder) -> Self {
        self.order = order;
        self
    }

    pub fn unit_count(&self) -> usize {
        self.accumulators.len()
    }

    /// Record that `owner` reads `path`. Relative paths resolve against the
    /// owner's directory. Returns whether the filter kept the file.
    ///
    /// Safe to call from many threads at once.
    pub fn observe_input_file(&self, path: &Path, owner: &Path) -> Result<bool, GraphError> {
        let owner = paths::normalize(owner);
        let Some(accumulator) = self.accumulators.get(&owner) else {
            return Err(GraphError::UnknownUnit {
                path: path.to_path_buf(),
                unit: owner,
            });
        };

        let path = paths::absolutize(path, &accumulator.directory);
        if !self.filter.accepts(&path) {
            trace!("Skipping input {} for {}", path.display(), owner.display());
            return Ok(false);
        }

        accumulator
            .input_files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path);
        Ok(true)
    }

    /// Attach references and package versions, then freeze the graph.
    ///
    /// Every evaluated node must have an accumulator; a missing one aborts
    /// construction instead of silently dropping the unit.
    pub fn finish(self, nodes: Vec<EvaluatedUnit>) -> Result<BuildGraph, GraphError> {
        let GraphCollector {
            mut accumulators,
            collect_package_references,
            order,
            ..
        } = self;

        let mut units = Vec::with_capacity(accumulators.len());
        for node in nodes {
            let path = paths::normalize(&node.path);
            let Some(accumulator) = accumulators.remove(&path) else {
                return Err(GraphError::MissingAccumulator { unit: path });
            };

            let mut input_files = accumulator
                .input_files
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner);
            let mut unit = BuildUnit::new(path.clone())
                .with_references(node.references.iter().map(|r| paths::absolutize(r, &accumulator.directory)));

            if collect_package_references {
                if let Some(packages) = &node.packages {
                    if let Some(manifest) = &packages.central_manifest {
                        input_files.remove(&paths::absolutize(manifest, &accumulator.directory));
                    }
                    unit.package_references = packages.resolve();
                }
            }
            unit.input_files = input_files.into_iter().collect();
            units.push(unit);
        }

        for (path, accumulator) in accumulators {
            debug!("Unit {} was enumerated but never evaluated", path.display());
            let input_files = accumulator
                .input_files
                .into_inner()
                .unwrap_or_else(PoisonError::into_inner);
            units.push(BuildUnit::new(path).with_input_files(input_files));
        }

        let graph = BuildGraph::new(units)?.ordered(order);
        debug!(
            "Built graph with {} units and {} references",
            graph.len(),
            graph.reference_count()
        );
        Ok(graph)
    }
}
