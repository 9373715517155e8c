//! Immutable build graph with path-keyed lookups

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::GraphError;
use crate::model::BuildUnit;

/// How units are ordered in a finished graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GraphOrder {
    /// Dependencies before their dependents.
    #[default]
    Topological,
    /// Ascending by number of references.
    ReferenceCount,
}

/// The set of build units for one snapshot. Immutable once constructed.
///
/// References between units are plain path lookups into this graph, never
/// pointers, so two graphs being compared share nothing.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<BuildUnit>", into = "Vec<BuildUnit>")]
pub struct BuildGraph {
    units: Vec<BuildUnit>,
    index: HashMap<PathBuf, usize>,
}

impl std::fmt::Debug for BuildGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildGraph")
            .field("unit_count", &self.units.len())
            .field("reference_count", &self.reference_count())
            .finish()
    }
}

impl BuildGraph {
    /// Build a graph, rejecting units that share a path.
    pub fn new(units: Vec<BuildUnit>) -> Result<Self, GraphError> {
        let mut index = HashMap::with_capacity(units.len());
        for (i, unit) in units.iter().enumerate() {
            if index.insert(unit.path.clone(), i).is_some() {
                return Err(GraphError::DuplicateUnit {
                    unit: unit.path.clone(),
                });
            }
        }
        Ok(BuildGraph { units, index })
    }

    pub fn empty() -> Self {
        BuildGraph {
            units: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Look up a unit by exact path.
    pub fn unit(&self, path: &Path) -> Option<&BuildUnit> {
        self.index.get(path).map(|&i| &self.units[i])
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.index.contains_key(path)
    }

    /// Units in graph order.
    pub fn units(&self) -> std::slice::Iter<'_, BuildUnit> {
        self.units.iter()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Total number of reference edges, dangling ones included.
    pub fn reference_count(&self) -> usize {
        self.units.iter().map(|u| u.references.len()).sum()
    }

    /// Reorder units deterministically.
    ///
    /// Topological order falls back to reference-count order when the
    /// references contain a cycle.
    pub fn ordered(mut self, order: GraphOrder) -> Self {
        self.units.sort_by(|a, b| a.path.cmp(&b.path));
        let permutation = match order {
            GraphOrder::Topological => match self.topological_permutation() {
                Some(p) => p,
                None => {
                    warn!("Reference cycle found, ordering units by reference count instead");
                    self.reference_count_permutation()
                }
            },
            GraphOrder::ReferenceCount => self.reference_count_permutation(),
        };

        let mut slots: Vec<Option<BuildUnit>> = self.units.into_iter().map(Some).collect();
        let units: Vec<BuildUnit> = permutation
            .into_iter()
            .filter_map(|i| slots[i].take())
            .collect();
        let index = units
            .iter()
            .enumerate()
            .map(|(i, u)| (u.path.clone(), i))
            .collect();
        BuildGraph { units, index }
    }

    fn reference_count_permutation(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.units.len()).collect();
        order.sort_by_key(|&i| self.units[i].references.len());
        order
    }

    /// Indices with every dependency ahead of its dependents, or `None` on a cycle.
    fn topological_permutation(&self) -> Option<Vec<usize>> {
        let mut graph: DiGraph<usize, ()> = DiGraph::with_capacity(self.units.len(), 0);
        let nodes: Vec<NodeIndex> = (0..self.units.len()).map(|i| graph.add_node(i)).collect();
        let positions: HashMap<&Path, usize> = self
            .units
            .iter()
            .enumerate()
            .map(|(i, u)| (u.path.as_path(), i))
            .collect();

        for (i, unit) in self.units.iter().enumerate() {
            for reference in &unit.references {
                if let Some(&target) = positions.get(reference.as_path()) {
                    graph.add_edge(nodes[i], nodes[target], ());
                }
            }
        }

        let sorted = toposort(&graph, None).ok()?;
        Some(sorted.into_iter().rev().map(|n| graph[n]).collect())
    }
}

impl Default for BuildGraph {
    fn default() -> Self {
        Self::empty()
    }
}

impl TryFrom<Vec<BuildUnit>> for BuildGraph {
    type Error = GraphError;

    fn try_from(units: Vec<BuildUnit>) -> Result<Self, Self::Error> {
        BuildGraph::new(units)
    }
}

impl From<BuildGraph> for Vec<BuildUnit> {
    fn from(graph: BuildGraph) -> Self {
        graph.units
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(graph: &BuildGraph) -> Vec<&str> {
        graph
            .units()
            .map(|u| u.path.to_str().unwrap())
            .collect()
    }

    fn chain() -> Vec<BuildUnit> {
        vec![
            BuildUnit::new("/r/A.csproj").with_references(["/r/B.csproj"]),
            BuildUnit::new("/r/C.csproj"),
            BuildUnit::new("/r/B.csproj").with_references(["/r/C.csproj"]),
        ]
    }

    #[test]
    fn rejects_duplicate_paths() {
        let err = BuildGraph::new(vec![
            BuildUnit::new("/r/A.csproj"),
            BuildUnit::new("/r/A.csproj"),
        ])
        .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateUnit { .. }));
    }

    #[test]
    fn lookup_by_path() {
        let graph = BuildGraph::new(chain()).unwrap();
        assert!(graph.contains(Path::new("/r/B.csproj")));
        assert!(graph.unit(Path::new("/r/Z.csproj")).is_none());
        assert_eq!(graph.len(), 3);
        assert_eq!(graph.reference_count(), 2);
    }

    #[test]
    fn topological_order_puts_dependencies_first() {
        let graph = BuildGraph::new(chain()).unwrap().ordered(GraphOrder::Topological);
        assert_eq!(paths(&graph), vec!["/r/C.csproj", "/r/B.csproj", "/r/A.csproj"]);
        assert_eq!(
            graph.unit(Path::new("/r/A.csproj")).unwrap().references.len(),
            1
        );
    }

    #[test]
    fn reference_count_order_is_stable_by_path() {
        let graph = BuildGraph::new(vec![
            BuildUnit::new("/r/Z.csproj").with_references(["/r/X.csproj", "/r/Y.csproj"]),
            BuildUnit::new("/r/Y.csproj").with_references(["/r/X.csproj"]),
            BuildUnit::new("/r/W.csproj").with_references(["/r/X.csproj"]),
            BuildUnit::new("/r/X.csproj"),
        ])
        .unwrap()
        .ordered(GraphOrder::ReferenceCount);
        assert_eq!(
            paths(&graph),
            vec!["/r/X.csproj", "/r/W.csproj", "/r/Y.csproj", "/r/Z.csproj"]
        );
    }

    #[test]
    fn cyclic_graph_falls_back_to_reference_count() {
        let graph = BuildGraph::new(vec![
            BuildUnit::new("/r/A.csproj").with_references(["/r/B.csproj"]),
            BuildUnit::new("/r/B.csproj").with_references(["/r/A.csproj"]),
            BuildUnit::new("/r/C.csproj"),
        ])
        .unwrap()
        .ordered(GraphOrder::Topological);
        assert_eq!(
            paths(&graph),
            vec!["/r/C.csproj", "/r/A.csproj", "/r/B.csproj"]
        );
    }

    #[test]
    fn serializes_as_unit_list() {
        let graph = BuildGraph::new(vec![
            BuildUnit::new("/r/A.csproj").with_input_files(["/r/a.cs"]),
        ])
        .unwrap();
        let json = serde_json::to_string(&graph).unwrap();
        assert_eq!(
            json,
            r#"[{"path":"/r/A.csproj","inputFiles":["/r/a.cs"],"references":[],"packageReferences":[]}]"#
        );
        let back: BuildGraph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, graph);
    }

    #[test]
    fn deserializing_duplicates_fails() {
        let json = r#"[{"path":"/r/A.csproj"},{"path":"/r/A.csproj"}]"#;
        assert!(serde_json::from_str::<BuildGraph>(json).is_err());
    }
}
