//! Fake collaborators for executor tests

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow, bail};
use unitdiff_core::{DeclaredPackage, EvaluatedUnit, GraphCollector, PackageDeclarations};
use unitdiff_fs::{
    FileSystem, InMemoryRegistry, MemoryTree, ProjectRegistry, SnapshotTree, TreeEntryKind, paths,
};

use crate::evaluator::ProjectEvaluator;
use crate::vcs::{SnapshotId, VersionControl};

/// Repository history held in memory. Change sets are computed by comparing
/// tree contents; the working directory is captured from disk on demand.
pub struct FakeVcs {
    root: PathBuf,
    shallow: bool,
    head: SnapshotId,
    revisions: HashMap<String, SnapshotId>,
    trees: HashMap<SnapshotId, Arc<MemoryTree>>,
    merge_bases: HashMap<(SnapshotId, SnapshotId), SnapshotId>,
}

impl FakeVcs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FakeVcs {
            root: root.into(),
            shallow: false,
            head: SnapshotId::new("HEAD"),
            revisions: HashMap::new(),
            trees: HashMap::new(),
            merge_bases: HashMap::new(),
        }
    }

    /// Add a snapshot reachable by its own id and by `aliases`.
    pub fn commit(mut self, tree: MemoryTree, aliases: &[&str]) -> Self {
        let id = SnapshotId::new(tree.id());
        self.revisions.insert(id.to_string(), id.clone());
        for alias in aliases {
            self.revisions.insert(alias.to_string(), id.clone());
        }
        self.head = id.clone();
        self.trees.insert(id, Arc::new(tree));
        self
    }

    pub fn merge_base(mut self, a: &str, b: &str, base: &str) -> Self {
        self.merge_bases
            .insert((SnapshotId::new(a), SnapshotId::new(b)), SnapshotId::new(base));
        self
    }

    pub fn shallow(mut self) -> Self {
        self.shallow = true;
        self
    }

    fn snapshot(&self, id: &SnapshotId) -> Result<Arc<MemoryTree>> {
        self.trees
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown snapshot {id}"))
    }
}

fn blobs(tree: &dyn SnapshotTree) -> BTreeMap<String, Arc<[u8]>> {
    let mut out = BTreeMap::new();
    let mut pending = vec![String::new()];
    while let Some(dir) = pending.pop() {
        for entry in tree.children(&dir).unwrap_or_default() {
            let path = if dir.is_empty() {
                entry.name.clone()
            } else {
                format!("{dir}/{}", entry.name)
            };
            match entry.kind {
                TreeEntryKind::Tree => pending.push(path),
                TreeEntryKind::Blob => {
                    if let Some(blob) = tree.blob(&path) {
                        out.insert(path, blob);
                    }
                }
                TreeEntryKind::Other => {}
            }
        }
    }
    out
}

#[async_trait::async_trait]
impl VersionControl for FakeVcs {
    fn working_directory(&self) -> &Path {
        &self.root
    }

    async fn is_shallow(&self) -> Result<bool> {
        Ok(self.shallow)
    }

    async fn resolve(&self, revision: &str) -> Result<Option<SnapshotId>> {
        Ok(self.revisions.get(revision).cloned())
    }

    async fn head(&self) -> Result<SnapshotId> {
        Ok(self.head.clone())
    }

    async fn merge_base(&self, a: &SnapshotId, b: &SnapshotId) -> Result<Option<SnapshotId>> {
        Ok(self.merge_bases.get(&(a.clone(), b.clone())).cloned())
    }

    async fn changed_files(&self, base: &SnapshotId, head: Option<&SnapshotId>) -> Result<Vec<PathBuf>> {
        let before = blobs(self.snapshot(base)?.as_ref());
        let after = match head {
            Some(id) => blobs(self.snapshot(id)?.as_ref()),
            None => blobs(&MemoryTree::capture("working-directory", &self.root)?),
        };
        let paths: BTreeSet<&String> = before.keys().chain(after.keys()).collect();
        Ok(paths
            .into_iter()
            .filter(|p| before.get(*p) != after.get(*p))
            .map(|p| self.root.join(p))
            .collect())
    }

    async fn tree(&self, id: &SnapshotId) -> Result<Arc<dyn SnapshotTree>> {
        let tree: Arc<dyn SnapshotTree> = self.snapshot(id)?;
        Ok(tree)
    }
}

#[derive(Debug, Default)]
struct UnitFile {
    references: Vec<PathBuf>,
    inputs: Vec<PathBuf>,
    packages: Vec<DeclaredPackage>,
}

/// Reads units written as one directive per line:
///
/// ```text
/// ref ../Lib/Lib.csproj
/// input Program.cs
/// package Serilog 3.0.0
/// ```
///
/// Every unit also reads `Directory.Build.props` at the root when present.
pub struct LineEvaluator {
    root: PathBuf,
    loads: AtomicUsize,
    registries: Mutex<Vec<Arc<InMemoryRegistry>>>,
}

impl LineEvaluator {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LineEvaluator {
            root: root.into(),
            loads: AtomicUsize::new(0),
            registries: Mutex::new(Vec::new()),
        }
    }

    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn registries(&self) -> Vec<Arc<InMemoryRegistry>> {
        self.registries.lock().unwrap().clone()
    }

    fn parse(fs: &dyn FileSystem, unit: &Path) -> Result<UnitFile> {
        let text = fs.read_all_text(unit)?;
        let directory = unit.parent().unwrap_or(Path::new("/"));
        let mut parsed = UnitFile::default();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match line.split_once(' ') {
                Some(("ref", path)) => parsed.references.push(paths::absolutize(Path::new(path), directory)),
                Some(("input", path)) => parsed.inputs.push(PathBuf::from(path)),
                Some(("package", rest)) => {
                    let (name, version) = rest.split_once(' ').unwrap_or((rest, ""));
                    parsed.packages.push(DeclaredPackage::new(name, version));
                }
                _ => bail!("unrecognised line '{line}' in {}", unit.display()),
            }
        }
        Ok(parsed)
    }
}

#[async_trait::async_trait]
impl ProjectEvaluator for LineEvaluator {
    fn new_registry(&self) -> Arc<dyn ProjectRegistry> {
        let registry = Arc::new(InMemoryRegistry::new());
        self.registries.lock().unwrap().push(registry.clone());
        registry
    }

    async fn load_graph(&self, fs: &dyn FileSystem, entry_points: &[PathBuf]) -> Result<Vec<PathBuf>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let mut seen = BTreeSet::new();
        let mut pending = entry_points.to_vec();
        while let Some(unit) = pending.pop() {
            if seen.contains(&unit) {
                continue;
            }
            let parsed = Self::parse(fs, &unit)?;
            pending.extend(parsed.references.into_iter().filter(|r| fs.file_exists(r)));
            seen.insert(unit);
        }
        Ok(seen.into_iter().collect())
    }

    async fn predict(
        &self,
        fs: &dyn FileSystem,
        units: &[PathBuf],
        collector: &GraphCollector,
    ) -> Result<Vec<EvaluatedUnit>> {
        let props = self.root.join("Directory.Build.props");
        let props = &props;
        std::thread::scope(|scope| {
            let handles: Vec<_> = units
                .iter()
                .map(|unit| {
                    scope.spawn(move || -> Result<EvaluatedUnit> {
                        let parsed = Self::parse(fs, unit)?;
                        collector.observe_input_file(unit, unit)?;
                        if fs.file_exists(props) {
                            collector.observe_input_file(props, unit)?;
                        }
                        for input in &parsed.inputs {
                            collector.observe_input_file(input, unit)?;
                        }
                        let packages = PackageDeclarations {
                            uses_package_references: !parsed.packages.is_empty(),
                            references: parsed.packages,
                            ..Default::default()
                        };
                        Ok(EvaluatedUnit::new(unit)
                            .with_references(parsed.references)
                            .with_packages(packages))
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|handle| -> Result<EvaluatedUnit> {
                    handle.join().map_err(|_| anyhow!("evaluation thread panicked"))?
                })
                .collect()
        })
    }
}

/// Base snapshot: App references Lib, both with one source file.
pub fn base_tree() -> MemoryTree {
    tree_with("c1", &[])
}

/// The base snapshot contents under a new id, with some files replaced or added.
pub fn tree_with(id: &str, overrides: &[(&str, &str)]) -> MemoryTree {
    let mut files: BTreeMap<&str, &str> = [
        ("Directory.Build.props", "<Project />"),
        ("App/App.csproj", "ref ../Lib/Lib.csproj\ninput Program.cs\n"),
        ("App/Program.cs", "class Program {}"),
        ("Lib/Lib.csproj", "input Lib.cs\npackage Serilog 3.0.0\n"),
        ("Lib/Lib.cs", "class Lib {}"),
    ]
    .into_iter()
    .collect();
    files.extend(overrides.iter().copied());
    files
        .into_iter()
        .fold(MemoryTree::builder(id), |builder, (path, content)| builder.file(path, content))
        .build()
}
