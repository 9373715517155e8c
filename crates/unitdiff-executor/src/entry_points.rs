//! Entry-point discovery
//!
//! Runs against a file system in its discovery phase, so listing candidate
//! units never loads anything into the evaluator.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};
use unitdiff_fs::{FileSystem, FsError, SearchDepth, paths};

pub trait EntryPointProvider: Send + Sync {
    /// Unit paths the evaluator should start from. `root` is the repository root.
    fn entry_points(&self, root: &Path, fs: &dyn FileSystem) -> Result<Vec<PathBuf>, FsError>;
}

/// Every file matching a leaf glob below a directory.
#[derive(Debug, Clone)]
pub struct DirectoryScan {
    directory: PathBuf,
    pattern: String,
}

impl DirectoryScan {
    pub const DEFAULT_PATTERN: &'static str = "*.csproj";

    /// Scan `directory`, relative to the repository root unless absolute.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        DirectoryScan {
            directory: directory.into(),
            pattern: Self::DEFAULT_PATTERN.to_string(),
        }
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }
}

impl Default for DirectoryScan {
    fn default() -> Self {
        Self::new("")
    }
}

impl EntryPointProvider for DirectoryScan {
    fn entry_points(&self, root: &Path, fs: &dyn FileSystem) -> Result<Vec<PathBuf>, FsError> {
        let directory = root.join(&self.directory);
        let mut found = fs.enumerate_files(&directory, &self.pattern, SearchDepth::Recursive)?;
        found.sort();
        debug!("Found {} entry points under {}", found.len(), directory.display());
        Ok(found)
    }
}

/// A fixed list of units; those missing from the file system are skipped.
#[derive(Debug, Clone, Default)]
pub struct ExplicitEntryPoints {
    paths: Vec<PathBuf>,
}

impl ExplicitEntryPoints {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        ExplicitEntryPoints {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }
}

impl EntryPointProvider for ExplicitEntryPoints {
    fn entry_points(&self, root: &Path, fs: &dyn FileSystem) -> Result<Vec<PathBuf>, FsError> {
        Ok(self
            .paths
            .iter()
            .map(|p| paths::absolutize(p, root))
            .filter(|p| {
                let exists = fs.file_exists(p);
                if !exists {
                    debug!("Entry point {} does not exist in this snapshot", p.display());
                }
                exists
            })
            .collect())
    }
}

/// `Project("{type}") = "Name", "relative\path.csproj", "{id}"`
static SLN_PROJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^\s*Project\("\{([0-9A-Fa-f-]+)\}"\)\s*=\s*"[^"]*"\s*,\s*"([^"]+)""#)
        .expect("valid solution project pattern")
});

/// `<Project Path="src/App/App.csproj" />` in an XML solution.
static SLNX_PROJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<Project\s[^>]*?\bPath\s*=\s*"([^"]+)""#).expect("valid slnx project pattern")
});

/// Type id of solution folders, which are listed like projects.
const SOLUTION_FOLDER_TYPE: &str = "2150E333-8FDC-42A3-9474-1A3956D46DE8";

/// The projects listed in a `.sln` or `.slnx` solution.
///
/// The solution is read through the file system, so each snapshot is
/// evaluated with its own version of the project list.
#[derive(Debug, Clone)]
pub struct SolutionEntryPoints {
    solution: PathBuf,
}

impl SolutionEntryPoints {
    /// `solution` is relative to the repository root unless absolute.
    pub fn new(solution: impl Into<PathBuf>) -> Self {
        SolutionEntryPoints {
            solution: solution.into(),
        }
    }

    fn project_paths(&self, solution: &Path, text: &str) -> Result<Vec<String>, FsError> {
        match solution.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("sln") => Ok(SLN_PROJECT
                .captures_iter(text)
                .filter(|c| !c[1].eq_ignore_ascii_case(SOLUTION_FOLDER_TYPE))
                .map(|c| c[2].to_string())
                .collect()),
            Some(ext) if ext.eq_ignore_ascii_case("slnx") => Ok(SLNX_PROJECT
                .captures_iter(text)
                .map(|c| c[1].to_string())
                .collect()),
            _ => Err(FsError::Unsupported {
                operation: "reading solution format",
                path: solution.to_path_buf(),
            }),
        }
    }
}

impl EntryPointProvider for SolutionEntryPoints {
    fn entry_points(&self, root: &Path, fs: &dyn FileSystem) -> Result<Vec<PathBuf>, FsError> {
        let solution = paths::absolutize(&self.solution, root);
        if !fs.file_exists(&solution) {
            warn!("Solution {} not found, assuming no projects", solution.display());
            return Ok(Vec::new());
        }

        let text = fs.read_all_text(&solution)?;
        let directory = solution.parent().unwrap_or(root);
        let found: Vec<PathBuf> = self
            .project_paths(&solution, &text)?
            .iter()
            .map(|p| paths::absolutize(Path::new(&p.replace('\\', "/")), directory))
            .collect();
        debug!("Found {} projects in solution {}", found.len(), solution.display());
        Ok(found)
    }
}
