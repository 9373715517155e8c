use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::json;
use unitdiff_core::DiffEntry;
use unitdiff_fs::paths;

use super::{Formatter, OutputContext, backslashed, relative_path};

/// Solution filter. Unit paths are always relative to the solution's
/// directory, so `absolute_paths` does not apply.
pub struct SlnfFormatter {
    solution: PathBuf,
}

impl SlnfFormatter {
    pub fn new(solution: impl Into<PathBuf>) -> Self {
        SlnfFormatter {
            solution: solution.into(),
        }
    }
}

impl Formatter for SlnfFormatter {
    fn write(&self, entries: &[DiffEntry], context: &OutputContext, out: &mut dyn Write) -> anyhow::Result<()> {
        let solution_dir = self.solution.parent().unwrap_or(Path::new(""));
        let projects: Vec<String> = entries
            .iter()
            .map(|entry| backslashed(solution_dir, &entry.path))
            .collect();
        let document = json!({
            "solution": {
                "path": paths::forward_slashes(&relative_path(&context.root, &self.solution)),
                "projects": projects,
            }
        });
        serde_json::to_writer_pretty(&mut *out, &document)?;
        writeln!(out)?;
        Ok(())
    }
}
