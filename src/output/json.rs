use std::io::Write;

use serde::Serialize;
use unitdiff_core::{DiffEntry, DiffStatus};

use super::{Formatter, OutputContext};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonEntry {
    path: String,
    status: DiffStatus,
    referenced_projects: Vec<String>,
}

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn write(&self, entries: &[DiffEntry], context: &OutputContext, out: &mut dyn Write) -> anyhow::Result<()> {
        let entries: Vec<JsonEntry> = entries
            .iter()
            .map(|entry| JsonEntry {
                path: context.normalize(&entry.path),
                status: entry.status,
                referenced_projects: entry
                    .referenced_projects
                    .iter()
                    .map(|p| context.normalize(p))
                    .collect(),
            })
            .collect();
        serde_json::to_writer_pretty(&mut *out, &entries)?;
        writeln!(out)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::{context, entries, render};

    #[test]
    fn entries_with_relative_references() {
        insta::assert_snapshot!(render(&JsonFormatter, &entries(), &context(false)), @r#"
        [
          {
            "path": "src/Lib/Lib.csproj",
            "status": "Modified",
            "referencedProjects": []
          },
          {
            "path": "src/App/App.csproj",
            "status": "ReferenceChanged",
            "referencedProjects": [
              "src/Lib/Lib.csproj"
            ]
          }
        ]
        "#);
    }

    #[test]
    fn empty_array_when_nothing_changed() {
        assert_eq!(render(&JsonFormatter, &[], &context(true)), "[]\n");
    }
}
