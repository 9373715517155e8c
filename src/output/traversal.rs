use std::io::Write;

use unitdiff_core::DiffEntry;

use super::{Formatter, OutputContext, backslashed};

const TRAVERSAL_SDK: &str = "Microsoft.Build.Traversal";

/// Traversal project with one `ProjectReference` per unit.
#[derive(Default)]
pub struct TraversalFormatter {
    sdk_version: Option<String>,
}

impl TraversalFormatter {
    pub fn new(sdk_version: Option<String>) -> Self {
        TraversalFormatter { sdk_version }
    }

    fn sdk(&self) -> String {
        match &self.sdk_version {
            Some(version) => format!("{TRAVERSAL_SDK}/{version}"),
            None => TRAVERSAL_SDK.to_string(),
        }
    }
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

impl Formatter for TraversalFormatter {
    fn write(&self, entries: &[DiffEntry], context: &OutputContext, out: &mut dyn Write) -> anyhow::Result<()> {
        writeln!(out, "<Project Sdk=\"{}\">", escape(&self.sdk()))?;
        if !entries.is_empty() {
            writeln!(out, "  <ItemGroup>")?;
            for entry in entries {
                let include = if context.absolute_paths {
                    entry.path.to_string_lossy().replace('/', "\\")
                } else {
                    backslashed(&context.root, &entry.path)
                };
                writeln!(out, "    <ProjectReference Include=\"{}\" />", escape(&include))?;
            }
            writeln!(out, "  </ItemGroup>")?;
        }
        writeln!(out, "</Project>")?;
        Ok(())
    }
}
