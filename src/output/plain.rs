use std::io::Write;

use unitdiff_core::DiffEntry;

use super::{Formatter, OutputContext};

pub struct PlainFormatter;

impl Formatter for PlainFormatter {
    fn write(&self, entries: &[DiffEntry], context: &OutputContext, out: &mut dyn Write) -> anyhow::Result<()> {
        for entry in entries {
            writeln!(out, "{}", context.normalize(&entry.path))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::{context, entries, render};

    #[test]
    fn relative_paths_one_per_line() {
        insta::assert_snapshot!(render(&PlainFormatter, &entries(), &context(false)), @r"
        src/Lib/Lib.csproj
        src/App/App.csproj
        ");
    }

    #[test]
    fn absolute_paths() {
        let output = render(&PlainFormatter, &entries(), &context(true));
        assert_eq!(output, "/repo/src/Lib/Lib.csproj\n/repo/src/App/App.csproj\n");
    }

    #[test]
    fn nothing_to_report() {
        assert_eq!(render(&PlainFormatter, &[], &context(false)), "");
    }
}
