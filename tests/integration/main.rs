//! Integration tests for the unitdiff CLI
//!
//! Each test writes two build graphs into a temporary directory and runs
//! the binary from there.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use serde_json::{Value, json};
use tempfile::TempDir;

struct Repo {
    _dir: TempDir,
    root: PathBuf,
}

impl Repo {
    /// Base has Lib, App (references Lib) and Old. Head drops Old and adds New.
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().canonicalize().unwrap();
        let repo = Repo { _dir: dir, root };

        let lib = repo.unit("Lib", &["Lib.cs"], &[]);
        let app = repo.unit("App", &["Program.cs"], &["Lib"]);
        let old = repo.unit("Old", &["Old.cs"], &[]);
        let new = repo.unit("New", &["New.cs"], &["App"]);
        repo.write("base.json", &json!([lib, app, old]).to_string());
        repo.write("head.json", &json!([lib, app, new]).to_string());
        repo
    }

    fn path(&self, relative: &str) -> String {
        self.root.join(relative).to_string_lossy().into_owned()
    }

    fn unit(&self, name: &str, inputs: &[&str], references: &[&str]) -> Value {
        json!({
            "path": self.path(&format!("{name}/{name}.csproj")),
            "inputFiles": inputs.iter().map(|f| self.path(&format!("{name}/{f}"))).collect::<Vec<_>>(),
            "references": references.iter().map(|r| self.path(&format!("{r}/{r}.csproj"))).collect::<Vec<_>>(),
        })
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.root.join(relative)).unwrap()
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_unitdiff"))
            .args(args)
            .current_dir(&self.root)
            .output()
            .expect("Failed to execute unitdiff")
    }

    /// `unitdiff diff` with the base/head graphs and Lib.cs changed.
    fn diff(&self, extra: &[&str]) -> Output {
        let mut args = vec![
            "diff",
            "--base",
            "base.json",
            "--head",
            "head.json",
            "--changed-file",
            "Lib/Lib.cs",
        ];
        args.extend_from_slice(extra);
        let output = self.run(&args);
        assert!(
            output.status.success(),
            "unitdiff failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        output
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).unwrap()
}

fn json_paths(value: &Value) -> Vec<(&str, &str)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|e| (e["path"].as_str().unwrap(), e["status"].as_str().unwrap()))
        .collect()
}

#[test]
fn test_version() {
    let repo = Repo::new();
    let output = repo.run(&["version"]);
    assert!(output.status.success());
    assert!(stdout(&output).starts_with("unitdiff v"));
}

#[test]
fn test_plain_output_is_relative_to_working_directory() {
    let repo = Repo::new();
    let output = repo.diff(&[]);
    assert_eq!(
        stdout(&output),
        "Lib/Lib.csproj\nApp/App.csproj\nNew/New.csproj\n"
    );
}

#[test]
fn test_removed_units_need_opting_in() {
    let repo = Repo::new();
    let output = repo.diff(&["--include-removed"]);
    assert!(stdout(&output).ends_with("New/New.csproj\nOld/Old.csproj\n"));

    let output = repo.diff(&["--include-added", "false", "--include-referencing=false"]);
    assert_eq!(stdout(&output), "Lib/Lib.csproj\n");
}

#[test]
fn test_json_format_inferred_from_output_file() {
    let repo = Repo::new();
    let output = repo.diff(&["-o", "out/units.json"]);
    assert!(stdout(&output).is_empty());

    let written: Value = serde_json::from_str(&repo.read("out/units.json")).unwrap();
    assert_eq!(
        json_paths(&written),
        vec![
            ("../Lib/Lib.csproj", "Modified"),
            ("../App/App.csproj", "ReferenceChanged"),
            ("../New/New.csproj", "Added"),
        ]
    );
    assert_eq!(written[1]["referencedProjects"], json!(["../Lib/Lib.csproj"]));
}

#[test]
fn test_absolute_paths() {
    let repo = Repo::new();
    let output = repo.diff(&["--absolute-paths", "--include-units", "Lib/*"]);
    assert_eq!(stdout(&output), format!("{}\n", repo.path("Lib/Lib.csproj")));
}

#[test]
fn test_exclude_units() {
    let repo = Repo::new();
    let output = repo.diff(&["--exclude-units", "App/**", "--exclude-units", "New/*"]);
    assert_eq!(stdout(&output), "Lib/Lib.csproj\n");
}

#[test]
fn test_traversal_project() {
    let repo = Repo::new();
    repo.diff(&["-o", "build.proj", "--traversal-sdk-version", "4.1.0"]);
    let project = repo.read("build.proj");
    assert!(project.starts_with("<Project Sdk=\"Microsoft.Build.Traversal/4.1.0\">"));
    assert!(project.contains("<ProjectReference Include=\"Lib\\Lib.csproj\" />"));
    assert!(project.contains("<ProjectReference Include=\"New\\New.csproj\" />"));
}

#[test]
fn test_solution_filter() {
    let repo = Repo::new();
    repo.diff(&["-o", "changed.slnf", "--solution", "All.sln", "--include-units", "Lib/*"]);
    let filter: Value = serde_json::from_str(&repo.read("changed.slnf")).unwrap();
    assert_eq!(
        filter,
        json!({"solution": {"path": "All.sln", "projects": ["Lib\\Lib.csproj"]}})
    );
}

#[test]
fn test_settings_file() {
    let repo = Repo::new();
    repo.write("unitdiff.toml", "format = \"json\"\ninclude_removed = true\n");
    let output = repo.diff(&[]);
    let entries: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(json_paths(&entries).len(), 4);
    assert_eq!(json_paths(&entries)[3], ("Old/Old.csproj", "Removed"));

    // flags override the file
    let output = repo.diff(&["--format", "plain", "--include-removed=false"]);
    assert_eq!(stdout(&output).lines().count(), 3);
}

#[test]
fn test_changed_files_from_list() {
    let repo = Repo::new();
    repo.write("changes.txt", "App/Program.cs\n\n");
    let output = repo.run(&[
        "diff",
        "--base",
        "base.json",
        "--head",
        "head.json",
        "--changed-files-from",
        "changes.txt",
    ]);
    assert!(output.status.success());
    assert_eq!(stdout(&output), "App/App.csproj\nNew/New.csproj\n");
}

#[test]
fn test_ignored_changed_file() {
    let repo = Repo::new();
    let output = repo.diff(&["--ignore-changed-file", "Lib/Lib.cs"]);
    assert_eq!(stdout(&output), "New/New.csproj\n");
}

#[test]
fn test_invalid_graph_fails() {
    let repo = Repo::new();
    repo.write("broken.json", "{ not json");
    let output = repo.run(&["diff", "--base", "base.json", "--head", "broken.json"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid build graph"));
}

#[test]
fn test_duplicate_units_are_rejected() {
    let repo = Repo::new();
    let lib = repo.unit("Lib", &[], &[]);
    repo.write("dup.json", &json!([lib, lib]).to_string());
    let output = repo.run(&["diff", "--base", "dup.json", "--head", "head.json"]);
    assert!(!output.status.success());
}

