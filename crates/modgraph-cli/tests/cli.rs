//! End-to-end tests of the `modgraph` binary.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn modgraph(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_modgraph"))
        .args(args)
        .env_remove("MODGRAPH_MODULE_PATH")
        .env_remove("MODGRAPH_BASE_MODULE")
        .env_remove("MODGRAPH_LOG")
        .output()
        .unwrap()
}

fn module_dir(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (name, content) in files {
        fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}

fn path_arg(dir: &Path) -> String {
    dir.to_string_lossy().into_owned()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn platform() -> TempDir {
    module_dir(&[
        ("app.mdesc", "module app\nrequires java.sql\n"),
        (
            "java.sql.mdesc",
            "module java.sql\nrequires transitive java.xml\nrequires transitive java.logging\n",
        ),
        ("java.xml.mdesc", "module java.xml\n"),
        ("java.logging.mdesc", "module java.logging\n"),
        ("java.base.mdesc", "module java.base\ncontains java.lang\nexports java.lang\n"),
    ])
}

#[test]
fn test_resolve_clean_graph() {
    let dir = platform();
    let output = modgraph(&["resolve", "app", "-p", &path_arg(dir.path())]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout(&output),
        "app -> java.base, java.logging, java.sql, java.xml\n\
         java.base\n\
         java.logging -> java.base\n\
         java.sql -> java.base, java.logging, java.xml\n\
         java.xml -> java.base\n\
         resolved: 5 module(s), 0 error(s), 0 warning(s)\n"
    );
}

#[test]
fn test_resolve_without_base_module() {
    let dir = platform();
    let output = modgraph(&["resolve", "java.xml", "--no-base-module", "-p", &path_arg(dir.path())]);

    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        stdout(&output),
        "java.xml\nresolved: 1 module(s), 0 error(s), 0 warning(s)\n"
    );
}

#[test]
fn test_resolve_cycle_fails() {
    let dir = module_dir(&[
        ("a.mdesc", "module a\nrequires b\n"),
        ("b.mdesc", "module b\nrequires c\n"),
        ("c.mdesc", "module c\nrequires a\n"),
    ]);
    let output = modgraph(&["resolve", "a", "-p", &path_arg(dir.path())]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout(&output),
        "resolution failed: 0 module(s), 1 error(s), 0 warning(s)\n"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("CyclicDependency"), "stderr: {}", stderr);
}

#[test]
fn test_resolve_json() {
    let dir = module_dir(&[
        ("app.mdesc", "module app\nuses spi.Codec\n"),
    ]);
    let output = modgraph(&["resolve", "app", "--format", "json", "-p", &path_arg(dir.path())]);

    assert_eq!(output.status.code(), Some(0));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["success"], serde_json::json!(true));
    assert_eq!(report["resolved"][0]["name"], serde_json::json!("app"));
    assert_eq!(report["diagnostics"][0]["code"], serde_json::json!("NoServiceProvider"));
    assert_eq!(report["diagnostics"][0]["severity"], serde_json::json!("warning"));
}

#[test]
fn test_add_modules() {
    let dir = module_dir(&[
        ("app.mdesc", "module app\n"),
        ("agent.mdesc", "module agent\n"),
        ("tools.mdesc", "module tools\n"),
    ]);
    let output = modgraph(&[
        "resolve",
        "app",
        "--add-modules",
        "agent,tools",
        "-p",
        &path_arg(dir.path()),
    ]);

    assert_eq!(output.status.code(), Some(0));
    assert!(stdout(&output).starts_with("agent\napp\ntools\n"));
}

#[test]
fn test_check_reports_bad_descriptor() {
    let dir = module_dir(&[
        ("good.mdesc", "module good\n"),
        ("bad.mdesc", "module bad\nexports com.missing\n"),
    ]);
    let output = modgraph(&["check", "-p", &path_arg(dir.path())]);

    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout(&output),
        "checked 2 file(s): 1 module(s), 1 error(s), 0 warning(s)\n"
    );
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("MalformedDescriptor"), "stderr: {}", stderr);
}

#[test]
fn test_describe() {
    let dir = platform();
    let output = modgraph(&["describe", "java.sql", "-p", &path_arg(dir.path())]);

    assert_eq!(output.status.code(), Some(0));
    let text = stdout(&output);
    assert!(text.starts_with("// "));
    assert!(text.ends_with(
        "module java.sql\nrequires transitive java.xml\nrequires transitive java.logging\n"
    ));
}

#[test]
fn test_usage_and_io_failures() {
    let dir = platform();
    let output = modgraph(&["describe", "nowhere", "-p", &path_arg(dir.path())]);
    assert_eq!(output.status.code(), Some(2));

    let output = modgraph(&["resolve", "app", "-p", &path_arg(&dir.path().join("absent"))]);
    assert_eq!(output.status.code(), Some(2));

    let output = modgraph(&["resolve", "--format", "yaml"]);
    assert_eq!(output.status.code(), Some(2));
}
