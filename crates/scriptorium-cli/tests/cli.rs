//! End-to-end runs of the `scriptorium` binary against throwaway catalogs

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

const OVERRIDES: [&str; 5] = [
    "SCRIPTORIUM_CHALLENGE_ENDPOINT",
    "SCRIPTORIUM_RETRY_ATTEMPTS",
    "SCRIPTORIUM_RETRY_DELAY_MS",
    "SCRIPTORIUM_DOWNLOADS_DIR",
    "SCRIPTORIUM_KEY_LABEL",
];

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new(manifest: &str, files: &[&str]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("catalog.json"), manifest).unwrap();
        for file in files {
            std::fs::write(dir.path().join(file), b"%PDF-1.4").unwrap();
        }
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn catalog(&self) -> PathBuf {
        self.path().join("catalog.json")
    }

    fn write_config(&self, toml: &str) -> PathBuf {
        let path = self.path().join("scriptorium.toml");
        std::fs::write(&path, toml).unwrap();
        path
    }

    fn run(&self, args: &[&str]) -> Output {
        let mut command = Command::new(env!("CARGO_BIN_EXE_scriptorium"));
        for name in OVERRIDES {
            command.env_remove(name);
        }
        command
            .current_dir(self.path())
            .env("SCRIPTORIUM_DOWNLOADS_DIR", self.path().join("downloads"))
            .env("RUST_LOG", "warn")
            .args(args)
            .output()
            .unwrap()
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

const THREE_BOOKS: &str = r#"{
    "pages": [
        { "group": 1, "entries": [
            { "title": "Liber Vitae", "label": "Siglo XIV", "file": "vitae.pdf", "code": "AUREUS12" },
            { "title": "Codex Aureus", "label": "Siglo XII", "file": "aureus.pdf" }
        ] },
        { "group": 2, "entries": [
            { "title": "Voynich", "label": "Siglo XVI", "file": "voynich.pdf", "code": "VXN" }
        ] }
    ]
}"#;

#[test]
fn order_prints_chain_order() {
    let ws = Workspace::new(THREE_BOOKS, &["vitae.pdf", "aureus.pdf", "voynich.pdf"]);

    let output = ws.run(&["order", "--catalog", ws.catalog().to_str().unwrap()]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let rows: Vec<Vec<String>> = stdout(&output)
        .lines()
        .map(|line| line.split('\t').map(str::to_string).collect())
        .collect();
    assert_eq!(
        rows,
        [
            ["12", "Codex Aureus", "page 1"],
            ["14", "Liber Vitae", "page 1"],
            ["16", "Voynich", "page 2"],
        ]
    );
}

#[test]
fn order_reads_layout_from_config() {
    let ws = Workspace::new(
        r#"{ "pages": [
            { "group": 3, "entries": [ { "title": "Codex Aureus", "label": "XII", "file": "aureus.pdf" } ] },
            { "group": 4, "entries": [ { "title": "Voynich", "label": "XVI", "file": "voynich.pdf", "code": "VXN" } ] }
        ] }"#,
        &["aureus.pdf", "voynich.pdf"],
    );
    let config = ws.write_config(
        r#"
        [chain.layout]
        direct = 3
        challenge = 4
        "#,
    );

    let output = ws.run(&[
        "order",
        "--catalog",
        ws.catalog().to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
    ]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let groups: Vec<String> = stdout(&output)
        .lines()
        .filter_map(|line| line.split('\t').nth(2).map(str::to_string))
        .collect();
    assert_eq!(groups, ["page 3", "page 4"]);
}

#[test]
fn single_initial_item_resolves_without_extraction() {
    let ws = Workspace::new(
        r#"{ "pages": [
            { "group": 1, "entries": [ { "title": "Codex Aureus", "label": "XII", "file": "aureus.pdf" } ] },
            { "group": 2, "entries": [] }
        ] }"#,
        &["aureus.pdf"],
    );

    let output = ws.run(&["resolve", "--catalog", ws.catalog().to_str().unwrap(), "--json"]);

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let report: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["items"][0]["title"], "Codex Aureus");
    assert_eq!(report["outcomes"][0]["strategy"], "initial");
    assert_eq!(report["outcomes"][0]["status"]["status"], "resolved");
    assert!(ws.path().join("downloads/Codex_Aureus.pdf").exists());
}

#[test]
fn broken_extraction_cascades_and_exits_incomplete() {
    let ws = Workspace::new(
        r#"{ "pages": [
            { "group": 1, "entries": [
                { "title": "Codex Aureus", "label": "XII", "file": "aureus.pdf" },
                { "title": "Liber Vitae", "label": "XIV", "file": "vitae.pdf", "code": "AUREUS12" }
            ] },
            { "group": 2, "entries": [] }
        ] }"#,
        &["aureus.pdf", "vitae.pdf"],
    );
    let config = ws.write_config(
        r#"
        [chain.retry]
        max_attempts = 2
        delay_ms = 0

        [ocr]
        pdftoppm = "/nonexistent/pdftoppm"
        "#,
    );

    let output = ws.run(&[
        "resolve",
        "--catalog",
        ws.catalog().to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--json",
    ]);

    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    let report: Value = serde_json::from_str(&stdout(&output)).unwrap();
    let first = &report["outcomes"][0]["status"];
    assert_eq!(first["status"], "failed");
    assert_eq!(first["reason"]["kind"], "attempts_exhausted");
    assert_eq!(first["reason"]["attempts"], 2);
    let second = &report["outcomes"][1]["status"];
    assert_eq!(second["reason"]["kind"], "missing_unlock_code");
    assert!(!ws.path().join("downloads/Liber_Vitae.pdf").exists());
}

#[test]
fn challenge_items_without_endpoint_fail_setup() {
    let ws = Workspace::new(THREE_BOOKS, &["vitae.pdf", "aureus.pdf", "voynich.pdf"]);

    let output = ws.run(&["resolve", "--catalog", ws.catalog().to_str().unwrap()]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("challenge endpoint is not configured"));
    assert!(!ws.path().join("downloads").exists());
}

#[test]
fn missing_catalog_fails_setup() {
    let ws = Workspace::new("{}", &[]);

    let output = ws.run(&["order", "--catalog", "does-not-exist.json"]);

    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("cannot read catalog"));
}
