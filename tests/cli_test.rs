//! Command line tests: the `noteforest` binary against a database in a tempdir.

#![cfg(feature = "bin")]

use std::{path::Path, process::Command};
use tempfile::tempdir;
use test_log::test;

fn noteforest(dir: &Path, args: &[&str]) -> Result<std::process::Output, std::io::Error> {
    Command::new(env!("CARGO_BIN_EXE_noteforest"))
        .arg("--config")
        .arg(dir.join("noteforest.toml"))
        .arg("--db")
        .arg(dir.join("notes.db"))
        .args(args)
        .env("RUST_LOG", "info")
        .output()
}

#[test]
fn test_json_output_is_not_mixed_with_logs() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let inbox = noteforest(dir.path(), &["add-note", "Inbox"])?;
    assert!(inbox.status.success());
    let draft = noteforest(dir.path(), &["add-note", "Draft"])?;
    assert!(draft.status.success());
    let link = noteforest(dir.path(), &["link", "notes", "1", "2", "--kind", "page"])?;
    assert!(link.status.success(), "{}", String::from_utf8_lossy(&link.stderr));

    let tree = noteforest(dir.path(), &["tree", "notes", "--json"])?;
    assert!(tree.status.success());
    let forest: serde_json::Value = serde_json::from_slice(&tree.stdout)?;
    assert_eq!(forest[0]["label"], "Inbox");
    assert_eq!(forest[0]["children"][0]["label"], "Draft");
    assert_eq!(forest[0]["children"][0]["relation_kind"], "page");

    // The connection summary is logged at info, on stderr.
    let logs = String::from_utf8_lossy(&tree.stderr);
    assert!(logs.contains("DB Connection initialized"), "{logs}");
    Ok(())
}

#[test]
fn test_rejected_edit_exits_nonzero() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    noteforest(dir.path(), &["add-note", "Inbox"])?;
    let output = noteforest(dir.path(), &["link", "notes", "1", "1"])?;
    assert_eq!(output.status.code(), Some(1));
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Rejected"));
    Ok(())
}
