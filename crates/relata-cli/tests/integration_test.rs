use std::fs;
use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo;
use predicates::prelude::*;
use tempfile::tempdir;

fn relata(dir: &Path) -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("relata"));
    cmd.current_dir(dir).env_remove("RUST_LOG");
    cmd
}

const USER: &str = r#"{
    "name": "User",
    "fields": [
        {"name": "id", "type": "integer", "primary_key": {"auto_increment": true}},
        {"name": "email", "type": "text", "unique": true}
    ],
    "relations": [
        {"name": "posts", "target": "Post", "kind": "one_to_many",
         "via": {"type": "inverse", "fields": ["author_id"]}}
    ]
}"#;

const POST: &str = r#"{
    "name": "Post",
    "fields": [
        {"name": "id", "type": "integer", "primary_key": {"auto_increment": true}},
        {"name": "title", "type": "text"},
        {"name": "author_id", "type": "integer", "foreign_key": "User.id"}
    ],
    "relations": [
        {"name": "author", "target": "User", "kind": "many_to_one",
         "via": {"type": "foreign_key", "fields": ["author_id"]}},
        {"name": "tags", "target": "Tag", "kind": "many_to_many", "via": {"type": "join_table"}}
    ]
}"#;

const TAG: &str = r#"{
    "name": "Tag",
    "fields": [
        {"name": "id", "type": "integer", "primary_key": {"auto_increment": true}},
        {"name": "name", "type": "text", "unique": true}
    ],
    "relations": [
        {"name": "posts", "target": "Post", "kind": "many_to_many", "via": {"type": "join_table"}}
    ]
}"#;

fn blog_project() -> tempfile::TempDir {
    let tmp = tempdir().unwrap();
    relata(tmp.path()).arg("init").assert().success();
    let models = tmp.path().join("models");
    fs::create_dir_all(&models).unwrap();
    fs::write(models.join("user.json"), USER).unwrap();
    fs::write(models.join("post.json"), POST).unwrap();
    fs::write(models.join("tag.json"), TAG).unwrap();
    tmp
}

#[test]
fn test_main_with_help_flag() {
    let tmp = tempdir().unwrap();
    relata(tmp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("relata"));
}

#[test]
fn test_init_twice_fails() {
    let tmp = tempdir().unwrap();
    relata(tmp.path()).arg("init").assert().success();
    relata(tmp.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_commands_require_config() {
    let tmp = tempdir().unwrap();
    relata(tmp.path())
        .arg("check")
        .assert()
        .failure()
        .stderr(predicate::str::contains("relata init"));
}

#[test]
fn test_new_then_check() {
    let tmp = tempdir().unwrap();
    relata(tmp.path()).arg("init").assert().success();
    relata(tmp.path())
        .args(["new", "course", "--format", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("course.yaml"));
    relata(tmp.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("1 entities"));
}

#[test]
fn test_check_lists_relations() {
    let tmp = blog_project();
    relata(tmp.path())
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Post.tags: many_to_many (join_table) Post <-> Tag via _PostToTag",
        ))
        .stdout(predicate::str::contains("1 implicit join tables"));
}

#[test]
fn test_run_script_and_status() {
    let tmp = blog_project();
    fs::write(
        tmp.path().join("seed.json"),
        r#"[
            {"op": "create", "entity": "User", "data": {
                "email": "alice@prisma.io",
                "posts": {"create": {"title": "Hello", "tags": {"connectOrCreate": [
                    {"where": {"name": "intro"}, "create": {"name": "intro"}}
                ]}}}
            }},
            {"op": "find_unique", "entity": "User", "where": {"email": "alice@prisma.io"},
             "include": {"posts": {"include": {"tags": true}}}}
        ]"#,
    )
    .unwrap();

    relata(tmp.path())
        .args(["run", "seed.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"intro\""))
        .stdout(predicate::str::contains("Saved"));
    assert!(tmp.path().join("relata-data.json").exists());

    relata(tmp.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("4 rows stored."));
}

#[test]
fn test_run_dry_run_does_not_save() {
    let tmp = blog_project();
    fs::write(
        tmp.path().join("seed.json"),
        r#"[{"op": "create", "entity": "Tag", "data": {"name": "rust"}}]"#,
    )
    .unwrap();

    relata(tmp.path())
        .args(["run", "seed.json", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 writes discarded"));
    assert!(!tmp.path().join("relata-data.json").exists());
}

#[test]
fn test_run_reports_failed_operation() {
    let tmp = blog_project();
    fs::write(
        tmp.path().join("bad.json"),
        r#"[{"op": "create", "entity": "Post", "data": {"title": "x", "author": {"connect": {"id": 7}}}}]"#,
    )
    .unwrap();

    relata(tmp.path())
        .args(["run", "bad.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("operation 1 (create Post) failed"));
}

#[test]
fn test_schema_prints_json_schema() {
    let tmp = tempdir().unwrap();
    relata(tmp.path())
        .arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"EntityDef\""));
}
