use std::fs;
use std::path::Path;

use relata::{ClientError, Include, Project, StoreError, Value, describe_relation};
use rstest::{fixture, rstest};
use serde_json::json;
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
    project: Project,
}

#[fixture]
fn workspace() -> Workspace {
    let dir = tempfile::tempdir().unwrap();
    let models = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/models");
    let config = json!({"modelsDir": models, "dataFile": "state/data.json"});
    fs::write(dir.path().join("relata.json"), config.to_string()).unwrap();
    let project = Project::open(dir.path()).unwrap();
    Workspace { dir, project }
}

fn include(project: &Project, entity: &str, json: serde_json::Value) -> Include {
    Include::parse(project.client().registry(), entity, &json).unwrap()
}

#[rstest]
fn registry_resolves_the_tutorial(workspace: Workspace) {
    let registry = workspace.project.client().registry();
    let lines: Vec<String> = registry
        .relations_of("Course")
        .iter()
        .map(describe_relation)
        .collect();
    assert_eq!(
        lines,
        [
            "Course.users: many_to_many (through) Course <-> User via UserCourse",
            "Course.enrollments: one_to_many (inverse) Course.[id] <- UserCourse.[course_id]",
        ]
    );
    assert!(registry.is_implicit("_PostToTag"));
}

#[rstest]
fn nested_writes_satisfy_relational_invariants(mut workspace: Workspace) {
    let client = workspace.project.client_mut();

    // (a) nested profile carries the user key
    let alice = client
        .create("User", &json!({"email": "alice@prisma.io", "profile": {"create": {"bio": "hi"}}}))
        .unwrap();
    let profiles = client
        .find_many("Profile", &json!({"user_id": alice.get("id")}), &Include::new())
        .unwrap();
    assert_eq!(profiles.len(), 1);

    // (b) one profile per user
    let err = client
        .create("Profile", &json!({"user": {"connect": {"email": "alice@prisma.io"}}}))
        .unwrap_err();
    assert!(matches!(err, ClientError::Store(StoreError::UniqueViolation { .. })));

    // (c) connect fills the foreign key
    let post = client
        .create("Post", &json!({"title": "Hello", "author": {"connect": {"id": 1}}}))
        .unwrap();
    assert_eq!(post.get("author_id"), Some(&Value::Int(1)));

    // (d) connectOrCreate never duplicates tags
    for _ in 0..2 {
        client
            .update(
                "Post",
                &json!({"id": 1}),
                &json!({"tags": {"connectOrCreate": {"where": {"name": "intro"}, "create": {"name": "intro"}}}}),
            )
            .unwrap();
    }
    assert_eq!(client.count("Tag").unwrap(), 1);
    assert_eq!(client.count("_PostToTag").unwrap(), 1);

    // (e) composite key blocks duplicate membership
    client.create("Course", &json!({"title": "Rust 101"})).unwrap();
    let enrol = json!({"user": {"connect": {"id": 1}}, "course": {"connect": {"id": 1}}});
    client.create("UserCourse", &enrol).unwrap();
    let err = client.create("UserCourse", &enrol).unwrap_err();
    assert!(matches!(
        err,
        ClientError::Store(StoreError::UniqueViolation { constraint, .. }) if constraint == "pk_user_course"
    ));
}

#[rstest]
fn referential_actions(mut workspace: Workspace) {
    let client = workspace.project.client_mut();
    client
        .create(
            "User",
            &json!({
                "email": "alice@prisma.io",
                "posts": {"create": {"title": "Hello", "tags": {"create": [{"name": "a"}, {"name": "b"}]}}}
            }),
        )
        .unwrap();

    let err = client.delete("User", &json!({"id": 1})).unwrap_err();
    assert!(matches!(err, ClientError::Store(StoreError::DeleteRestricted(..))));
    assert_eq!(client.count("User").unwrap(), 1);

    client.delete("Tag", &json!({"name": "a"})).unwrap();
    assert_eq!(client.count("_PostToTag").unwrap(), 1);

    client.delete("Post", &json!({"id": 1})).unwrap();
    assert_eq!(client.count("_PostToTag").unwrap(), 0);
    assert_eq!(client.count("Tag").unwrap(), 1);
    client.delete("User", &json!({"id": 1})).unwrap();
}

#[rstest]
fn saved_data_reopens_with_relations(mut workspace: Workspace) {
    {
        let client = workspace.project.client_mut();
        client.create("Course", &json!({"title": "Rust 101"})).unwrap();
        client
            .create(
                "User",
                &json!({
                    "email": "alice@prisma.io",
                    "courses": {"attach": {"where": {"id": 1}, "pivot": {"progress": 75, "status": "COMPLETED"}}}
                }),
            )
            .unwrap();
    }
    workspace.project.save().unwrap();
    assert!(workspace.dir.path().join("state/data.json").exists());

    let mut reopened = Project::open(workspace.dir.path()).unwrap();
    let includes = include(&reopened, "Course", json!({"users": true}));
    let course = reopened
        .client()
        .find_unique("Course", &json!({"id": 1}), &includes)
        .unwrap()
        .unwrap();
    let users = course.many("users");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].pivot().unwrap()["status"], Value::from("COMPLETED"));

    // Sequences continue after reopening.
    let bob = reopened
        .client_mut()
        .create("User", &json!({"email": "bob@prisma.io"}))
        .unwrap();
    assert_eq!(bob.get("id"), Some(&Value::Int(2)));
}
