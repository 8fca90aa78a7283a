//! Integration tests across the socialgraph crates
//!
//! These tests verify end-to-end functionality:
//! - Resource directory → ResourceBundle → Generator
//! - Conversation documents → templates → mapped posts and comments
//!
//! Run with: cargo test --test integration_tests

use std::fs;
use std::path::Path;

use socialgraph_gen::{
    Generator, GeneratorConfig, MembershipSpec, PersonSpec, PlaceSpec, PostingMode,
    SocialRelationSpec,
};
use socialgraph_model::{count_entities, MutationOp, PostKind};
use socialgraph_resources::ResourceBundle;
use tempfile::tempdir;

fn write(dir: &Path, name: &str, contents: &str) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}

fn minimal_resources(dir: &Path) {
    let names = r#"[{"percentile": 1.0, "value": "Alex"}, {"percentile": 2.0, "value": "Sam"}]"#;
    write(dir, "female_names.json", names);
    write(dir, "male_names.json", names);
    write(dir, "last_names.json", r#"[{"percentile": 3.5, "value": "Reed"}]"#);
    write(dir, "landmarks.txt", "Old Mill\n\n  Clock Tower  \n");
    write(dir, "bios.txt", "First bio\nSecond bio\nThird bio\n");
    write(
        dir,
        "organisations.json",
        r##"[{"type": "university", "name": "Ridge University", "bio": "Up on the hill.", "tags": ["#research"]}]"##,
    );
    write(
        dir,
        "groups.json",
        r#"[{"name": "Quiz Night", "bio": "Tuesdays.", "tags": []}]"#,
    );
    write(
        dir,
        "conversations/index.json",
        r#"[{"ref": "quiz", "type": "poll", "posting_type": "person-group",
             "page_name": "Quiz Night", "location_name": "Clock Tower"}]"#,
    );
    write(
        dir,
        "conversations/quiz.json",
        r#"{"username": "@host", "body": "Pick a theme #quiz",
            "question": "Theme?", "answers": ["Films", "Music"],
            "comments": [{"username": "@guest", "body": "Music, @host!"}]}"#,
    );
}

// ============================================================================
// Resource loading
// ============================================================================

#[test]
fn test_resource_bundle_loads_every_table() {
    let dir = tempdir().unwrap();
    minimal_resources(dir.path());

    let bundle = ResourceBundle::load(dir.path()).unwrap();
    assert_eq!(bundle.names.female.len(), 2);
    assert_eq!(bundle.landmarks, ["Old Mill", "Clock Tower"]);
    assert_eq!(bundle.bios.len(), 3);
    assert_eq!(bundle.organisations[0].name, "Ridge University");
    assert_eq!(bundle.groups[0].name, "Quiz Night");

    let spec = &bundle.conversations[0];
    assert_eq!(spec.mode, PostingMode::Group);
    assert_eq!(spec.page_name.as_deref(), Some("Quiz Night"));
    assert_eq!(spec.place_name.as_deref(), Some("Clock Tower"));
    assert_eq!(spec.template.root_kind(), PostKind::Poll);
    assert_eq!(spec.template.len(), 2);
}

#[test]
fn test_resource_errors_name_the_file() {
    let dir = tempdir().unwrap();
    minimal_resources(dir.path());
    write(dir.path(), "groups.json", "{ not json");

    let err = ResourceBundle::load(dir.path()).unwrap_err();
    assert!(format!("{err:#}").contains("groups.json"));
}

#[test]
fn test_unknown_post_type_is_rejected() {
    let dir = tempdir().unwrap();
    minimal_resources(dir.path());
    write(
        dir.path(),
        "conversations/index.json",
        r#"[{"ref": "quiz", "type": "hologram", "posting_type": "person-self",
             "page_name": "", "location_name": ""}]"#,
    );
    let err = ResourceBundle::load(dir.path()).unwrap_err();
    assert!(format!("{err:#}").contains("hologram"));
}

// ============================================================================
// Resources → generator
// ============================================================================

#[test]
fn test_bundle_drives_a_group_poll_conversation() {
    let dir = tempdir().unwrap();
    minimal_resources(dir.path());
    let bundle = ResourceBundle::load(dir.path()).unwrap();

    let mut gen = Generator::new(GeneratorConfig::default().with_seed(5), bundle.names.clone())
        .unwrap();
    let mut ops: Vec<MutationOp> = Vec::new();
    ops.extend(gen.place(PlaceSpec::region("North").with_id("plc-north")).unwrap());
    ops.extend(gen.place(PlaceSpec::city("Harbour", "plc-north")).unwrap());
    for landmark in &bundle.landmarks {
        ops.extend(gen.place(PlaceSpec::landmark(landmark)).unwrap());
    }
    for bio in &bundle.bios {
        ops.extend(gen.person(PersonSpec::with_bio(bio)).unwrap());
    }
    for group in &bundle.groups {
        ops.extend(gen.group(group.to_spec()).unwrap());
    }
    for _ in 0..bundle.bios.len() {
        let persons: Vec<String> = gen.registry().persons().map(|p| p.id.clone()).collect();
        let free = persons
            .iter()
            .find(|p| gen.ledger().memberships().iter().all(|m| &m.member != *p))
            .cloned();
        ops.extend(
            gen.group_membership(MembershipSpec {
                profile: free,
                ..MembershipSpec::default()
            })
            .unwrap(),
        );
    }
    ops.extend(gen.social_relation(SocialRelationSpec::default()).unwrap());

    let conversation = gen.conversation(bundle.conversations[0].clone()).unwrap();
    assert_eq!(count_entities(&conversation), 2);
    assert_eq!(conversation[0].kind(), Some("poll-post"));
    let answers: Vec<_> = conversation[0]
        .fields()
        .all("answer")
        .filter_map(|v| v.as_str())
        .collect();
    assert_eq!(answers, ["Films", "Music"]);
    let located = conversation
        .iter()
        .find(|op| op.kind() == Some("location"))
        .unwrap();
    assert_eq!(located.role("place").unwrap().kind, "landmark");

    ops.extend(conversation);
    ops.extend(gen.response(Default::default()).unwrap());
    ops.extend(gen.response_viewings().unwrap());

    let json = serde_json::to_string(&ops).unwrap();
    let back: Vec<MutationOp> = serde_json::from_str(&json).unwrap();
    assert_eq!(back, ops);
}
