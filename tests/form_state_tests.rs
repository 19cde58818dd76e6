use audit_portal::form_state::{FieldMap, FormState};
use serde_json::{Value, json};

fn map(value: Value) -> FieldMap {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

#[test]
fn test_initial_state_uses_loaded_section() {
    let data = map(json!({ "sectionA": { "x": 1 } }));

    let state = FormState::new(&data, "sectionA", map(json!({ "x": 0 })));

    assert_eq!(state.form_data(), &map(json!({ "x": 1 })));
    assert!(!state.is_modified());
}

#[test]
fn test_edit_then_reset_round_trip() {
    let data = map(json!({ "sectionA": { "x": 1 } }));
    let mut state = FormState::new(&data, "sectionA", map(json!({ "x": 0 })));

    state.handle_change("x", 2);
    assert_eq!(state.form_data(), &map(json!({ "x": 2 })));
    assert!(state.is_modified());

    state.reset_form();
    assert_eq!(state.form_data(), &map(json!({ "x": 1 })));
    assert!(!state.is_modified());
}

#[test]
fn test_missing_section_falls_back_to_defaults() {
    let state = FormState::new(&FieldMap::new(), "sectionA", map(json!({ "x": 0 })));

    assert_eq!(state.form_data(), &map(json!({ "x": 0 })));
    assert!(!state.is_modified());
}

#[test]
fn test_null_section_is_treated_as_missing() {
    let data = map(json!({ "sectionA": null }));

    let state = FormState::new(&data, "sectionA", map(json!({ "x": 0 })));

    assert_eq!(state.form_data(), &map(json!({ "x": 0 })));
}

#[test]
fn test_change_is_a_shallow_merge() {
    let data = map(json!({ "library": { "books": 100, "journals": 4 } }));
    let mut state = FormState::new(&data, "library", FieldMap::new());

    state.handle_change("books", 150);
    state.handle_change("librarian", "R. Rao");

    assert_eq!(
        state.form_data(),
        &map(json!({ "books": 150, "journals": 4, "librarian": "R. Rao" }))
    );
    assert!(state.is_modified());
}

#[test]
fn test_change_back_to_loaded_value_clears_flag() {
    let data = map(json!({ "sectionA": { "x": 1 } }));
    let mut state = FormState::new(&data, "sectionA", map(json!({ "x": 0 })));

    state.handle_change("x", 2);
    state.handle_change("x", 1);

    assert!(!state.is_modified());
}

#[test]
fn test_sync_discards_local_edits() {
    let mut state = FormState::new(
        &map(json!({ "sectionA": { "x": 1 } })),
        "sectionA",
        map(json!({ "x": 0 })),
    );
    state.handle_change("x", 5);

    state.sync(&map(json!({ "sectionA": { "x": 3, "y": true } })));

    assert_eq!(state.form_data(), &map(json!({ "x": 3, "y": true })));
    assert!(!state.is_modified());

    // Reset now goes back to the newly loaded data.
    state.handle_change("y", false);
    state.reset_form();
    assert_eq!(state.form_data(), &map(json!({ "x": 3, "y": true })));
}

#[test]
fn test_sync_without_section_resets_to_defaults() {
    let mut state = FormState::new(
        &map(json!({ "sectionA": { "x": 1 } })),
        "sectionA",
        map(json!({ "x": 0 })),
    );
    state.handle_change("x", 9);

    state.sync(&map(json!({ "sectionB": { "x": 7 } })));

    assert_eq!(state.form_data(), &map(json!({ "x": 0 })));
    assert!(!state.is_modified());
}

#[test]
fn test_reset_without_loaded_data_restores_defaults() {
    let mut state = FormState::new(&FieldMap::new(), "sectionA", map(json!({ "x": 0 })));
    state.handle_change("x", 4);
    assert!(state.is_modified());

    state.reset_form();

    assert_eq!(state.form_data(), &map(json!({ "x": 0 })));
    assert!(!state.is_modified());
}

#[test]
fn test_track_section_switches_source() {
    let data = map(json!({
        "library": { "books": 100 },
        "placement": { "placed": 42 },
    }));
    let mut state = FormState::new(&data, "library", FieldMap::new());
    state.handle_change("books", 1);

    state.track_section("placement", &data);

    assert_eq!(state.section_key(), "placement");
    assert_eq!(state.form_data(), &map(json!({ "placed": 42 })));
    assert!(!state.is_modified());
}

#[test]
fn test_payload_reflects_current_values() {
    let mut state = FormState::new(&FieldMap::new(), "finance", map(json!({ "budget": 0 })));
    state.handle_change("budget", 250000);

    assert_eq!(state.payload(), json!({ "budget": 250000 }));
}
