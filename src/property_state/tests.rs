use super::*;

#[test]
fn add_and_get() {
    let id = InstanceId::new();
    let mut s = PropertyStates::new();
    let f = FieldReference::new(id, "Summary");
    assert!(!s.get_state(&f));
    s.add(f.clone());
    assert!(s.get_state(&f));
    assert!(!s.get_state(&FieldReference::new(id, "Date")));
}

#[test]
fn add_is_idempotent() {
    let mut s = PropertyStates::new();
    let f = FieldReference::new(InstanceId::new(), "Summary");
    s.add(f.clone());
    s.add(f.clone());
    assert_eq!(s.len(), 1);
    s.clear_state(&f);
    assert!(s.is_empty());
}

#[test]
fn update_reflects_current_comparison() {
    let mut s = PropertyStates::new();
    let f = FieldReference::new(InstanceId::new(), "TemperatureC");
    s.update(f.clone(), true);
    assert!(s.get_state(&f));
    s.update(f.clone(), true);
    assert_eq!(s.len(), 1);
    s.update(f.clone(), false);
    assert!(!s.get_state(&f));
}

#[test]
fn has_states_scoped_by_instance() {
    let a = InstanceId::new();
    let b = InstanceId::new();
    let mut s = PropertyStates::new();
    assert!(!s.has_states(None));

    s.add(FieldReference::new(a, "Date"));
    assert!(s.has_states(None));
    assert!(s.has_states(Some(a)));
    assert!(!s.has_states(Some(b)));

    s.add(FieldReference::new(b, "Date"));
    s.clear_instance(a);
    assert!(!s.has_states(Some(a)));
    assert!(s.has_states(Some(b)));

    s.clear_all();
    assert!(!s.has_states(None));
}
