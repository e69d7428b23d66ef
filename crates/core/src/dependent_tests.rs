// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn add_reports_new_ids_only() {
    let mut set = DependentIdSet::undefined();
    assert!(set.add("p1").unwrap());
    assert!(!set.add("p1").unwrap());
    assert!(set.add("p2").unwrap());
    assert_eq!(set.len(), 2);
}

#[test]
fn remove_reports_presence() {
    let mut set = DependentIdSet::empty();
    set.add("p1").unwrap();
    assert!(!set.remove("p2").unwrap());
    assert!(set.remove("p1").unwrap());
    assert!(!set.remove("p1").unwrap());
    assert!(set.is_defined());
}

#[test]
fn remove_on_undefined_is_false() {
    let mut set = DependentIdSet::undefined();
    assert!(!set.remove("p1").unwrap());
    assert!(!set.is_defined());
}

#[yare::parameterized(
    add    = { true },
    remove = { false },
)]
fn empty_id_is_invalid(adding: bool) {
    let mut set = DependentIdSet::empty();
    let result = if adding { set.add("") } else { set.remove("") };
    assert_eq!(result, Err(ReconcileError::InvalidArgument("id")));
}

#[test]
fn set_all_none_is_distinct_from_empty() {
    let mut a = DependentIdSet::empty();
    a.add("p1").unwrap();
    a.set_all(None::<Vec<String>>).unwrap();

    let mut b = DependentIdSet::undefined();
    b.set_all(Some(Vec::<String>::new())).unwrap();

    assert_eq!(a.get_all(), None);
    assert_eq!(b.get_all().map(BTreeSet::len), Some(0));
    assert_ne!(a, b);
    assert_eq!(serde_json::to_string(&a).unwrap(), "null");
    assert_eq!(serde_json::to_string(&b).unwrap(), "[]");
}

#[test]
fn set_all_dedupes_and_ignores_order() {
    let mut a = DependentIdSet::undefined();
    a.set_all(Some(["p2", "p1", "p2"])).unwrap();
    let mut b = DependentIdSet::undefined();
    b.set_all(Some(["p1", "p2"])).unwrap();

    assert_eq!(a, b);
    assert_eq!(a.len(), 2);
}

#[test]
fn set_all_rejects_empty_id_without_mutating() {
    let mut set = DependentIdSet::empty();
    set.add("p1").unwrap();
    assert!(set.set_all(Some(["p2", ""])).is_err());
    assert!(set.contains("p1"));
    assert!(!set.contains("p2"));
}

#[test]
fn deserialize_goes_through_validation() {
    let set: DependentIdSet = serde_json::from_str(r#"["b","a","b"]"#).unwrap();
    assert_eq!(set.len(), 2);
    assert!(set.contains("a"));

    let undefined: DependentIdSet = serde_json::from_str("null").unwrap();
    assert!(!undefined.is_defined());

    assert!(serde_json::from_str::<DependentIdSet>(r#"["a",""]"#).is_err());
}
