//! Variable store tests.
//!
//! These tests drive [`VariableStore`] through the in-memory environment
//! adapter and through a resolver that finds nothing, the way a step behaves
//! outside the task sequence host.

use std::collections::HashMap;
use std::sync::Arc;

use proptest::prelude::*;
use task_sequence::dispatch::{MemoryEnvironment, MemoryResolver, UnavailableResolver};
use task_sequence::{BindingState, DEFAULT_ENVIRONMENT_CLASS, TaskSequenceError, VariableStore};

fn store_over(env: &MemoryEnvironment) -> VariableStore {
    let resolver = MemoryResolver::new().with_object(DEFAULT_ENVIRONMENT_CLASS, env.clone());
    VariableStore::with_resolver(Arc::new(resolver))
}

fn unavailable_store() -> VariableStore {
    VariableStore::with_resolver(Arc::new(UnavailableResolver))
}

// =============================================================================
// Outside the host
// =============================================================================

#[test]
fn construction_without_host_succeeds() {
    let store = unavailable_store();
    assert_eq!(store.binding_state(), BindingState::Unbound);
    assert!(!store.is_available());
}

#[test]
fn operations_without_host_are_not_available() {
    let store = unavailable_store();

    assert!(store.get("OSDComputerName").unwrap_err().is_not_available());
    assert!(store.set("OSDComputerName", "PC01").unwrap_err().is_not_available());
    assert!(store.iter().unwrap_err().is_not_available());
    assert!(store.snapshot_to_map().unwrap_err().is_not_available());
}

#[test]
fn list_keys_without_host_is_empty() {
    let store = unavailable_store();
    assert_eq!(store.list_keys().unwrap(), Vec::<String>::new());
}

#[test]
fn construction_fault_is_not_available() {
    let resolver = MemoryResolver::new()
        .with_construction_fault(DEFAULT_ENVIRONMENT_CLASS, "server execution failed");
    let store = VariableStore::with_resolver(Arc::new(resolver));

    match store.get("X").unwrap_err() {
        TaskSequenceError::NotAvailable { class, reason } => {
            assert_eq!(class, DEFAULT_ENVIRONMENT_CLASS);
            assert!(reason.contains("server execution failed"));
        }
        other => panic!("expected NotAvailable, got {other:?}"),
    }
}

// =============================================================================
// Inside the host
// =============================================================================

#[test]
fn snapshot_contains_exactly_the_variables() {
    let env = MemoryEnvironment::with_variables([
        ("OSDComputerName", "PC01"),
        ("_SMSTSOrgName", "Acme"),
    ]);
    let store = store_over(&env);

    let expected: HashMap<String, String> = [
        ("OSDComputerName".to_string(), "PC01".to_string()),
        ("_SMSTSOrgName".to_string(), "Acme".to_string()),
    ]
    .into_iter()
    .collect();
    assert_eq!(store.snapshot_to_map().unwrap(), expected);
}

#[test]
fn iter_matches_list_keys_and_get() {
    let env = MemoryEnvironment::with_variables([("A", "1"), ("B", "2"), ("C", "")]);
    let store = store_over(&env);

    let keys = store.list_keys().unwrap();
    let entries: Vec<_> = store.iter().unwrap().collect::<Result<_, _>>().unwrap();

    assert_eq!(entries.len(), keys.len());
    for (entry, key) in entries.iter().zip(&keys) {
        assert_eq!(&entry.key, key);
        assert_eq!(entry.value, store.get(key).unwrap());
    }
}

#[test]
fn iter_is_restartable_and_sees_changes() {
    let env = MemoryEnvironment::with_variables([("A", "1")]);
    let store = store_over(&env);

    assert_eq!(store.iter().unwrap().count(), 1);
    env.insert("B", "2");
    assert_eq!(store.iter().unwrap().count(), 2);
}

#[test]
fn set_is_visible_to_host() {
    let env = MemoryEnvironment::new();
    let store = store_over(&env);

    store.set("OSDComputerName", "PC02").unwrap();
    assert_eq!(env.get("OSDComputerName").as_deref(), Some("PC02"));
    assert_eq!(store.binding_state(), BindingState::Bound);
}

#[test]
fn unknown_key_failure_passes_through() {
    let env = MemoryEnvironment::strict();
    let store = store_over(&env);

    let err = store.get("Missing").unwrap_err();
    assert!(err.is_native_failure());
    assert!(!err.is_not_available());
}

#[test]
fn set_failure_passes_through() {
    let env = MemoryEnvironment::new();
    env.fail_member("Value", "variable is read-only");
    let store = store_over(&env);

    let err = store.set("_SMSTSLogPath", "C:\\").unwrap_err();
    assert!(err.is_native_failure());
    assert!(err.to_string().contains("variable is read-only"));
}

#[test]
fn release_and_rebind() {
    let env = MemoryEnvironment::with_variables([("A", "1")]);
    let resolver = Arc::new(MemoryResolver::new().with_object(DEFAULT_ENVIRONMENT_CLASS, env));
    let mut store = VariableStore::with_resolver(resolver.clone());

    assert_eq!(store.get("A").unwrap(), "1");
    assert!(store.release());
    assert_eq!(store.binding_state(), BindingState::Unbound);
    assert_eq!(store.get("A").unwrap(), "1");
    assert_eq!(resolver.constructions(DEFAULT_ENVIRONMENT_CLASS), 2);
}

// =============================================================================
// Laws
// =============================================================================

proptest! {
    #[test]
    fn set_then_get_round_trips(key in "[A-Za-z_][A-Za-z0-9_]{0,24}", value in any::<String>()) {
        let store = store_over(&MemoryEnvironment::new());
        store.set(&key, &value).unwrap();
        prop_assert_eq!(store.get(&key).unwrap(), value);
    }

    #[test]
    fn list_keys_has_no_duplicates(keys in proptest::collection::vec("[A-Za-z_]{1,8}", 0..32)) {
        let env = MemoryEnvironment::new();
        for key in &keys {
            env.insert(key.as_str(), "v");
        }
        let store = store_over(&env);

        let listed = store.list_keys().unwrap();
        let unique: std::collections::HashSet<_> = listed.iter().collect();
        prop_assert_eq!(unique.len(), listed.len());
    }
}

#[test]
fn round_trip_empty_and_non_ascii() {
    let store = store_over(&MemoryEnvironment::new());
    for value in ["", "Müller", "計算機", "emoji 🚀"] {
        store.set("OSDRegisteredUserName", value).unwrap();
        assert_eq!(store.get("OSDRegisteredUserName").unwrap(), value);
    }
}
