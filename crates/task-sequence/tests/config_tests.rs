//! Configuration tests.

use std::sync::Arc;

use task_sequence::dispatch::{MemoryEnvironment, MemoryResolver};
use task_sequence::{
    AutomationConfig, DEFAULT_ENVIRONMENT_CLASS, DEFAULT_PROGRESS_CLASS, ResultCodes,
    TaskSequenceError, VariableStore,
};

#[test]
fn empty_toml_keeps_defaults() {
    let config = AutomationConfig::from_toml_str("").unwrap();
    assert_eq!(config, AutomationConfig::default());
    assert_eq!(config.environment_class, DEFAULT_ENVIRONMENT_CLASS);
    assert_eq!(config.progress_class, DEFAULT_PROGRESS_CLASS);
}

#[test]
fn class_overrides() {
    let config = AutomationConfig::from_toml_str(
        r#"
        environment_class = "Contoso.TSEnvironment"
        progress_class = "Contoso.TsProgressUI"
        "#,
    )
    .unwrap();
    assert_eq!(config.environment_class, "Contoso.TSEnvironment");
    assert_eq!(config.progress_class, "Contoso.TsProgressUI");
}

#[test]
fn partial_result_codes() {
    let config = AutomationConfig::from_toml_str(
        r"
        [result_codes]
        yes = 60
        continue = 110
        ",
    )
    .unwrap();
    assert_eq!(config.result_codes.yes, 60);
    assert_eq!(config.result_codes.continue_, 110);
    assert_eq!(config.result_codes.no, ResultCodes::default().no);
}

#[test]
fn ambiguous_result_codes_are_rejected() {
    let err = AutomationConfig::from_toml_str("[result_codes]\nno = 6\n").unwrap_err();
    assert!(matches!(err, TaskSequenceError::Config { .. }));
    assert!(err.to_string().contains("YesNo"));
}

#[test]
fn ambiguous_result_codes_fail_validate() {
    let config = AutomationConfig::new().result_codes(ResultCodes {
        retry: 2,
        ..ResultCodes::default()
    });
    // Retry and Cancel share a layout
    assert!(config.validate().is_err());
}

#[test]
fn malformed_toml_is_config_error() {
    let err = AutomationConfig::from_toml_str("environment_class = [").unwrap_err();
    assert!(matches!(err, TaskSequenceError::Config { .. }));
}

#[test]
fn wrong_type_is_config_error() {
    let err = AutomationConfig::from_toml_str("progress_class = 5").unwrap_err();
    assert!(matches!(err, TaskSequenceError::Config { .. }));
}

#[test]
fn empty_class_is_config_error() {
    let err = AutomationConfig::from_toml_str(r#"progress_class = """#).unwrap_err();
    assert!(err.to_string().contains("progress_class"));
}

#[test]
fn load_missing_file() {
    let path = std::env::temp_dir().join("task-sequence-config-does-not-exist.toml");
    let err = AutomationConfig::load(&path).unwrap_err();
    assert!(matches!(err, TaskSequenceError::Config { .. }));
}

#[test]
fn load_from_file() {
    let path = std::env::temp_dir().join(format!(
        "task-sequence-config-{}.toml",
        std::process::id()
    ));
    std::fs::write(&path, "environment_class = \"Contoso.Env\"\n").unwrap();
    let config = AutomationConfig::load(&path);
    std::fs::remove_file(&path).unwrap();

    let config = config.unwrap();
    assert_eq!(config.environment_class, "Contoso.Env");
    assert_eq!(config.progress_class, DEFAULT_PROGRESS_CLASS);
}

#[test]
fn configured_class_is_bound() {
    let env = MemoryEnvironment::with_variables([("_SMSTSOrgName", "Contoso")]);
    let resolver = Arc::new(MemoryResolver::new().with_object("Contoso.Env", env));
    let config = AutomationConfig::from_toml_str("environment_class = \"Contoso.Env\"").unwrap();

    let store = VariableStore::from_config(&config, resolver);
    assert_eq!(store.get("_SMSTSOrgName").unwrap(), "Contoso");
}
