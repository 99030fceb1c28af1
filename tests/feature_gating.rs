//! Integration tests for declaring, evaluating and overriding flags.

use flaggate::prelude::*;
use flaggate::{LayeredPropertySource, ValueSource};
use flaggate_testing::{FlagTestGuard, engine_for_test};
use once_cell::sync::Lazy;
use std::io::Write;
use std::sync::Arc;

/// Flag set shaped like a TV app's common features.
static COMMON_FEATURES: Lazy<FlagTable> = Lazy::new(|| {
    FlagTable::new()
        .declare_described(
            "system_app",
            Predicate::property("app.system", false),
            "Installed on the system partition",
        )
        .and_then(|t| {
            t.declare_described(
                "dvr",
                Predicate::and([
                    Predicate::variant_in([BuildVariant::Eng, BuildVariant::UserDebug]),
                    Predicate::flag("system_app"),
                ]),
                "Recording support",
            )
        })
        .and_then(|t| t.declare("tuner", Predicate::property("tv.tuner", true)))
        .and_then(|t| {
            t.declare(
                "upcoming_conflict_dialog",
                Predicate::and([Predicate::flag("dvr"), Predicate::flag("tuner")]),
            )
        })
        .and_then(|t| {
            t.declare(
                "cloud_epg",
                Predicate::or([
                    Predicate::property("epg.cloud", false),
                    Predicate::variant_in([BuildVariant::Eng]),
                ]),
            )
        })
        .unwrap()
});

// =============================================================================
// Declaration
// =============================================================================

#[test]
fn test_common_features_validate() {
    let (engine, _) = engine_for_test(COMMON_FEATURES.clone(), BuildVariant::User);
    assert_eq!(engine.validate(), Ok(()));
    assert_eq!(engine.table().len(), 5);
}

// =============================================================================
// Evaluation
// =============================================================================

#[test]
fn test_dvr_off_on_user_builds_even_for_system_app() {
    let (engine, properties) = engine_for_test(COMMON_FEATURES.clone(), BuildVariant::User);
    properties.set("app.system", true).unwrap();

    assert!(engine.evaluate("system_app").unwrap());
    assert!(!engine.evaluate("dvr").unwrap());
    assert!(!engine.evaluate("upcoming_conflict_dialog").unwrap());
}

#[test]
fn test_dvr_on_userdebug_for_system_app() {
    let (engine, properties) = engine_for_test(COMMON_FEATURES.clone(), BuildVariant::UserDebug);
    properties.set("app.system", "yes").unwrap();

    assert!(engine.evaluate("dvr").unwrap());
    assert!(engine.evaluate("upcoming_conflict_dialog").unwrap());
}

#[test]
fn test_variant_short_circuits_property_read() {
    let (engine, properties) = engine_for_test(COMMON_FEATURES.clone(), BuildVariant::User);

    assert!(!engine.evaluate("dvr").unwrap());
    assert!(!properties.was_read("app.system"));

    assert!(!engine.evaluate("cloud_epg").unwrap());
    assert_eq!(properties.lookups(), vec!["epg.cloud"]);
}

#[test]
fn test_malformed_property_is_not_an_error() {
    let (engine, properties) = engine_for_test(COMMON_FEATURES.clone(), BuildVariant::Eng);
    properties.set("tv.tuner", "definitely").unwrap();

    assert_eq!(engine.evaluate("tuner"), Ok(true));
}

#[test]
fn test_typo_is_an_error_not_false() {
    let (engine, _) = engine_for_test(COMMON_FEATURES.clone(), BuildVariant::Eng);

    assert_eq!(
        engine.evaluate("dvrr"),
        Err(FlagError::UnknownFlag("dvrr".to_string()))
    );
}

// =============================================================================
// Overrides
// =============================================================================

#[test]
fn test_override_until_reset() {
    let (engine, properties) = engine_for_test(COMMON_FEATURES.clone(), BuildVariant::User);
    properties.set("app.system", true).unwrap();

    engine.init_for_test();
    assert!(!engine.evaluate("dvr").unwrap());

    engine.set_override("dvr", true).unwrap();
    assert!(engine.evaluate("dvr").unwrap());
    assert!(engine.evaluate("upcoming_conflict_dialog").unwrap());

    engine.reset_all();
    assert!(!engine.evaluate("dvr").unwrap());
    assert!(!engine.evaluate("upcoming_conflict_dialog").unwrap());
}

#[test]
fn test_guard_forces_either_branch_of_composite() {
    let (engine, _) = engine_for_test(COMMON_FEATURES.clone(), BuildVariant::Eng);

    {
        let guard = FlagTestGuard::new(&engine);
        guard.set_all([("dvr", true), ("tuner", false)]).unwrap();
        assert!(!engine.evaluate("upcoming_conflict_dialog").unwrap());

        guard.set("tuner", true).unwrap();
        assert!(engine.evaluate("upcoming_conflict_dialog").unwrap());
    }

    assert!(!engine.is_test_mode());
    assert!(!engine.evaluate("dvr").unwrap());
}

// =============================================================================
// Property sources
// =============================================================================

#[test]
fn test_file_backed_properties_under_runtime_overrides() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"app": {{"system": true}}, "tv": {{"tuner": false}}}}"#).unwrap();

    let defaults = PropertyStore::new();
    defaults.load_file(file.path()).unwrap();

    let runtime = PropertyStore::new();
    runtime.set("tv.tuner", "on").unwrap();

    let layered = LayeredPropertySource::new()
        .with_layer(Arc::new(runtime))
        .with_layer(Arc::new(defaults));

    let engine = FlagEngine::new(
        COMMON_FEATURES.clone(),
        Arc::new(layered),
        Arc::new(FixedBuildContext(BuildVariant::Eng)),
    );

    assert!(engine.evaluate("system_app").unwrap());
    assert!(engine.evaluate("tuner").unwrap());
    assert!(engine.evaluate("upcoming_conflict_dialog").unwrap());
}

// =============================================================================
// Diagnostics
// =============================================================================

#[test]
fn test_snapshot_reports_every_flag() {
    let (engine, _) = engine_for_test(COMMON_FEATURES.clone(), BuildVariant::User);
    engine.set_override("tuner", false).unwrap();

    let snapshot = engine.snapshot();
    let names: Vec<&str> = snapshot.flags.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["system_app", "dvr", "tuner", "upcoming_conflict_dialog", "cloud_epg"]
    );

    let tuner = &snapshot.flags[2];
    assert_eq!(tuner.source, ValueSource::Override);
    assert_eq!(tuner.value, Some(false));

    let dvr = &snapshot.flags[1];
    assert_eq!(dvr.description.as_deref(), Some("Recording support"));

    let json = serde_json::to_string(&snapshot).unwrap();
    assert!(json.contains("\"test_mode\":true"));
}
