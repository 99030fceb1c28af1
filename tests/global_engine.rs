//! The process-wide engine. Kept in its own test binary because it can be
//! installed only once per process.

use flaggate::global;
use flaggate::prelude::*;
use std::sync::Arc;

#[test]
fn test_install_once_and_query() {
    assert!(global::engine().is_none());
    assert_eq!(global::is_enabled("dvr"), Err(FlagError::NotInstalled));
    assert!(!global::is_running_in_test());

    let properties = PropertyStore::new();
    properties.set("app.system", true).unwrap();

    let table = FlagTable::new()
        .declare("dvr", Predicate::property("app.system", false))
        .unwrap();
    let engine = FlagEngine::new(
        table.clone(),
        Arc::new(properties),
        Arc::new(FixedBuildContext(BuildVariant::Eng)),
    );

    let installed = global::install(engine).unwrap();
    assert!(global::is_enabled("dvr").unwrap());

    installed.init_for_test();
    assert!(global::is_running_in_test());
    installed.set_override("dvr", false).unwrap();
    assert!(!global::is_enabled("dvr").unwrap());
    installed.reset_all();
    assert!(global::is_enabled("dvr").unwrap());

    let second = FlagEngine::from_env(table, Some("FLAGGATE_TEST"));
    assert!(global::install(second).is_err());
}
