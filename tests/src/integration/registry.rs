//! Backend registration and resolution.

use std::sync::Arc;

use blockvault::{DeviceRegistry, RamBackend, RegistryError, SetupRequest};

use crate::support::unique_name;

#[test]
fn test_register_then_resolve() {
    let registry = DeviceRegistry::new();
    registry.register("scratch", Arc::new(RamBackend)).unwrap();

    let factory = registry.resolve("scratch").unwrap();
    assert_eq!(factory.storage_type(), "ram");

    // The resolved factory is fully usable.
    let name = unique_name("registry-scratch");
    let mut dev = factory.setup(SetupRequest::new(&name, 16, 2)).unwrap();
    dev.write_block(0, &[0x55; 16]).unwrap();
    assert_eq!(dev.read_block(0).unwrap(), vec![0x55; 16]);
    dev.close();
    RamBackend::purge(&name);
}

#[test]
fn test_duplicate_registration_is_an_error() {
    let registry = DeviceRegistry::new();
    registry.register("dup", Arc::new(RamBackend)).unwrap();

    let result = registry.register("dup", Arc::new(RamBackend));
    assert!(matches!(
        result,
        Err(RegistryError::DuplicateType { ref name }) if name == "dup"
    ));
}

#[test]
fn test_resolve_before_registration_is_an_error() {
    let registry = DeviceRegistry::new();

    let err = registry.resolve("never-registered").err().unwrap();
    assert!(matches!(err, RegistryError::UnknownType { .. }));
}

#[test]
fn test_unknown_type_error_names_the_alternatives() {
    let registry = DeviceRegistry::with_builtin();

    let err = registry.resolve("s3").err().unwrap();
    match err {
        RegistryError::UnknownType { name, registered } => {
            assert_eq!(name, "s3");
            assert_eq!(registered, vec!["file", "ram"]);
        }
        other => panic!("Expected UnknownType, got {:?}", other),
    }
}

#[test]
fn test_global_registry_serves_builtin_backends() {
    let registry = DeviceRegistry::global();

    assert!(registry.is_registered("ram"));
    assert!(registry.is_registered("file"));
    assert!(blockvault::resolve("ram").is_ok());
    assert!(blockvault::resolve("file").is_ok());
}

#[test]
fn test_third_party_name_coexists_with_builtin() {
    let registry = DeviceRegistry::with_builtin();
    registry
        .register("ram-snapshots", Arc::new(RamBackend))
        .unwrap();

    assert_eq!(
        registry.registered_types(),
        vec!["file", "ram", "ram-snapshots"]
    );
}
