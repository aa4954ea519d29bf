//! Setup/open/close round trips for every backend.

use blockvault::{SetupRequest, StorageError};

use crate::support::{pattern_block, BackendCase};

#[test]
fn test_end_to_end_scenario() {
    for case in BackendCase::all() {
        let name = case.storage_name("e2e");
        let mut dev = case
            .factory
            .setup(SetupRequest::new(&name, 16, 4).with_header(b"hdr".to_vec()))
            .unwrap();

        assert_eq!(dev.storage_type(), case.type_name);
        assert_eq!(dev.block_size(), 16);
        assert_eq!(dev.block_count(), 4);
        assert_eq!(dev.header_data(), b"hdr");

        dev.write_block(2, b"0123456789ABCDEF").unwrap();
        assert_eq!(dev.read_block(2).unwrap(), b"0123456789ABCDEF");

        dev.update_header_data(b"new-header-bytes").unwrap();
        dev.close();

        let mut dev = case.factory.open(&name).unwrap();
        assert_eq!(dev.header_data(), b"new-header-bytes");
        assert_eq!(dev.read_block(2).unwrap(), b"0123456789ABCDEF");
        // Untouched blocks come back zero-filled.
        assert_eq!(dev.read_block(0).unwrap(), vec![0u8; 16]);
        dev.close();
    }
}

#[test]
fn test_setup_refuses_existing_storage() {
    for case in BackendCase::all() {
        let name = case.storage_name("existing");
        let mut dev = case
            .factory
            .setup(SetupRequest::new(&name, 16, 4))
            .unwrap();
        dev.write_block(0, &pattern_block(16, 7)).unwrap();
        dev.close();

        let result = case.factory.setup(SetupRequest::new(&name, 16, 4));
        assert!(
            matches!(result, Err(StorageError::AlreadyExists { .. })),
            "{} backend accepted a clobbering setup",
            case.type_name
        );

        // The refused setup left the original contents alone.
        let mut dev = case.factory.open(&name).unwrap();
        assert_eq!(dev.read_block(0).unwrap(), pattern_block(16, 7));
        dev.close();
    }
}

#[test]
fn test_setup_overwrite_reformats() {
    for case in BackendCase::all() {
        let name = case.storage_name("overwrite");
        let mut dev = case
            .factory
            .setup(SetupRequest::new(&name, 16, 4).with_header(b"old".to_vec()))
            .unwrap();
        dev.write_block(0, &pattern_block(16, 9)).unwrap();
        dev.close();

        let mut dev = case
            .factory
            .setup(SetupRequest::new(&name, 16, 4).with_overwrite(true))
            .unwrap();
        assert_eq!(dev.read_block(0).unwrap(), vec![0u8; 16]);
        assert!(dev.header_data().is_empty());
        dev.close();
    }
}

#[test]
fn test_open_missing_storage() {
    for case in BackendCase::all() {
        let result = case.factory.open(&case.storage_name("missing"));
        assert!(
            matches!(result, Err(StorageError::NotFound { .. })),
            "{} backend did not report a missing resource",
            case.type_name
        );
    }
}

#[test]
fn test_close_is_idempotent() {
    for case in BackendCase::all() {
        let mut dev = case
            .factory
            .setup(case.setup_request("close", 16, 4))
            .unwrap();

        assert!(!dev.is_closed());
        dev.close();
        assert!(dev.is_closed());
        dev.close(); // Second close is a no-op, not an error.
        assert!(dev.is_closed());
    }
}

#[test]
fn test_operations_after_close_fail() {
    for case in BackendCase::all() {
        let mut dev = case
            .factory
            .setup(
                SetupRequest::new(case.storage_name("after-close"), 16, 4)
                    .with_header(b"diag".to_vec()),
            )
            .unwrap();
        dev.close();

        assert!(matches!(
            dev.read_block(0),
            Err(StorageError::DeviceClosed { .. })
        ));
        assert!(matches!(
            dev.write_block(0, &pattern_block(16, 1)),
            Err(StorageError::DeviceClosed { .. })
        ));
        assert!(matches!(
            dev.update_header_data(b"x"),
            Err(StorageError::DeviceClosed { .. })
        ));
        assert!(matches!(
            dev.clone_device(&case.storage_name("after-close-clone")),
            Err(StorageError::DeviceClosed { .. })
        ));

        // Diagnostics stay readable as last-known values.
        assert_eq!(dev.header_data(), b"diag");
        assert_eq!(dev.block_size(), 16);
        assert_eq!(dev.block_count(), 4);
    }
}

#[test]
fn test_drop_releases_the_resource() {
    for case in BackendCase::all() {
        let name = case.storage_name("drop");
        {
            let mut dev = case
                .factory
                .setup(SetupRequest::new(&name, 16, 2))
                .unwrap();
            dev.write_block(1, &pattern_block(16, 3)).unwrap();
            // No explicit close; Drop must release the resource (and any
            // exclusive lock) so a reopen succeeds.
        }

        let mut dev = case.factory.open(&name).unwrap();
        assert_eq!(dev.read_block(1).unwrap(), pattern_block(16, 3));
        dev.close();
    }
}

#[test]
fn test_io_counters_accumulate() {
    for case in BackendCase::all() {
        let mut dev = case
            .factory
            .setup(case.setup_request("counters", 32, 8))
            .unwrap();

        assert_eq!(dev.bytes_sent(), 0);
        assert_eq!(dev.bytes_received(), 0);

        for index in 0..3 {
            dev.write_block(index, &pattern_block(32, index as u8)).unwrap();
        }
        dev.read_block(0).unwrap();
        dev.read_block(1).unwrap();

        assert_eq!(dev.bytes_sent(), 3 * 32);
        assert_eq!(dev.bytes_received(), 2 * 32);

        // Failed operations leave the counters alone.
        dev.read_block(99).unwrap_err();
        assert_eq!(dev.bytes_received(), 2 * 32);

        dev.close();
    }
}

#[test]
fn test_header_only_device() {
    for case in BackendCase::all() {
        let name = case.storage_name("header-only");
        let mut dev = case
            .factory
            .setup(SetupRequest::new(&name, 32, 0).with_header(b"meta".to_vec()))
            .unwrap();

        assert_eq!(dev.block_count(), 0);
        assert!(matches!(
            dev.read_block(0),
            Err(StorageError::IndexOutOfRange { .. })
        ));

        dev.update_header_data(b"meta-v2").unwrap();
        dev.close();

        let mut dev = case.factory.open(&name).unwrap();
        assert_eq!(dev.header_data(), b"meta-v2");
        dev.close();
    }
}
