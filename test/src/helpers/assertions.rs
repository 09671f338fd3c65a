/// Assert that a host's ghost table still holds its partition layout
#[macro_export]
macro_rules! assert_table_consistent {
    ($connection:expr) => {
        if let Err(err) = $connection.host().table().check_invariants() {
            panic!("ghost table corrupted: {err}");
        }
    };
}

/// Assert how many times an event was logged
#[macro_export]
macro_rules! assert_event_count {
    ($log:expr, $pattern:pat, $count:expr) => {
        let found = $log
            .lock()
            .unwrap()
            .iter()
            .filter(|event| matches!(event, $pattern))
            .count();
        assert_eq!(
            found,
            $count,
            "expected {} events matching {}",
            $count,
            stringify!($pattern)
        );
    };
}
