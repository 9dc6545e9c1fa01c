//! TypeScript Generation Tests
//!
//! Checks that the plain ACSP data types can be exported to TypeScript when the
//! tauri feature is enabled.

#[cfg(feature = "tauri")]
#[test]
fn test_core_types_implement_specta_type() {
    use specta::Type;

    // If this compiles, all types are properly configured for TypeScript export.
    fn assert_type<T: Type>() {}

    assert_type::<acsp::SessionInfo>();
    assert_type::<acsp::SessionKind>();
    assert_type::<acsp::DriverInfo>();
    assert_type::<acsp::LapTime>();
    assert_type::<acsp::TelemetrySample>();
    assert_type::<acsp::LeaderboardEntry>();
    assert_type::<acsp::StandingEntry>();
    assert_type::<acsp::UpdateRate>();
    assert_type::<acsp::DispatchStats>();
}

#[cfg(not(feature = "tauri"))]
#[test]
fn test_tauri_feature_disabled() {
    // Types still compile without specta::Type
    let _ = acsp::UpdateRate::Native;
}
