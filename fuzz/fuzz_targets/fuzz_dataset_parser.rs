#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    for parse_units in [true, false] {
        if let Ok(ds) = tuner_config::parse_step_test_csv(data, parse_units) {
            // A successful load is never empty and keeps the columns aligned
            assert!(!ds.is_empty());
            assert_eq!(ds.time.len(), ds.pv.len());
            assert_eq!(ds.time.len(), ds.cv.len());
            assert!(ds.time.iter().chain(&ds.pv).chain(&ds.cv).all(|v| v.is_finite()));
        }
    }
});
