#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Parse and validation errors are fine; panics are not.
    if let Ok(cfg) = patrol_config::load_toml(data)
        && cfg.validate().is_ok()
    {
        let params = patrol_core::PatrolParams::from(&cfg);
        let _ = patrol_core::builder::validate_params(&params);
    }
});
