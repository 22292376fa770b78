#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = patrol_core::decode_json(data);
    if let Ok(line) = std::str::from_utf8(data)
        && let Ok(cmd) = patrol_core::decode_line(line)
        && let Some(arc) = cmd.arc
    {
        let w = patrol_core::clamp_arc(arc.width_deg());
        assert!(
            (patrol_core::angle::MIN_ACTIVE_ARC_DEG..=patrol_core::angle::MAX_REVERSING_ARC_DEG)
                .contains(&w)
        );
    }
});
