use super::*;

#[test]
fn test_polarization_roundtrip() {
    for label in POLARIZATION_LABELS {
        assert_eq!(code_to_polarization(polarization_to_code(Some(label))), *label);
    }
    assert_eq!(polarization_to_code(Some("v")), 1);
}

#[test]
fn test_fec_roundtrip() {
    for label in FEC_LABELS {
        assert_eq!(code_to_fec(fec_to_code(Some(label))), *label);
    }
    assert_eq!(fec_to_code(Some("NONE")), 0);
    assert_eq!(fec_to_code(Some("9")), 9);
    assert_eq!(code_to_fec(9), "AUTO");
}

#[test]
fn test_system_roundtrip() {
    for label in SYSTEM_LABELS {
        assert_eq!(code_to_system(system_to_code(Some(label))), *label);
    }
    assert_eq!(system_to_code(Some("dvb-t2")), 1);
    assert_eq!(system_to_code(Some("DVB-C")), 0);
}

#[test]
fn test_modulation_roundtrip() {
    for label in MODULATION_SAT_LABELS {
        assert_eq!(
            code_to_modulation_sat(modulation_to_code(Some(label), Delivery::Sat)),
            *label
        );
    }
    for label in CONSTELLATION_LABELS {
        assert_eq!(
            code_to_constellation(modulation_to_code(Some(label), Delivery::Cable)),
            *label
        );
    }
    assert_eq!(modulation_to_code(Some("QAM-256"), Delivery::Cable), 5);
}

#[test]
fn test_modulation_defaults_depend_on_delivery() {
    assert_eq!(modulation_to_code(None, Delivery::Sat), 1);
    assert_eq!(modulation_to_code(None, Delivery::Cable), 6);
    assert_eq!(modulation_to_code(Some("COFDM"), Delivery::Terrestrial), 6);
    assert_eq!(modulation_to_code(Some("16APSK"), Delivery::Sat), 1);
}

#[test]
fn test_bandwidth_roundtrip_and_snapping() {
    for code in 0..3u8 {
        let hz = code_to_bandwidth_hz(code);
        assert_eq!(bandwidth_to_code(hz), code);
    }
    assert_eq!(code_to_bandwidth_hz(3), None);
    assert_eq!(bandwidth_to_code(None), 3);
    assert_eq!(bandwidth_to_code(Some(7_900_000)), 0);
    assert_eq!(bandwidth_to_code(Some(6_800_000)), 1);
    assert_eq!(bandwidth_to_code(Some(5_000_000)), 2);
    assert_eq!(bandwidth_to_code(Some(1_700_000)), 3);
    assert_eq!(code_to_bandwidth(0), "8MHz");
}

#[test]
fn test_terrestrial_tables_roundtrip() {
    for label in TRANSMISSION_MODE_LABELS {
        assert_eq!(
            code_to_transmission_mode(transmission_mode_to_code(Some(label))),
            *label
        );
    }
    for label in GUARD_INTERVAL_LABELS {
        assert_eq!(code_to_guard_interval(guard_interval_to_code(Some(label))), *label);
    }
    for label in HIERARCHY_LABELS {
        assert_eq!(code_to_hierarchy(hierarchy_to_code(Some(label))), *label);
    }
}

#[test]
fn test_unknown_input_falls_back_to_defaults() {
    assert_eq!(polarization_to_code(Some("X")), 0);
    assert_eq!(polarization_to_code(None), 0);
    assert_eq!(fec_to_code(Some("11/12")), 0);
    assert_eq!(system_to_code(Some("ATSC")), 0);
    assert_eq!(transmission_mode_to_code(Some("32k")), 2);
    assert_eq!(guard_interval_to_code(Some("19/256")), 4);
    assert_eq!(hierarchy_to_code(Some("8")), 0);
}

#[test]
fn test_lamedb_polarization() {
    assert_eq!(polarization_from_lamedb("0"), Some("H"));
    assert_eq!(polarization_from_lamedb("3"), Some("R"));
    assert_eq!(polarization_from_lamedb("7"), None);
}
