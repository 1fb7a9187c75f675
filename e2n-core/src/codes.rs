//! DVB parameter code tables.
//!
//! Scanfile consumers expect small integer codes instead of the strings the
//! upstream publications use. Every `*_to_code` function accepts loosely
//! formatted input, never fails, and falls back to a documented default
//! (logging a warning for unrecognized values). The `code_to_*` functions
//! return the canonical label for a code.

use crate::delivery::Delivery;

const POLARIZATION: &[(&str, u8)] = &[("H", 0), ("V", 1), ("L", 2), ("R", 3)];

const FEC: &[(&str, u8)] = &[
    ("NONE", 0),
    ("AUTO", 0),
    ("0", 0),
    ("1/2", 1),
    ("2/3", 2),
    ("3/4", 3),
    ("4/5", 4),
    ("5/6", 5),
    ("6/7", 6),
    ("7/8", 7),
    ("8/9", 8),
    ("9", 9),
];

const SYSTEM: &[(&str, u8)] = &[
    ("DVB-S", 0),
    ("DVB-C", 0),
    ("DVB-T", 0),
    ("DVB-S2", 1),
    ("DVB-C2", 1),
    ("DVB-T2", 1),
];

const MODULATION_SAT: &[(&str, u8)] = &[("AUTO", 0), ("QPSK", 1), ("8PSK", 2), ("QAM16", 3)];

const CONSTELLATION: &[(&str, u8)] = &[
    ("QPSK", 0),
    ("QAM16", 1),
    ("QAM32", 2),
    ("QAM64", 3),
    ("QAM128", 4),
    ("QAM256", 5),
    ("AUTO", 6),
];

const BANDWIDTH: &[(u64, u8)] = &[(8_000_000, 0), (7_000_000, 1), (6_000_000, 2), (0, 3)];

const TRANSMISSION_MODE: &[(&str, u8)] = &[("2K", 0), ("8K", 1), ("AUTO", 2)];

const GUARD_INTERVAL: &[(&str, u8)] =
    &[("1/32", 0), ("1/16", 1), ("1/8", 2), ("1/4", 3), ("AUTO", 4)];

const HIERARCHY: &[(&str, u8)] =
    &[("NONE", 0), ("0", 0), ("1", 1), ("2", 2), ("4", 3), ("AUTO", 4)];

/// Canonical labels, one per code, in code order.
pub const POLARIZATION_LABELS: &[&str] = &["H", "V", "L", "R"];
pub const FEC_LABELS: &[&str] = &["AUTO", "1/2", "2/3", "3/4", "4/5", "5/6", "6/7", "7/8", "8/9"];
pub const SYSTEM_LABELS: &[&str] = &["DVB-S", "DVB-S2"];
pub const MODULATION_SAT_LABELS: &[&str] = &["AUTO", "QPSK", "8PSK", "QAM16"];
pub const CONSTELLATION_LABELS: &[&str] =
    &["QPSK", "QAM16", "QAM32", "QAM64", "QAM128", "QAM256", "AUTO"];
pub const BANDWIDTH_LABELS: &[&str] = &["8MHz", "7MHz", "6MHz", "AUTO"];
pub const TRANSMISSION_MODE_LABELS: &[&str] = &["2k", "8k", "AUTO"];
pub const GUARD_INTERVAL_LABELS: &[&str] = &["1/32", "1/16", "1/8", "1/4", "AUTO"];
pub const HIERARCHY_LABELS: &[&str] = &["NONE", "1", "2", "4", "AUTO"];

fn lookup(table: &[(&str, u8)], key: &str) -> Option<u8> {
    table.iter().find(|(k, _)| *k == key).map(|(_, c)| *c)
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn label(labels: &'static [&'static str], code: u8, default: &'static str) -> &'static str {
    labels.get(code as usize).copied().unwrap_or(default)
}

/// `H`/`V`/`L`/`R` to 0..=3. Default 0 (H).
pub fn polarization_to_code(polarization: Option<&str>) -> u8 {
    let Some(value) = non_empty(polarization) else {
        return 0;
    };
    lookup(POLARIZATION, &value.to_ascii_uppercase()).unwrap_or_else(|| {
        log::warn!("Unknown polarization '{value}', defaulting to H (0)");
        0
    })
}

pub fn code_to_polarization(code: u8) -> &'static str {
    label(POLARIZATION_LABELS, code, "H")
}

/// Decode the numeric polarization stored in lamedb data lines.
pub fn polarization_from_lamedb(code: &str) -> Option<&'static str> {
    match code.trim().parse::<u8>() {
        Ok(c) if (c as usize) < POLARIZATION_LABELS.len() => Some(POLARIZATION_LABELS[c as usize]),
        _ => None,
    }
}

/// Code rate to 0..=9. `NONE`/`AUTO` map to 0, `9` is the alternate auto code.
pub fn fec_to_code(fec: Option<&str>) -> u8 {
    let Some(value) = non_empty(fec) else {
        return 0;
    };
    lookup(FEC, &value.to_ascii_uppercase()).unwrap_or_else(|| {
        log::warn!("Unknown FEC '{value}', defaulting to AUTO (0)");
        0
    })
}

pub fn code_to_fec(code: u8) -> &'static str {
    label(FEC_LABELS, code, "AUTO")
}

/// First-generation systems map to 0, second-generation (`*2`) to 1.
pub fn system_to_code(system: Option<&str>) -> u8 {
    let Some(value) = non_empty(system) else {
        return 0;
    };
    lookup(SYSTEM, &value.to_ascii_uppercase()).unwrap_or_else(|| {
        log::warn!("Unknown system '{value}', defaulting to 0");
        0
    })
}

pub fn code_to_system(code: u8) -> &'static str {
    label(SYSTEM_LABELS, code, "DVB-S")
}

/// Modulation code, delivery dependent.
///
/// Satellite uses 0=AUTO 1=QPSK 2=8PSK 3=QAM16 (default QPSK); cable and
/// terrestrial use the constellation table (default AUTO). Separators are
/// ignored so `QAM-256` and `QAM 256` read as `QAM256`.
pub fn modulation_to_code(modulation: Option<&str>, delivery: Delivery) -> u8 {
    let Some(value) = non_empty(modulation) else {
        return match delivery {
            Delivery::Sat => 1,
            _ => 6,
        };
    };
    let key: String = value
        .to_ascii_uppercase()
        .chars()
        .filter(|c| !matches!(c, '-' | ' ' | '_'))
        .collect();
    match delivery {
        Delivery::Sat => lookup(MODULATION_SAT, &key).unwrap_or_else(|| {
            log::warn!("Unknown satellite modulation '{value}', defaulting to QPSK (1)");
            1
        }),
        _ => constellation_code(&key, value),
    }
}

fn constellation_code(key: &str, raw: &str) -> u8 {
    lookup(CONSTELLATION, key).unwrap_or_else(|| {
        log::warn!("Unknown constellation '{raw}', defaulting to AUTO (6)");
        6
    })
}

pub fn code_to_modulation_sat(code: u8) -> &'static str {
    label(MODULATION_SAT_LABELS, code, "QPSK")
}

pub fn code_to_constellation(code: u8) -> &'static str {
    label(CONSTELLATION_LABELS, code, "AUTO")
}

/// Channel bandwidth in Hz to 0=8MHz 1=7MHz 2=6MHz 3=AUTO.
///
/// Values off the table snap to the nearest supported width.
pub fn bandwidth_to_code(bandwidth_hz: Option<u64>) -> u8 {
    let Some(hz) = bandwidth_hz.filter(|hz| *hz > 0) else {
        return 3;
    };
    if let Some((_, code)) = BANDWIDTH.iter().find(|(v, _)| *v == hz) {
        return *code;
    }
    let code = if hz >= 7_500_000 {
        0
    } else if hz >= 6_500_000 {
        1
    } else if hz >= 5_000_000 {
        2
    } else {
        3
    };
    log::warn!(
        "Unknown bandwidth {hz} Hz, using {} ({code})",
        code_to_bandwidth(code)
    );
    code
}

pub fn code_to_bandwidth(code: u8) -> &'static str {
    label(BANDWIDTH_LABELS, code, "AUTO")
}

/// Width in Hz for a bandwidth code; `None` for AUTO.
pub fn code_to_bandwidth_hz(code: u8) -> Option<u64> {
    BANDWIDTH
        .iter()
        .find(|(hz, c)| *c == code && *hz > 0)
        .map(|(hz, _)| *hz)
}

/// `2k`/`8k`/`AUTO` to 0..=2. Default AUTO.
pub fn transmission_mode_to_code(mode: Option<&str>) -> u8 {
    let Some(value) = non_empty(mode) else {
        return 2;
    };
    lookup(TRANSMISSION_MODE, &value.to_ascii_uppercase()).unwrap_or_else(|| {
        log::warn!("Unknown transmission mode '{value}', defaulting to AUTO (2)");
        2
    })
}

pub fn code_to_transmission_mode(code: u8) -> &'static str {
    label(TRANSMISSION_MODE_LABELS, code, "AUTO")
}

/// `1/32`..`1/4`/`AUTO` to 0..=4. Default AUTO.
pub fn guard_interval_to_code(interval: Option<&str>) -> u8 {
    let Some(value) = non_empty(interval) else {
        return 4;
    };
    lookup(GUARD_INTERVAL, &value.to_ascii_uppercase()).unwrap_or_else(|| {
        log::warn!("Unknown guard interval '{value}', defaulting to AUTO (4)");
        4
    })
}

pub fn code_to_guard_interval(code: u8) -> &'static str {
    label(GUARD_INTERVAL_LABELS, code, "AUTO")
}

/// `NONE`/`1`/`2`/`4`/`AUTO` to 0..=4. Default NONE.
pub fn hierarchy_to_code(hierarchy: Option<&str>) -> u8 {
    let Some(value) = non_empty(hierarchy) else {
        return 0;
    };
    lookup(HIERARCHY, &value.to_ascii_uppercase()).unwrap_or_else(|| {
        log::warn!("Unknown hierarchy '{value}', defaulting to NONE (0)");
        0
    })
}

pub fn code_to_hierarchy(code: u8) -> &'static str {
    label(HIERARCHY_LABELS, code, "NONE")
}

/// Highest valid code for a coded scanfile attribute, `None` for attributes
/// that carry plain numbers.
pub fn max_code(attribute: &str, delivery: Delivery) -> Option<u8> {
    match attribute {
        "polarization" => Some(3),
        "fec_inner" | "code_rate_hp" | "code_rate_lp" => Some(9),
        "system" => Some(1),
        "modulation" => Some(match delivery {
            Delivery::Sat => 3,
            _ => 6,
        }),
        "constellation" => Some(6),
        "bandwidth" => Some(3),
        "transmission_mode" => Some(2),
        "guard_interval" => Some(4),
        "hierarchy" => Some(4),
        _ => None,
    }
}

#[cfg(test)]
#[path = "tests/codes_tests.rs"]
mod tests;
