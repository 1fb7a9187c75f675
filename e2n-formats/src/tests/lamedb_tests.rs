use super::*;

const LAMEDB4: &str = "eDVB services /4/
transponders
00c00000:0421:0001
\ts 11493750:22000000:0:4:192:2:0:1:2:0:0
/
00c00000:03fb:0001
\ts 12187500:27500000:1:3:192:2:0
/
end
services
6dca:00c00000:0421:0001:1:0
Das Erste HD
p:ARD
/
283d:00c00000:03fb:0001:19:0
ZDF HD
p:ZDF,c:000d05,c:001702
f:4
/
2b66:00c00000:0421:0001:2:0
Bayern 1
p:ARD
/
end
";

const LAMEDB5: &str = "eDVB services /5/
# comment
t:00c00000:0421:0001,s:11493750:22000000:0:4:192:2:0
s:6dca:00c00000:0421:0001:1:0,\"Das Erste HD\",p:ARD,c:000d05
";

#[test]
fn test_parse_v4_transponders() {
    let db = parse_lamedb(LAMEDB4, "lamedb").unwrap();
    assert_eq!(db.version, 4);
    assert_eq!(db.transponders.len(), 2);

    let t = &db.transponders["00c00000:0421:0001"];
    assert_eq!(t.delivery, Delivery::Sat);
    assert_eq!(t.frequency, 11_493_750);
    assert_eq!(t.symbol_rate, Some(22_000_000));
    assert_eq!(t.polarization.as_deref(), Some("H"));
    assert_eq!(t.fec.as_deref(), Some("4"));
    assert_eq!(t.orbital_position, Some(19.2));
    assert_eq!(t.system.as_deref(), Some("1"));
    assert_eq!(t.modulation.as_deref(), Some("2"));
    assert!(t.extra.contains_key("raw_fields"));

    let v = &db.transponders["00c00000:03fb:0001"];
    assert_eq!(v.polarization.as_deref(), Some("V"));
    assert_eq!(v.modulation, None);
}

#[test]
fn test_parse_v4_services_and_properties() {
    let db = parse_lamedb(LAMEDB4, "lamedb").unwrap();
    assert_eq!(db.services.len(), 3);

    let ard = &db.services["00c00000:0421:0001:6dca"];
    assert_eq!(ard.name, "Das Erste HD");
    assert_eq!(ard.provider.as_deref(), Some("ARD"));
    assert_eq!(ard.service_type, 1);
    assert!(!ard.is_radio);

    let zdf = &db.services["00c00000:03fb:0001:283d"];
    assert_eq!(zdf.service_type, 19);
    assert_eq!(zdf.provider.as_deref(), Some("ZDF"));
    assert_eq!(zdf.caids, vec![0x0d05, 0x1702]);
    assert_eq!(zdf.extra.get("cas").map(String::as_str), Some("000d05,001702"));
    assert_eq!(zdf.extra.get("flags").map(String::as_str), Some("4"));

    assert!(db.services["00c00000:0421:0001:2b66"].is_radio);
}

#[test]
fn test_parse_v5_single_line_records() {
    let db = parse_lamedb(LAMEDB5, "lamedb5").unwrap();
    assert_eq!(db.version, 5);
    assert_eq!(db.transponders.len(), 1);
    let s = &db.services["00c00000:0421:0001:6dca"];
    assert_eq!(s.name, "Das Erste HD");
    assert_eq!(s.provider.as_deref(), Some("ARD"));
    assert_eq!(s.caids, vec![0x0d05]);
    assert_eq!(db.transponders["00c00000:0421:0001"].orbital_position, Some(19.2));
}

#[test]
fn test_rejects_missing_header() {
    let err = parse_lamedb("transponders\nend\n", "broken").unwrap_err();
    assert!(err.to_string().contains("does not look like a lamedb file"));
}

#[test]
fn test_rejects_short_service_descriptor() {
    let text = "eDVB services /4/\nservices\n6dca:00c00000:0421\nName\n/\nend\n";
    let err = parse_lamedb(text, "lamedb").unwrap_err();
    assert!(err.to_string().contains("invalid service descriptor"));
}

#[test]
fn test_rejects_bad_transponder_key() {
    let text = "eDVB services /4/\ntransponders\nzz:1:1\n\ts 1:1:0:0:0\n/\nend\n";
    assert!(parse_lamedb(text, "lamedb").is_err());
}

#[test]
fn test_control_characters_removed_from_names() {
    let text = "eDVB services /4/\nservices\n0001:00c00000:0421:0001:1:0\nNa\u{1}me \n/\nend\n";
    let db = parse_lamedb(text, "lamedb").unwrap();
    assert_eq!(db.services["00c00000:0421:0001:0001"].name, "Name");
}

#[test]
fn test_render_then_reparse_keeps_counts() {
    let db = parse_lamedb(LAMEDB4, "lamedb").unwrap();
    let profile = Profile {
        services: db.services.clone(),
        transponders: db.transponders.clone(),
        ..Profile::default()
    };
    let rendered = render_lamedb(&profile);
    assert!(rendered.starts_with("eDVB services /4/\ntransponders\n"));
    assert!(rendered.contains("\ts 11493750:22000000:0:4:192:2:0:1:2:0:0\n"));
    assert!(
        rendered.contains("283d:00c00000:03fb:0001:19:0\nZDF HD\np:ZDF\nc:000d05\nc:001702\n/\n")
    );
    assert!(rendered.ends_with("end\n"));

    let again = parse_lamedb(&rendered, "rendered").unwrap();
    assert_eq!(again.services.len(), db.services.len());
    assert_eq!(again.transponders.len(), db.transponders.len());
    assert_eq!(again.services["00c00000:03fb:0001:283d"].caids, vec![0x0d05, 0x1702]);
}

#[test]
fn test_system_and_modulation_survive_rewrite() {
    let text = "eDVB services /4/\ntransponders\n00c00000:0421:0001\n\
                \ts 11493750:22000000:0:4:192:2:0:1:2:0:0\n/\nend\n";
    let db = parse_lamedb(text, "lamedb").unwrap();
    let profile = Profile {
        transponders: db.transponders.clone(),
        ..Profile::default()
    };
    let again = parse_lamedb(&render_lamedb(&profile), "rendered").unwrap();
    let t = &again.transponders["00c00000:0421:0001"];
    assert_eq!(t.system.as_deref(), Some("1"));
    assert_eq!(t.modulation.as_deref(), Some("2"));
    assert_eq!(t.orbital_position, Some(19.2));
}
