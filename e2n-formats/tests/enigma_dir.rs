use e2n_core::BouquetCategory;
use e2n_formats::{load_profile, write_profile};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const LAMEDB: &str = "eDVB services /4/
transponders
00c00000:0421:0001
\ts 11493750:22000000:0:4:192:2:0
/
end
services
6dca:00c00000:0421:0001:1:0
Das Erste HD
p:ARD
/
283d:00c00000:0421:0001:1:0
ZDF HD
p:ZDF
/
2b66:00c00000:0421:0001:2:0
Bayern 1
p:ARD
/
end
";

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn fixture(dir: &Path) {
    write(dir, "lamedb", LAMEDB);
    write(
        dir,
        "bouquets.tv",
        "#NAME User - Bouquets (TV)\n\
         #SERVICE 1:7:1:0:0:0:0:0:0:0:FROM BOUQUET \"userbouquet.favourites.tv\" ORDER BY bouquet\n\
         #SERVICE 1:7:1:0:0:0:0:0:0:0:FROM BOUQUET \"userbouquet.missing.tv\" ORDER BY bouquet\n",
    );
    write(
        dir,
        "userbouquet.favourites.tv",
        "#NAME Favourites\n\
         #SERVICE 1:0:1:6dca:421:1:C00000:0:0:0:\n\
         #SERVICE 1:0:1:283d:0421:0001:00c00000:0:0:0:\n",
    );
    write(
        dir,
        "userbouquet.radio.radio",
        "#NAME Radio\n#SERVICE 1:0:2:2b66:0421:0001:00c00000:0:0:0:\n",
    );
}

#[test]
fn load_native_profile_directory() {
    let tmp = TempDir::new().unwrap();
    fixture(tmp.path());

    let profile = load_profile(tmp.path()).unwrap();
    assert_eq!(profile.services.len(), 3);
    assert_eq!(profile.transponders.len(), 1);
    assert_eq!(profile.bouquets.len(), 2);
    assert_eq!(profile.meta("lamedb_version"), Some("4"));
    assert_eq!(profile.meta("service_count"), Some("3"));

    let favourites = &profile.bouquets[0];
    assert_eq!(favourites.name, "Favourites");
    // Unpadded receiver references resolve to the padded service key.
    assert!(profile.services.contains_key(&favourites.entries[0].service_key()));

    let radio = &profile.bouquets[1];
    assert_eq!(radio.category, BouquetCategory::Radio);
}

#[test]
fn lamedb5_is_preferred() {
    let tmp = TempDir::new().unwrap();
    fixture(tmp.path());
    write(
        tmp.path(),
        "lamedb5",
        "eDVB services /5/\n\
         t:00c00000:0421:0001,s:11493750:22000000:0:4:192:2:0\n\
         s:6dca:00c00000:0421:0001:1:0,\"Das Erste HD\",p:ARD\n",
    );
    let profile = load_profile(tmp.path()).unwrap();
    assert_eq!(profile.meta("lamedb_version"), Some("5"));
    assert_eq!(profile.services.len(), 1);
}

#[test]
fn missing_lamedb_is_an_error() {
    let tmp = TempDir::new().unwrap();
    let err = load_profile(tmp.path()).unwrap_err();
    assert!(err.to_string().contains("lamedb/lamedb5 missing"));
}

#[test]
fn write_then_reload_keeps_counts() {
    let src = TempDir::new().unwrap();
    fixture(src.path());
    let profile = load_profile(src.path()).unwrap();

    let out = TempDir::new().unwrap();
    write_profile(&profile, out.path()).unwrap();
    assert!(out.path().join("bouquets.tv").is_file());
    assert!(out.path().join("bouquets.radio").is_file());
    assert!(out.path().join("userbouquet.favourites.tv").is_file());

    let reloaded = load_profile(out.path()).unwrap();
    assert_eq!(reloaded.services.len(), profile.services.len());
    assert_eq!(reloaded.transponders.len(), profile.transponders.len());
    assert_eq!(reloaded.bouquets.len(), profile.bouquets.len());
}
