//! Folder and display names per delivery group.

use e2n_catalog::NameMap;
use e2n_core::{Service, Transponder, slugify};

use crate::options::NameScheme;

/// Well-known orbital positions (tenths of a degree east).
const DEFAULT_SAT_NAMES: &[(i64, &str)] = &[
    (192, "Astra-19.2E"),
    (130, "Hotbird-13.0E"),
    (235, "Astra-23.5E"),
    (282, "Astra-28.2E"),
    (90, "Eutelsat-9.0E"),
    (160, "Eutelsat-16.0E"),
    (420, "Turksat-42.0E"),
];

/// A resolved `(code, folder)` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupName {
    /// `S19.2E`, `kabel-deutschland`, ...
    pub code: String,
    /// Display name with spaces replaced by dashes; also the folder name.
    pub folder: String,
}

/// Resolves display/folder names for satellite, cable and terrestrial groups.
#[derive(Debug, Clone, Default)]
pub struct NameResolver {
    scheme: NameScheme,
    name_map: NameMap,
}

impl NameResolver {
    pub fn new(scheme: NameScheme, name_map: NameMap) -> Self {
        Self { scheme, name_map }
    }

    /// Satellite groups are keyed by orbital position.
    pub fn satellite(&self, transponder: &Transponder) -> GroupName {
        let position = transponder.orbital_position.unwrap_or(0.0);
        let code = satellite_code(position);
        let tenths = (position * 10.0).round() as i64;
        let human = DEFAULT_SAT_NAMES
            .iter()
            .find(|(p, _)| *p == tenths)
            .map(|(_, name)| name.to_string())
            .unwrap_or_else(|| code.replace('S', "Sat-"));
        let mapped = self
            .lookup("sat", &code)
            .or_else(|| self.lookup("sat", &human))
            .map(str::to_string)
            .unwrap_or(human);
        let display = match self.scheme {
            NameScheme::Human => mapped,
            NameScheme::Code => code.clone(),
        };
        GroupName {
            folder: display.replace(' ', "-"),
            code,
        }
    }

    pub fn cable(&self, hint: &str) -> GroupName {
        self.hinted("cable", hint, "cable-generic", "Cable")
    }

    pub fn terrestrial(&self, hint: &str) -> GroupName {
        self.hinted("terrestrial", hint, "terrestrial-generic", "Terrestrial")
    }

    fn hinted(
        &self,
        category: &str,
        hint: &str,
        generic_code: &str,
        generic_name: &str,
    ) -> GroupName {
        let code = if hint.is_empty() {
            generic_code.to_string()
        } else {
            slugify(hint, '-')
        };
        let display = match self.scheme {
            NameScheme::Human => self
                .lookup(category, &code)
                .or_else(|| self.lookup(category, hint))
                .map(str::to_string)
                .unwrap_or_else(|| if hint.is_empty() { generic_name } else { hint }.to_string()),
            NameScheme::Code => code.to_uppercase(),
        };
        GroupName {
            folder: display.replace(' ', "-"),
            code,
        }
    }

    fn lookup(&self, category: &str, key: &str) -> Option<&str> {
        self.name_map.lookup(category, key)
    }
}

/// `S19.2E`; whole positions drop the `.0` (`S13E`), west is negative.
pub fn satellite_code(position: f64) -> String {
    let hemisphere = if position >= 0.0 { 'E' } else { 'W' };
    format!("S{:.1}{hemisphere}", position.abs()).replace(".0", "")
}

/// Group hint for cable and terrestrial groups: the most frequent provider,
/// ties broken by the lexicographically smallest name. Providerless groups
/// fall back to the namespace of the first service.
pub fn derive_hint(services: &[&Service]) -> String {
    let mut counts: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
    let providers = services
        .iter()
        .filter_map(|s| s.provider.as_deref())
        .filter(|p| !p.is_empty());
    for provider in providers {
        *counts.entry(provider).or_default() += 1;
    }
    // BTreeMap iterates in name order, so the first maximum is the smallest name.
    let best = counts
        .iter()
        .fold(None::<(&str, usize)>, |best, (&name, &count)| match best {
            Some((_, c)) if c >= count => best,
            _ => Some((name, count)),
        });
    match (best, services.first()) {
        (Some((name, _)), _) => name.to_string(),
        (None, Some(first)) => format!("ns-{:08x}", first.namespace),
        (None, None) => "unknown".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use e2n_core::Delivery;

    fn sat_at(position: f64) -> Transponder {
        let mut t = Transponder::with_ids(Delivery::Sat, 11_494_000, 0x00c0_0000, 1, 1);
        t.orbital_position = Some(position);
        t
    }

    #[test]
    fn test_satellite_codes() {
        assert_eq!(satellite_code(19.2), "S19.2E");
        assert_eq!(satellite_code(13.0), "S13E");
        assert_eq!(satellite_code(-30.0), "S30W");
        assert_eq!(satellite_code(0.8), "S0.8E");
    }

    #[test]
    fn test_satellite_names() {
        let resolver = NameResolver::default();
        let astra = resolver.satellite(&sat_at(19.2));
        assert_eq!(astra.code, "S19.2E");
        assert_eq!(astra.folder, "Astra-19.2E");
        assert_eq!(resolver.satellite(&sat_at(4.8)).folder, "Sat-4.8E");

        let code = NameResolver::new(NameScheme::Code, NameMap::default());
        assert_eq!(code.satellite(&sat_at(13.0)).folder, "S13E");

        let mut map = NameMap::default();
        map.insert("sat", "S19.2E", "Astra 1KR");
        let mapped = NameResolver::new(NameScheme::Human, map);
        assert_eq!(mapped.satellite(&sat_at(19.2)).folder, "Astra-1KR");
    }

    #[test]
    fn test_cable_and_terrestrial_names() {
        let resolver = NameResolver::default();
        let cable = resolver.cable("Kabel Deutschland");
        assert_eq!(cable.code, "kabel-deutschland");
        assert_eq!(cable.folder, "Kabel-Deutschland");
        assert_eq!(resolver.terrestrial("").folder, "Terrestrial");
        assert_eq!(resolver.terrestrial("").code, "terrestrial-generic");

        let code = NameResolver::new(NameScheme::Code, NameMap::default());
        assert_eq!(code.cable("Kabel Deutschland").folder, "KABEL-DEUTSCHLAND");

        let mut map = NameMap::default();
        map.insert("cable", "kabel-deutschland", "Vodafone Kabel");
        let mapped = NameResolver::new(NameScheme::Human, map);
        assert_eq!(mapped.cable("Kabel Deutschland").folder, "Vodafone-Kabel");
    }

    #[test]
    fn test_derive_hint() {
        let t = Transponder::with_ids(Delivery::Cable, 1, 0xffff_0000, 1, 1);
        let mut a = Service::new(&t, 1, 1, "A");
        a.provider = Some("Zeta".into());
        let mut b = Service::new(&t, 2, 1, "B");
        b.provider = Some("Alpha".into());
        let c = Service::new(&t, 3, 1, "C");

        assert_eq!(derive_hint(&[&a, &b, &c]), "Alpha");
        let mut d = Service::new(&t, 4, 1, "D");
        d.provider = Some("Zeta".into());
        assert_eq!(derive_hint(&[&a, &b, &d]), "Zeta");
        assert_eq!(derive_hint(&[&c]), "ns-ffff0000");
        assert_eq!(derive_hint(&[]), "unknown");
    }
}
