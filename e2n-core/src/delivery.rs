use serde::{Deserialize, Serialize};

/// Delivery medium of a transponder.
///
/// Centralizes the per-medium spellings used by the different file formats
/// (native lamedb letter, zapit container tags, output folder names).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Delivery {
    Sat,
    Cable,
    Terrestrial,
}

/// All delivery variants in output order.
const ALL_DELIVERIES: &[Delivery] = &[Delivery::Sat, Delivery::Cable, Delivery::Terrestrial];

impl Delivery {
    /// Canonical lowercase name, also used as the output category folder.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sat => "sat",
            Self::Cable => "cable",
            Self::Terrestrial => "terrestrial",
        }
    }

    /// Single-letter selector used by `--include-types` (S, C, T).
    pub fn type_letter(&self) -> char {
        match self {
            Self::Sat => 'S',
            Self::Cable => 'C',
            Self::Terrestrial => 'T',
        }
    }

    /// Prefix character of a lamedb transponder data line.
    pub fn lamedb_char(&self) -> char {
        match self {
            Self::Sat => 's',
            Self::Cable => 'c',
            Self::Terrestrial => 't',
        }
    }

    pub fn from_lamedb_char(c: char) -> Option<Self> {
        match c {
            's' => Some(Self::Sat),
            'c' => Some(Self::Cable),
            't' => Some(Self::Terrestrial),
            _ => None,
        }
    }

    /// Container element in `services.xml` (`<satellites>`, ...).
    pub fn container_tag(&self) -> &'static str {
        match self {
            Self::Sat => "satellites",
            Self::Cable => "cables",
            Self::Terrestrial => "terrestrials",
        }
    }

    /// Group element nested in the container (`<satellite>`, ...).
    pub fn group_tag(&self) -> &'static str {
        match self {
            Self::Sat => "satellite",
            Self::Cable => "cable",
            Self::Terrestrial => "terrestrial",
        }
    }

    pub fn from_container_tag(tag: &str) -> Option<Self> {
        match tag {
            "satellites" => Some(Self::Sat),
            "cables" => Some(Self::Cable),
            "terrestrials" => Some(Self::Terrestrial),
            _ => None,
        }
    }

    pub fn all() -> &'static [Delivery] {
        ALL_DELIVERIES
    }
}

impl std::fmt::Display for Delivery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string cannot be parsed into a `Delivery`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryParseError(pub String);

impl std::fmt::Display for DeliveryParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown delivery type: '{}'", self.0)
    }
}

impl std::error::Error for DeliveryParseError {}

impl std::str::FromStr for Delivery {
    type Err = DeliveryParseError;

    /// Accepts the canonical names, the S/C/T letters, and common long forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "s" | "sat" | "satellite" | "dvb-s" | "dvb-s2" => Ok(Self::Sat),
            "c" | "cable" | "dvb-c" | "dvb-c2" => Ok(Self::Cable),
            "t" | "terr" | "terrestrial" | "dvb-t" | "dvb-t2" => Ok(Self::Terrestrial),
            _ => Err(DeliveryParseError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_letters_and_names() {
        assert_eq!("S".parse::<Delivery>().unwrap(), Delivery::Sat);
        assert_eq!("cable".parse::<Delivery>().unwrap(), Delivery::Cable);
        assert_eq!("DVB-T2".parse::<Delivery>().unwrap(), Delivery::Terrestrial);
        assert!("radio".parse::<Delivery>().is_err());
    }

    #[test]
    fn test_container_tags_roundtrip() {
        for d in Delivery::all() {
            assert_eq!(Delivery::from_container_tag(d.container_tag()), Some(*d));
            assert_eq!(Delivery::from_lamedb_char(d.lamedb_char()), Some(*d));
        }
    }
}
