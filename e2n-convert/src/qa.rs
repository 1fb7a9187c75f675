//! QA report rendering (`qa_report.md` and `qa_report.json`).

use std::fs;
use std::path::{Path, PathBuf};

use e2n_core::Profile;
use serde::Serialize;

use crate::dedup::DedupRecord;
use crate::error::ConvertError;
use crate::validate::{ProfileStats, Thresholds};

const MD_LISTED: usize = 10;
const JSON_PREVIEW: usize = 20;

#[derive(Debug, Clone, Serialize)]
pub struct DedupSummary {
    pub count: usize,
    pub preview: Vec<DedupRecord>,
}

/// Machine-readable summary of one conversion run.
#[derive(Debug, Clone, Serialize)]
pub struct QaReport {
    pub profile_id: String,
    pub source_id: String,
    pub stats: ProfileStats,
    pub stale: String,
    pub last_seen: String,
    pub thresholds: Thresholds,
    pub deduplicated: DedupSummary,
    pub warnings: Vec<String>,
}

impl QaReport {
    pub fn new(
        profile: &Profile,
        stats: ProfileStats,
        thresholds: Thresholds,
        dedup: &[DedupRecord],
        warnings: &[String],
    ) -> Self {
        let meta = |key: &str, default: &str| profile.meta(key).unwrap_or(default).to_string();
        Self {
            profile_id: meta("profile_id", "unknown"),
            source_id: meta("source_id", "unknown"),
            stats,
            stale: meta("stale", "unknown"),
            last_seen: meta("last_seen", "n/a"),
            thresholds,
            deduplicated: DedupSummary {
                count: dedup.len(),
                preview: dedup.iter().take(JSON_PREVIEW).cloned().collect(),
            },
            warnings: warnings.to_vec(),
        }
    }

    pub fn to_markdown(&self, dedup: &[DedupRecord]) -> String {
        let s = &self.stats;
        let t = &self.thresholds;
        let mut lines = vec![
            format!("# QA Report – {}", self.profile_id),
            String::new(),
            format!("- Source ID: `{}`", self.source_id),
            format!("- Services total: {}", s.total_services),
            format!(
                "- Distribution: SAT={}, CABLE={}, TERRESTRIAL={}, RADIO={}",
                s.sat_services, s.cable_services, s.terrestrial_services, s.radio_services
            ),
            format!("- Bouquets: {}", s.bouquet_count),
            format!("- Last seen: {}", self.last_seen),
            format!("- Stale: {}", self.stale),
            format!(
                "- Thresholds: SAT≥{}, CABLE≥{}, TERRESTRIAL≥{}",
                t.sat, t.cable, t.terrestrial
            ),
            String::new(),
        ];

        if dedup.is_empty() {
            lines.push("## Duplicates Removed".into());
            lines.push("- None".into());
        } else {
            lines.push(format!("## Duplicates Removed ({})", dedup.len()));
            for record in dedup.iter().take(MD_LISTED) {
                lines.push(format!(
                    "- `{}` → kept `{}`, dropped `{}`",
                    record.identity, record.kept, record.dropped
                ));
            }
            if dedup.len() > MD_LISTED {
                lines.push(format!("- … and {} more", dedup.len() - MD_LISTED));
            }
        }
        lines.push(String::new());

        lines.push("## Warnings".into());
        if self.warnings.is_empty() {
            lines.push("- None".into());
        } else {
            lines.extend(self.warnings.iter().map(|w| format!("- {w}")));
        }

        let mut text = lines.join("\n").trim().to_string();
        text.push('\n');
        text
    }
}

/// Write both report files into `dir`; returns their paths.
pub fn write_qa_reports(
    dir: &Path,
    report: &QaReport,
    dedup: &[DedupRecord],
) -> Result<(PathBuf, PathBuf), ConvertError> {
    let md = dir.join("qa_report.md");
    let json = dir.join("qa_report.json");
    fs::write(&md, report.to_markdown(dedup))?;
    fs::write(&json, serde_json::to_string_pretty(report)?)?;
    log::debug!("wrote {} and {}", md.display(), json.display());
    Ok((md, json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn record(n: usize) -> DedupRecord {
        DedupRecord {
            identity: format!("id{n:02}"),
            kept: "Das Erste HD".into(),
            dropped: "Erste".into(),
            kept_key: "k".into(),
            dropped_key: "k".into(),
        }
    }

    fn report(dedup: &[DedupRecord], warnings: &[String]) -> QaReport {
        let mut profile = Profile::new();
        profile.set_meta("profile_id", "astra");
        profile.set_meta("stale", "false");
        let thresholds = Thresholds {
            sat: 50,
            cable: 20,
            terrestrial: 20,
        };
        QaReport::new(&profile, ProfileStats::default(), thresholds, dedup, warnings)
    }

    #[test]
    fn test_markdown_sections() {
        let md = report(&[], &[]).to_markdown(&[]);
        assert!(md.starts_with("# QA Report – astra\n"));
        assert!(md.contains("- Source ID: `unknown`"));
        assert!(md.contains("- Thresholds: SAT≥50, CABLE≥20, TERRESTRIAL≥20"));
        assert!(md.contains("## Duplicates Removed\n- None"));
        assert!(md.ends_with("## Warnings\n- None\n"));
    }

    #[test]
    fn test_markdown_truncates_duplicates() {
        let dedup: Vec<DedupRecord> = (0..12).map(record).collect();
        let warnings = vec!["profile contains no transponders".to_string()];
        let md = report(&dedup, &warnings).to_markdown(&dedup);
        assert!(md.contains("## Duplicates Removed (12)"));
        assert!(md.contains("- `id00` → kept `Das Erste HD`, dropped `Erste`"));
        assert!(!md.contains("id10"));
        assert!(md.contains("- … and 2 more"));
        assert!(md.contains("- profile contains no transponders"));
    }

    #[test]
    fn test_json_report() {
        let tmp = TempDir::new().unwrap();
        let dedup = vec![record(1)];
        let (_, json) = write_qa_reports(tmp.path(), &report(&dedup, &[]), &dedup).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(json).unwrap()).unwrap();
        assert_eq!(value["profile_id"], "astra");
        assert_eq!(value["stale"], "false");
        assert_eq!(value["deduplicated"]["count"], 1);
        assert_eq!(value["thresholds"]["sat"], 50);
        assert_eq!(value["stats"]["total_services"], 0);
    }
}
