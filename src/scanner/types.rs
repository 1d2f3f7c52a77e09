//! Scanner Report Types
//!
//! The subset of the external scanner's JSON report the pipeline reads, plus
//! the summaries each stage hands back to the pipeline.

use crate::store::LicenseFinding;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Top-level report document; unknown keys (headers, summaries) are ignored
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanReport {
    #[serde(default)]
    pub files: Vec<ReportEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Directory,
    #[serde(other)]
    Other,
}

/// One path in the report
#[derive(Debug, Clone, Deserialize)]
pub struct ReportEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub sha256: Option<String>,
    #[serde(default)]
    pub license_detections: Vec<LicenseDetection>,
    /// Older report layout: one entry per matched license
    #[serde(default)]
    pub licenses: Vec<ReportLicense>,
    #[serde(default)]
    pub is_legal: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LicenseDetection {
    #[serde(default)]
    pub matches: Vec<DetectionMatch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectionMatch {
    pub license_expression: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportLicense {
    pub key: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub matched_text: Option<String>,
}

impl ReportEntry {
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Distinct findings across every detection match and license entry,
    /// ordered by identifier. A category reported for any occurrence of an
    /// identifier is kept.
    pub fn findings(&self) -> Vec<LicenseFinding> {
        let mut by_name: BTreeMap<&str, Option<&str>> = BTreeMap::new();

        let matched = self
            .license_detections
            .iter()
            .flat_map(|detection| detection.matches.iter());
        for detection_match in matched {
            by_name
                .entry(detection_match.license_expression.as_str())
                .or_insert(None);
        }

        for license in &self.licenses {
            let category = by_name.entry(license.key.as_str()).or_insert(None);
            if category.is_none() {
                *category = license.category.as_deref();
            }
        }

        by_name
            .into_iter()
            .map(|(name, category)| LicenseFinding {
                name: name.to_string(),
                category: category.map(str::to_string),
            })
            .collect()
    }
}

/// Stage 1 outcome for one changed file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirtyFile {
    pub path: String,
    pub content_sha256: String,
}

/// Stage 1 result
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Regular files matched by the glob
    pub matched: usize,
    /// Changed or new files, ordered by path
    pub dirty: Vec<DirtyFile>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty()
    }
}

/// Stage 4 result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub saved: usize,
    pub inserted: usize,
    pub updated: usize,
    pub with_findings: usize,
}

/// What a full `scan` run did
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    pub changes: ChangeSet,
    pub ingest: IngestSummary,
    /// Best-effort stage failures, reported after the run
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(json: &str) -> ReportEntry {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_findings_deduplicate_and_sort() {
        let entry = entry(
            r#"{
                "path": "a/LICENSE",
                "type": "file",
                "license_detections": [
                    {"matches": [{"license_expression": "mit"}, {"license_expression": "apache-2.0"}]},
                    {"matches": [{"license_expression": "mit"}]}
                ]
            }"#,
        );
        let names: Vec<_> = entry.findings().into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["apache-2.0", "mit"]);
    }

    #[test]
    fn test_findings_merge_legacy_license_layout() {
        let entry = entry(
            r#"{
                "path": "a/COPYING",
                "type": "file",
                "license_detections": [{"matches": [{"license_expression": "gpl-2.0"}]}],
                "licenses": [
                    {"key": "gpl-2.0", "category": "Copyleft"},
                    {"key": "cc-by-4.0", "category": "Permissive", "matched_text": "Creative Commons"}
                ]
            }"#,
        );
        assert_eq!(
            entry.findings(),
            vec![
                LicenseFinding::with_category("cc-by-4.0", "Permissive"),
                LicenseFinding::with_category("gpl-2.0", "Copyleft"),
            ]
        );
    }

    #[test]
    fn test_entry_kinds() {
        assert!(entry(r#"{"path": "a", "type": "file"}"#).is_file());
        assert!(!entry(r#"{"path": "a", "type": "directory"}"#).is_file());
        assert_eq!(
            entry(r#"{"path": "a", "type": "symlink"}"#).kind,
            EntryKind::Other
        );
    }

    #[test]
    fn test_report_ignores_unknown_keys() {
        let report: ScanReport = serde_json::from_str(
            r#"{"headers": [{"tool_name": "scancode"}], "files": [{"path": "x", "type": "file", "sha256": null}]}"#,
        )
        .unwrap();
        assert_eq!(report.files.len(), 1);
        assert!(report.files[0].findings().is_empty());
        assert_eq!(report.files[0].sha256, None);
    }
}
