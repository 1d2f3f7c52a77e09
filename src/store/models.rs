//! Store Data Model
//!
//! Records persisted by the store: one `FileRecord` per observed path and the
//! `LicensePolicy` allow-lists consulted during audits.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;

/// SHA-256 of zero bytes, used when the scanner report omits a digest
pub const SHA256_EMPTY_CONTENT: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// A license detected for a file, optionally tagged with its category
///
/// Findings order and compare by identifier first, so a sorted list of
/// findings is sorted by identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LicenseFinding {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl LicenseFinding {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: None,
        }
    }

    pub fn with_category(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: Some(category.into()),
        }
    }
}

// Older databases stored findings as bare identifier strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredFinding {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        category: Option<String>,
    },
}

impl<'de> Deserialize<'de> for LicenseFinding {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match StoredFinding::deserialize(deserializer)? {
            StoredFinding::Name(name) => LicenseFinding::new(name),
            StoredFinding::Full { name, category } => LicenseFinding { name, category },
        })
    }
}

/// An active human decision overriding investigation of a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acceptance {
    #[serde(rename = "currentAcceptedReason")]
    pub reason: String,
    #[serde(rename = "currentAcceptedAt")]
    pub accepted_at: DateTime<Utc>,
}

impl Acceptance {
    /// Build an acceptance, trimming surrounding whitespace from the reason
    pub fn new(reason: &str, accepted_at: DateTime<Utc>) -> Self {
        Self {
            reason: reason.trim().to_string(),
            accepted_at,
        }
    }
}

/// One analysed file, keyed by its path relative to the scan root
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_sha256: Option<String>,
    /// Full text, kept only for files with license findings
    #[serde(skip_serializing)]
    pub content_text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub licenses: Vec<LicenseFinding>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_legal_document: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_accepted_reason: Option<String>,
    #[serde(flatten)]
    pub acceptance: Option<Acceptance>,
    /// Detailed scanner entry attached by a verbose audit; never persisted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detailed_report: Option<serde_json::Value>,
}

impl FileRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_licenses<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.licenses = names.into_iter().map(LicenseFinding::new).collect();
        self
    }

    pub fn has_findings(&self) -> bool {
        !self.licenses.is_empty()
    }

    pub fn is_accepted(&self) -> bool {
        self.acceptance.is_some()
    }

    /// Final path segment
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Parent directory, `.` for top-level paths
    pub fn parent_dir(&self) -> &str {
        parent_dir_of(&self.path)
    }
}

/// Parent directory of a `/`-separated relative path, `.` at the top level
pub fn parent_dir_of(path: &str) -> &str {
    match path.rsplit_once('/') {
        Some((parent, _)) if !parent.is_empty() => parent,
        Some(_) => "/",
        None => ".",
    }
}

/// Which allow-list a policy entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum PolicyKind {
    #[strum(serialize = "specific license")]
    Specific,
    #[strum(serialize = "license category")]
    Category,
}

impl PolicyKind {
    pub(crate) fn table(self) -> &'static str {
        match self {
            PolicyKind::Specific => "allowed_licenses",
            PolicyKind::Category => "allowed_license_categories",
        }
    }
}

/// Globally allowed license identifiers and categories
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LicensePolicy {
    pub specific: BTreeSet<String>,
    pub categories: BTreeSet<String>,
}

impl LicensePolicy {
    pub fn new<I, J, S, T>(specific: I, categories: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            specific: specific.into_iter().map(Into::into).collect(),
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allowing<I, S>(specific: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(specific, Vec::<String>::new())
    }

    pub fn is_empty(&self) -> bool {
        self.specific.is_empty() && self.categories.is_empty()
    }
}
