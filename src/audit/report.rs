//! Reports over accepted and attributable files

use crate::audit::tree::AuditTree;
use crate::core::styles::StyleRole;
use crate::store::models::parent_dir_of;
use crate::store::FileRecord;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::collections::BTreeSet;
use std::fmt;

pub const CSV_HEADER: &str = "file_path|reason";

/// Width of the rules framing `view` output
pub const VIEW_RULE_WIDTH: usize = 72;

/// Accepted files that share one acceptance timestamp, i.e. one `accept` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptedGroup {
    /// Member with the shortest parent directory
    pub topmost_path: String,
    pub count: usize,
    pub reason: String,
}

impl AcceptedGroup {
    pub fn to_row(&self) -> String {
        if self.count == 1 {
            format!("{}|{}", self.topmost_path, self.reason)
        } else {
            format!(
                "{}/{{{} files}}|{}",
                parent_dir_of(&self.topmost_path),
                self.count,
                self.reason
            )
        }
    }
}

/// Group accepted records by acceptance timestamp, sorted by topmost path.
/// Records without an acceptance are ignored.
pub fn group_accepted(records: &[FileRecord]) -> Vec<AcceptedGroup> {
    let mut groups: IndexMap<DateTime<Utc>, AcceptedGroup> = IndexMap::new();
    for record in records {
        let Some(acceptance) = &record.acceptance else {
            continue;
        };
        let group = groups
            .entry(acceptance.accepted_at)
            .or_insert_with(|| AcceptedGroup {
                topmost_path: record.path.clone(),
                count: 0,
                reason: acceptance.reason.clone(),
            });
        group.count += 1;
        if record.parent_dir().len() < parent_dir_of(&group.topmost_path).len() {
            group.topmost_path = record.path.clone();
        }
    }

    let mut groups: Vec<_> = groups.into_values().collect();
    groups.sort_by(|a, b| a.topmost_path.cmp(&b.topmost_path));
    groups
}

/// Pipe-delimited accepted-files report, header first, newline-terminated
pub fn accepted_csv(records: &[FileRecord]) -> String {
    let mut out = String::from(CSV_HEADER);
    out.push('\n');
    for group in group_accepted(records) {
        out.push_str(&group.to_row());
        out.push('\n');
    }
    out
}

/// Accepted records as an unpruned tree
pub fn accepted_tree(records: Vec<FileRecord>) -> AuditTree {
    AuditTree::build(records)
}

/// Package names whose license files mention attribution-requiring licenses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attributions {
    pub node: BTreeSet<String>,
    pub ruby: BTreeSet<String>,
}

impl fmt::Display for Attributions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |names: &BTreeSet<String>| names.iter().cloned().collect::<Vec<_>>().join(", ");
        writeln!(f, "Node: [{}]", join(&self.node))?;
        writeln!(f, "Ruby: [{}]", join(&self.ruby))
    }
}

fn mentions(record: &FileRecord, needle: &str) -> bool {
    record.licenses.iter().any(|finding| {
        finding.name.to_lowercase().contains(needle)
            || finding
                .category
                .as_ref()
                .is_some_and(|category| category.to_lowercase().contains(needle))
    })
}

fn needs_attribution(record: &FileRecord) -> bool {
    (record.path.to_lowercase().contains("license") || record.is_legal_document)
        && mentions(record, "creative commons")
        && !mentions(record, "cc0 1.0")
}

/// Package directly under the innermost `node_modules`, scope included
fn npm_package(path: &str) -> Option<String> {
    let (_, inner) = path.rsplit_once("/node_modules/")?;
    let mut segments = inner.split('/');
    let first = segments.next().filter(|s| !s.is_empty())?;
    match (first.starts_with('@'), segments.next()) {
        (true, Some(name)) => Some(format!("{}/{}", first, name)),
        _ => Some(first.to_string()),
    }
}

/// `<...>/_gems/<ruby version>/<gem>/...` yields `<gem>`
fn ruby_gem(path: &str) -> Option<String> {
    let after = path.split("/_gems/").nth(1)?;
    after
        .split('/')
        .nth(1)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn attributions(records: &[FileRecord]) -> Attributions {
    let mut found = Attributions::default();
    for record in records.iter().filter(|r| needs_attribution(r)) {
        if record.path.contains("/node_modules/") {
            found.node.extend(npm_package(&record.path));
        } else if record.path.contains("/_gems/") {
            found.ruby.extend(ruby_gem(&record.path));
        }
    }
    found
}

/// Why `view` has nothing to show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewProblem {
    NoSuchFile(String),
    NoLicenseInfo,
    Empty,
}

impl fmt::Display for ViewProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViewProblem::NoSuchFile(path) => write!(f, "Found no such file: {}", path),
            ViewProblem::NoLicenseInfo => write!(
                f,
                "File has no license info, therefore its content has not been saved."
            ),
            ViewProblem::Empty => write!(f, "This file seems to be empty! Strange."),
        }
    }
}

/// Retained content of `record`, or the reason there is none
pub fn view_content<'r>(
    path: &str,
    record: Option<&'r FileRecord>,
) -> Result<&'r str, ViewProblem> {
    let record = record.ok_or_else(|| ViewProblem::NoSuchFile(path.to_string()))?;
    match record.content_text.as_deref() {
        Some(text) if !text.is_empty() => Ok(text.trim()),
        _ if !record.has_findings() => Err(ViewProblem::NoLicenseInfo),
        _ => Err(ViewProblem::Empty),
    }
}

/// Content between a `>` rule and a `<` rule, blank lines around it
pub fn frame_content(content: &str, color: bool) -> String {
    format!(
        "{}\n\n{}\n\n{}\n",
        StyleRole::Rule.paint(&">".repeat(VIEW_RULE_WIDTH), color),
        content,
        StyleRole::Rule.paint(&"<".repeat(VIEW_RULE_WIDTH), color)
    )
}
