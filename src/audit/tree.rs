//! Audit Tree
//!
//! A directory hierarchy over flat file records. Interior nodes map path
//! segments to children in insertion order; leaves hold the record whose
//! path leads to them. The tree is always rebuilt from store state and then
//! reduced by three passes:
//!
//! - **A**: drop any directory that directly contains a legal document named
//!   like a license whose findings are all allowed
//! - **B**: drop leaves that no longer need investigation
//! - **C**: drop directories left without leaves

use crate::audit::policy::Detective;
use crate::store::FileRecord;
use async_trait::async_trait;
use indexmap::IndexMap;
use log::warn;
use serde::Serialize;

pub type Children = IndexMap<String, AuditNode>;

/// Key under which a stale file record is kept when a directory of the same
/// path also exists
pub const SHADOWED_FILE_KEY: &str = ".";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AuditNode {
    Leaf(Box<FileRecord>),
    Interior(Children),
}

impl AuditNode {
    pub fn is_leaf(&self) -> bool {
        matches!(self, AuditNode::Leaf(_))
    }

    pub fn as_record(&self) -> Option<&FileRecord> {
        match self {
            AuditNode::Leaf(record) => Some(record),
            AuditNode::Interior(_) => None,
        }
    }

    pub fn children(&self) -> Option<&Children> {
        match self {
            AuditNode::Leaf(_) => None,
            AuditNode::Interior(children) => Some(children),
        }
    }
}

/// Async action run against every leaf by `AuditTree::apply_to_leaves`
#[async_trait(?Send)]
pub trait LeafVisitor {
    type Error;

    async fn visit(&self, leaf: &mut FileRecord) -> Result<(), Self::Error>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct AuditTree {
    root: Children,
}

impl AuditTree {
    /// Build from records. When a file and a directory claim the same slot,
    /// the directory takes it and the file moves inside under
    /// `SHADOWED_FILE_KEY`.
    pub fn build<I>(records: I) -> Self
    where
        I: IntoIterator<Item = FileRecord>,
    {
        let mut root = Children::new();
        for record in records {
            insert_record(&mut root, record);
        }
        Self { root }
    }

    pub fn root(&self) -> &Children {
        &self.root
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Look up a node by its `/`-separated path
    pub fn get(&self, path: &str) -> Option<&AuditNode> {
        let mut segments = path.split('/');
        let mut node = self.root.get(segments.next()?)?;
        for segment in segments {
            node = node.children()?.get(segment)?;
        }
        Some(node)
    }

    /// Pass A. Only directories are candidates, so leaves at the root stay.
    pub fn prune_accepted_license_levels(&mut self, detective: &Detective<'_>) {
        prune_levels(&mut self.root, detective);
    }

    /// Pass B. Directories are kept even when they end up empty.
    pub fn prune_allowed_files(&mut self, detective: &Detective<'_>) {
        prune_leaves(&mut self.root, detective);
    }

    /// Pass C
    pub fn prune_empty_nodes(&mut self) {
        prune_empty(&mut self.root);
    }

    /// Apply passes A, B and C in order
    pub fn pruned(mut self, detective: &Detective<'_>) -> Self {
        self.prune_accepted_license_levels(detective);
        self.prune_allowed_files(detective);
        self.prune_empty_nodes();
        self
    }

    pub fn count_leaves(&self) -> usize {
        count_leaves(&self.root)
    }

    /// Leaf paths in depth-first insertion order
    pub fn leaf_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_leaf_paths(&self.root, &mut paths);
        paths
    }

    /// Visit every leaf depth-first in insertion order, one at a time.
    /// Stops at the first visitor error.
    pub async fn apply_to_leaves<V: LeafVisitor>(&mut self, visitor: &V) -> Result<(), V::Error> {
        let mut leaves = Vec::new();
        collect_leaves_mut(&mut self.root, &mut leaves);
        for leaf in leaves {
            visitor.visit(leaf).await?;
        }
        Ok(())
    }

    /// Pretty JSON mirroring the directory hierarchy, newline-terminated
    pub fn to_json(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string_pretty(&self.root)?;
        json.push('\n');
        Ok(json)
    }
}

fn insert_record(root: &mut Children, record: FileRecord) {
    let segments: Vec<String> = record.path.split('/').map(str::to_string).collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };

    let mut level = root;
    for segment in parents {
        let slot = level
            .entry(segment.clone())
            .or_insert_with(|| AuditNode::Interior(Children::new()));
        if slot.is_leaf() {
            let shadowed = std::mem::replace(slot, AuditNode::Interior(Children::new()));
            warn_shadowed(&shadowed);
            if let AuditNode::Interior(children) = slot {
                children.insert(SHADOWED_FILE_KEY.to_string(), shadowed);
            }
        }
        let AuditNode::Interior(children) = slot else {
            return;
        };
        level = children;
    }

    match level.get_mut(last.as_str()) {
        Some(AuditNode::Interior(children)) => {
            let shadowed = AuditNode::Leaf(Box::new(record));
            warn_shadowed(&shadowed);
            children.insert(SHADOWED_FILE_KEY.to_string(), shadowed);
        }
        _ => {
            level.insert(last.clone(), AuditNode::Leaf(Box::new(record)));
        }
    }
}

fn warn_shadowed(node: &AuditNode) {
    if let Some(record) = node.as_record() {
        warn!(
            "{} is both a file and a directory in the database; listing the file as {}/{}",
            record.path, record.path, SHADOWED_FILE_KEY
        );
    }
}

fn has_cleared_license(children: &Children, detective: &Detective<'_>) -> bool {
    children
        .iter()
        .filter(|(key, _)| key.as_str() != SHADOWED_FILE_KEY)
        .filter_map(|(_, node)| node.as_record())
        .any(|record| {
            record.is_legal_document
                && record.file_name().to_lowercase().contains("license")
                && detective.all_licenses_accepted(&record.licenses)
        })
}

fn prune_levels(level: &mut Children, detective: &Detective<'_>) {
    level.retain(|_, node| match node {
        AuditNode::Leaf(_) => true,
        AuditNode::Interior(children) => {
            if has_cleared_license(children, detective) {
                false
            } else {
                prune_levels(children, detective);
                true
            }
        }
    });
}

fn prune_leaves(level: &mut Children, detective: &Detective<'_>) {
    level.retain(|_, node| match node {
        AuditNode::Leaf(record) => detective.needs_investigation(record),
        AuditNode::Interior(children) => {
            prune_leaves(children, detective);
            true
        }
    });
}

fn prune_empty(level: &mut Children) {
    level.retain(|_, node| match node {
        AuditNode::Leaf(_) => true,
        AuditNode::Interior(children) => {
            prune_empty(children);
            !children.is_empty()
        }
    });
}

fn count_leaves(level: &Children) -> usize {
    level
        .values()
        .map(|node| match node {
            AuditNode::Leaf(_) => 1,
            AuditNode::Interior(children) => count_leaves(children),
        })
        .sum()
}

fn collect_leaf_paths(level: &Children, out: &mut Vec<String>) {
    for node in level.values() {
        match node {
            AuditNode::Leaf(record) => out.push(record.path.clone()),
            AuditNode::Interior(children) => collect_leaf_paths(children, out),
        }
    }
}

fn collect_leaves_mut<'t>(level: &'t mut Children, out: &mut Vec<&'t mut FileRecord>) {
    for node in level.values_mut() {
        match node {
            AuditNode::Leaf(record) => out.push(record),
            AuditNode::Interior(children) => collect_leaves_mut(children, out),
        }
    }
}
