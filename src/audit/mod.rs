//! License Audit Engine
//!
//! Everything that runs after ingestion: the license policy, the audit tree
//! with its pruning passes, bulk acceptance, and the reports built on top of
//! stored records.

pub mod acceptance;
pub mod auditor;
pub mod error;
pub mod policy;
pub mod report;
pub mod tree;

pub use acceptance::{accept, unaccept};
pub use auditor::{AuditOptions, Auditor};
pub use error::{AuditError, AuditResult};
pub use policy::Detective;
pub use tree::{AuditNode, AuditTree};
