//! Bulk accept and unaccept
//!
//! A target containing `%` is a wildcard over stored paths; anything else must
//! name a stored path exactly. Only records with findings can carry an
//! acceptance.

use crate::audit::error::{AuditError, AuditResult};
use crate::audit::policy::Detective;
use crate::core::pattern_parser::PathPattern;
use crate::store::{Acceptance, FileStore, LicensePolicy};
use chrono::{DateTime, Utc};
use log::{debug, info};

/// Paths whose acceptance changed
pub type Touched = Vec<String>;

fn parse_pattern(pattern: &str) -> AuditResult<PathPattern> {
    PathPattern::parse(pattern).map_err(|message| AuditError::Pattern { message })
}

/// Accept files matching `pattern` with `reason`, all stamped `accepted_at`.
///
/// Wildcards only touch files that still need investigation under `policy`.
/// An exact path with no record with findings is `AuditError::NoSuchFile`.
pub fn accept<S: FileStore>(
    store: &S,
    policy: &LicensePolicy,
    pattern: &str,
    reason: &str,
    accepted_at: DateTime<Utc>,
) -> AuditResult<Touched> {
    let acceptance = Acceptance::new(reason, accepted_at);

    match parse_pattern(pattern)? {
        PathPattern::Exact(path) => {
            if !store.set_acceptance(&path, Some(&acceptance))? {
                return Err(AuditError::NoSuchFile { path });
            }
            info!("Accepted: {}", path);
            Ok(vec![path])
        }
        wildcard => {
            info!("Accepting suspicious files (using wildcard) ...");
            let detective = Detective::new(policy);
            let mut touched = Touched::new();
            for record in store.records_with_findings()? {
                if wildcard.matches(&record.path) && detective.needs_investigation(&record) {
                    store.set_acceptance(&record.path, Some(&acceptance))?;
                    debug!("{}", record.path);
                    touched.push(record.path);
                }
            }
            info!("  done (accepted {}).", touched.len());
            Ok(touched)
        }
    }
}

/// Clear the acceptance of files matching `pattern`.
///
/// Wildcards only touch files with findings and an active acceptance.
pub fn unaccept<S: FileStore>(store: &S, pattern: &str) -> AuditResult<Touched> {
    match parse_pattern(pattern)? {
        PathPattern::Exact(path) => {
            if !store.set_acceptance(&path, None)? {
                return Err(AuditError::NoSuchFile { path });
            }
            info!("Unaccepted: {}", path);
            Ok(vec![path])
        }
        wildcard => {
            info!("Unaccepting files (using wildcard) ...");
            let mut touched = Touched::new();
            for record in store.records_with_findings()? {
                if wildcard.matches(&record.path) && record.is_accepted() {
                    store.set_acceptance(&record.path, None)?;
                    debug!("{}", record.path);
                    touched.push(record.path);
                }
            }
            info!("  done (unaccepted {}).", touched.len());
            Ok(touched)
        }
    }
}
