//! License acceptance decisions
//!
//! `Detective` answers one question for the audit: does this file still need
//! a human to look at it, given the global allow-lists?

use crate::store::{FileRecord, LicenseFinding, LicensePolicy};

#[derive(Debug, Clone, Copy)]
pub struct Detective<'p> {
    policy: &'p LicensePolicy,
}

impl<'p> Detective<'p> {
    pub fn new(policy: &'p LicensePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &LicensePolicy {
        self.policy
    }

    /// False when the file carries an active acceptance or every finding is
    /// allowed. A file with no findings never needs investigation.
    pub fn needs_investigation(&self, file: &FileRecord) -> bool {
        if file.is_accepted() {
            return false;
        }
        !self.all_licenses_accepted(&file.licenses)
    }

    /// Allowed by identifier, or by category
    pub fn is_accepted(&self, finding: &LicenseFinding) -> bool {
        self.policy.specific.contains(&finding.name)
            || finding
                .category
                .as_ref()
                .is_some_and(|category| self.policy.categories.contains(category))
    }

    /// Vacuously true when there are no findings
    pub fn all_licenses_accepted(&self, findings: &[LicenseFinding]) -> bool {
        findings.iter().all(|finding| self.is_accepted(finding))
    }
}
