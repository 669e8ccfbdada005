//! Recipient policy gate
//!
//! Consulted after eligibility and before every upsert. A denial turns the
//! upsert into a delete.

use std::collections::HashSet;
use std::sync::Arc;

use calarm_domain::MailAddress;

/// Decides whether a recipient may receive alarms at all.
pub trait RecipientPolicy: Send + Sync {
    fn allows(&self, recipient: &MailAddress) -> bool;
}

/// Allows every recipient.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl RecipientPolicy for AllowAll {
    fn allows(&self, _recipient: &MailAddress) -> bool {
        true
    }
}

/// Allows recipients whose domain is listed. An empty list allows everyone.
#[derive(Debug, Clone, Default)]
pub struct DomainAllowList {
    domains: HashSet<String>,
}

impl DomainAllowList {
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            domains: domains
                .into_iter()
                .map(|domain| domain.as_ref().trim().trim_start_matches('@').to_lowercase())
                .filter(|domain| !domain.is_empty())
                .collect(),
        }
    }
}

impl RecipientPolicy for DomainAllowList {
    fn allows(&self, recipient: &MailAddress) -> bool {
        self.domains.is_empty() || self.domains.contains(recipient.domain())
    }
}

/// Denies an explicit set of addresses.
#[derive(Debug, Clone, Default)]
pub struct DenyList {
    denied: HashSet<MailAddress>,
}

impl DenyList {
    pub fn new(denied: impl IntoIterator<Item = MailAddress>) -> Self {
        Self { denied: denied.into_iter().collect() }
    }
}

impl RecipientPolicy for DenyList {
    fn allows(&self, recipient: &MailAddress) -> bool {
        !self.denied.contains(recipient)
    }
}

/// Allows a recipient only when every inner policy does.
#[derive(Clone, Default)]
pub struct AllOf {
    policies: Vec<Arc<dyn RecipientPolicy>>,
}

impl AllOf {
    pub fn new(policies: Vec<Arc<dyn RecipientPolicy>>) -> Self {
        Self { policies }
    }

    pub fn with(mut self, policy: Arc<dyn RecipientPolicy>) -> Self {
        self.policies.push(policy);
        self
    }
}

impl RecipientPolicy for AllOf {
    fn allows(&self, recipient: &MailAddress) -> bool {
        self.policies.iter().all(|policy| policy.allows(recipient))
    }
}
