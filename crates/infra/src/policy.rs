//! Recipient policy assembly from configuration.

use std::sync::Arc;

use calarm_core::{AllOf, AllowAll, DenyList, DomainAllowList, RecipientPolicy};
use calarm_domain::{MailAddress, PolicyConfig};
use tracing::warn;

/// Build the policy gate. Unparseable denied addresses are skipped.
pub fn build_policy(config: &PolicyConfig) -> Arc<dyn RecipientPolicy> {
    if config.allowed_domains.is_empty() && config.denied_recipients.is_empty() {
        return Arc::new(AllowAll);
    }

    let denied = config.denied_recipients.iter().filter_map(|raw| match MailAddress::parse(raw) {
        Ok(address) => Some(address),
        Err(e) => {
            warn!(address = %raw, error = %e, "ignoring invalid denied recipient");
            None
        }
    });

    Arc::new(
        AllOf::default()
            .with(Arc::new(DomainAllowList::new(&config.allowed_domains)))
            .with(Arc::new(DenyList::new(denied))),
    )
}
