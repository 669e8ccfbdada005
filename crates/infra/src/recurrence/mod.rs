//! Recurrence expansion adapters

mod rrule_expander;

pub use rrule_expander::RRuleExpander;
