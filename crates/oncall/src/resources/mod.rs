//! Typed operations for each OnCall resource.
//!
//! Every resource follows the same shape: a `list_*_page` call returning one
//! [`Page`](crate::Page), a `list_*` call walking all pages, and where the API
//! allows it `get_*`, `create_*` and `delete_*`.

pub mod alerts;
pub mod escalation_chains;
pub mod escalation_policies;
pub mod schedules;
pub mod users;

use serde::Deserialize;

pub use alerts::{Alert, AlertFilter};
pub use escalation_chains::{CreateEscalationChainOptions, EscalationChain, EscalationChainFilter};
pub use escalation_policies::{
    EscalationPolicy, EscalationPolicyFilter, EscalationPolicyRule, EscalationPolicyType,
};
pub use schedules::{
    CreateScheduleOptions, Schedule, ScheduleCalendar, ScheduleCalendarType, ScheduleFilter,
    ScheduleSlackMetadata,
};
pub use users::{User, UserFilter, UserRole, UserSlackMetadata};

/// Translation of a list filter into query parameters.
///
/// Fields left at their default are omitted entirely, never sent empty.
pub trait ListFilter {
    /// Query parameters for the non-default fields.
    fn query(&self) -> Vec<(String, String)>;
}

/// Decode `null` as the type's default value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + serde::Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Append `key=value` unless `value` is empty.
pub(crate) fn push_if_set(query: &mut Vec<(String, String)>, key: &str, value: &str) {
    if !value.is_empty() {
        query.push((key.to_string(), value.to_string()));
    }
}
