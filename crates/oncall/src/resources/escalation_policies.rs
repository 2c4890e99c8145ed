//! Escalation policies: single steps of an escalation chain.
//!
//! On the wire a policy is one flat object; its `type` field says which rule
//! the step applies and which extra fields are present. In memory the rule is
//! an [`EscalationPolicyRule`] and the discriminator is derived from it.

use std::time::Duration;

use chrono::NaiveTime;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::instrument;

use super::{null_as_default, push_if_set, ListFilter};
use crate::client::OnCallClient;
use crate::error::Result;
use crate::pagination::{paginate, Page};
use crate::time;
use crate::transport::Transport;
use crate::variant::{self, object_fields, Polymorphic, Variant};

const ESCALATION_POLICIES_PATH: &str = "escalation_policies";

/// Position placing a new policy first in its chain.
pub const POSITION_START: i32 = 0;

/// Position placing a new policy last in its chain.
pub const POSITION_END: i32 = -1;

/// One step of an escalation chain.
#[derive(Debug, Clone, PartialEq)]
pub struct EscalationPolicy {
    /// Server-assigned ID; empty until created.
    pub id: String,
    pub escalation_chain_id: String,
    pub position: i32,
    /// `None` when the server reports a rule type this client does not know.
    pub rule: Option<EscalationPolicyRule>,
}

/// Header fields shared by every rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationPolicyHeader {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub escalation_chain_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub position: i32,
}

impl Polymorphic for EscalationPolicy {
    type Header = EscalationPolicyHeader;
    type Variant = EscalationPolicyRule;

    fn from_parts(header: EscalationPolicyHeader, rule: Option<EscalationPolicyRule>) -> Self {
        Self {
            id: header.id,
            escalation_chain_id: header.escalation_chain_id,
            position: header.position,
            rule,
        }
    }

    fn header(&self) -> EscalationPolicyHeader {
        EscalationPolicyHeader {
            id: self.id.clone(),
            escalation_chain_id: self.escalation_chain_id.clone(),
            position: self.position,
        }
    }

    fn variant(&self) -> Option<&EscalationPolicyRule> {
        self.rule.as_ref()
    }
}

impl Serialize for EscalationPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        variant::serialize_entity(self, serializer)
    }
}

impl<'de> Deserialize<'de> for EscalationPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        variant::deserialize_entity(deserializer)
    }
}

/// Rule types understood by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EscalationPolicyType {
    Wait,
    NotifyPersons,
    NotifyPersonNextEachTime,
    NotifyOnCallFromSchedule,
    NotifyUserGroup,
    TriggerAction,
    Resolve,
    NotifyWholeChannel,
    NotifyIfTimeFromTo,
}

impl std::fmt::Display for EscalationPolicyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(variant::type_string_for_kind::<EscalationPolicyRule>(*self))
    }
}

/// The action an escalation step performs.
#[derive(Debug, Clone, PartialEq)]
pub enum EscalationPolicyRule {
    /// Pause before the next step.
    Wait { duration: Duration },
    /// Notify a fixed set of users.
    NotifyPersons { important: bool, user_ids: Vec<String> },
    /// Notify one user from the list, rotating on each escalation.
    NotifyPersonNextEachTime { user_ids: Vec<String> },
    /// Notify whoever is on call in a schedule.
    NotifyOnCallFromSchedule { important: bool, schedule_id: String },
    /// Notify a Slack user group.
    NotifyUserGroup { important: bool, user_group_id: String },
    /// Run an outgoing webhook.
    TriggerAction { action_id: String },
    /// Resolve the alert group.
    Resolve,
    /// Notify the whole Slack channel.
    NotifyWholeChannel,
    /// Continue escalating only between two times of day.
    NotifyIfTimeFromTo { from: NaiveTime, to: NaiveTime },
}

// Wire shapes for each rule. Fields are decoded from the same flat object as
// the header, so unknown keys must be ignored. The server sends `null` for
// unset fields.

#[derive(Serialize, Deserialize)]
struct WaitFields {
    #[serde(with = "time::seconds")]
    duration: Duration,
}

#[derive(Serialize, Deserialize)]
struct NotifyPersonsFields {
    #[serde(default, deserialize_with = "null_as_default")]
    important: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    persons_to_notify: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct NotifyPersonNextEachTimeFields {
    #[serde(default, deserialize_with = "null_as_default")]
    persons_to_notify_next_each_time: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct NotifyOnCallFromScheduleFields {
    #[serde(default, deserialize_with = "null_as_default")]
    important: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    notify_on_call_from_schedule: String,
}

#[derive(Serialize, Deserialize)]
struct NotifyUserGroupFields {
    #[serde(default, deserialize_with = "null_as_default")]
    important: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    group_to_notify: String,
}

#[derive(Serialize, Deserialize)]
struct TriggerActionFields {
    #[serde(default, deserialize_with = "null_as_default")]
    action_to_trigger: String,
}

#[derive(Serialize, Deserialize)]
struct NotifyIfTimeFromToFields {
    #[serde(with = "time::time_of_day")]
    notify_if_time_from: NaiveTime,
    #[serde(with = "time::time_of_day")]
    notify_if_time_to: NaiveTime,
}

impl Variant for EscalationPolicyRule {
    type Kind = EscalationPolicyType;

    const FAMILY: &'static str = "escalation_policy";

    const REGISTRY: &'static [(&'static str, EscalationPolicyType)] = &[
        ("wait", EscalationPolicyType::Wait),
        ("notify_persons", EscalationPolicyType::NotifyPersons),
        (
            "notify_person_next_each_time",
            EscalationPolicyType::NotifyPersonNextEachTime,
        ),
        (
            "notify_on_call_from_schedule",
            EscalationPolicyType::NotifyOnCallFromSchedule,
        ),
        ("notify_user_group", EscalationPolicyType::NotifyUserGroup),
        ("trigger_action", EscalationPolicyType::TriggerAction),
        ("resolve", EscalationPolicyType::Resolve),
        ("notify_whole_channel", EscalationPolicyType::NotifyWholeChannel),
        ("notify_if_time_from_to", EscalationPolicyType::NotifyIfTimeFromTo),
    ];

    fn kind(&self) -> EscalationPolicyType {
        match self {
            Self::Wait { .. } => EscalationPolicyType::Wait,
            Self::NotifyPersons { .. } => EscalationPolicyType::NotifyPersons,
            Self::NotifyPersonNextEachTime { .. } => EscalationPolicyType::NotifyPersonNextEachTime,
            Self::NotifyOnCallFromSchedule { .. } => EscalationPolicyType::NotifyOnCallFromSchedule,
            Self::NotifyUserGroup { .. } => EscalationPolicyType::NotifyUserGroup,
            Self::TriggerAction { .. } => EscalationPolicyType::TriggerAction,
            Self::Resolve => EscalationPolicyType::Resolve,
            Self::NotifyWholeChannel => EscalationPolicyType::NotifyWholeChannel,
            Self::NotifyIfTimeFromTo { .. } => EscalationPolicyType::NotifyIfTimeFromTo,
        }
    }

    fn decode(kind: EscalationPolicyType, payload: &Value) -> serde_json::Result<Self> {
        Ok(match kind {
            EscalationPolicyType::Wait => {
                let f = WaitFields::deserialize(payload)?;
                Self::Wait {
                    duration: f.duration,
                }
            }
            EscalationPolicyType::NotifyPersons => {
                let f = NotifyPersonsFields::deserialize(payload)?;
                Self::NotifyPersons {
                    important: f.important,
                    user_ids: f.persons_to_notify,
                }
            }
            EscalationPolicyType::NotifyPersonNextEachTime => {
                let f = NotifyPersonNextEachTimeFields::deserialize(payload)?;
                Self::NotifyPersonNextEachTime {
                    user_ids: f.persons_to_notify_next_each_time,
                }
            }
            EscalationPolicyType::NotifyOnCallFromSchedule => {
                let f = NotifyOnCallFromScheduleFields::deserialize(payload)?;
                Self::NotifyOnCallFromSchedule {
                    important: f.important,
                    schedule_id: f.notify_on_call_from_schedule,
                }
            }
            EscalationPolicyType::NotifyUserGroup => {
                let f = NotifyUserGroupFields::deserialize(payload)?;
                Self::NotifyUserGroup {
                    important: f.important,
                    user_group_id: f.group_to_notify,
                }
            }
            EscalationPolicyType::TriggerAction => {
                let f = TriggerActionFields::deserialize(payload)?;
                Self::TriggerAction {
                    action_id: f.action_to_trigger,
                }
            }
            EscalationPolicyType::Resolve => Self::Resolve,
            EscalationPolicyType::NotifyWholeChannel => Self::NotifyWholeChannel,
            EscalationPolicyType::NotifyIfTimeFromTo => {
                let f = NotifyIfTimeFromToFields::deserialize(payload)?;
                Self::NotifyIfTimeFromTo {
                    from: f.notify_if_time_from,
                    to: f.notify_if_time_to,
                }
            }
        })
    }

    fn encode_fields(&self) -> serde_json::Result<Map<String, Value>> {
        match self {
            Self::Wait { duration } => object_fields(&WaitFields {
                duration: *duration,
            }),
            Self::NotifyPersons {
                important,
                user_ids,
            } => object_fields(&NotifyPersonsFields {
                important: *important,
                persons_to_notify: user_ids.clone(),
            }),
            Self::NotifyPersonNextEachTime { user_ids } => {
                object_fields(&NotifyPersonNextEachTimeFields {
                    persons_to_notify_next_each_time: user_ids.clone(),
                })
            }
            Self::NotifyOnCallFromSchedule {
                important,
                schedule_id,
            } => object_fields(&NotifyOnCallFromScheduleFields {
                important: *important,
                notify_on_call_from_schedule: schedule_id.clone(),
            }),
            Self::NotifyUserGroup {
                important,
                user_group_id,
            } => object_fields(&NotifyUserGroupFields {
                important: *important,
                group_to_notify: user_group_id.clone(),
            }),
            Self::TriggerAction { action_id } => object_fields(&TriggerActionFields {
                action_to_trigger: action_id.clone(),
            }),
            Self::Resolve | Self::NotifyWholeChannel => Ok(Map::new()),
            Self::NotifyIfTimeFromTo { from, to } => object_fields(&NotifyIfTimeFromToFields {
                notify_if_time_from: *from,
                notify_if_time_to: *to,
            }),
        }
    }
}

/// Narrows an escalation policy listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EscalationPolicyFilter {
    /// Only policies in this chain.
    pub escalation_chain_id: String,
}

impl ListFilter for EscalationPolicyFilter {
    fn query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        push_if_set(&mut query, "escalation_chain_id", &self.escalation_chain_id);
        query
    }
}

impl<T: Transport> OnCallClient<T> {
    /// Add a step to an escalation chain.
    ///
    /// `position` is the zero-based index in the chain; use
    /// [`POSITION_START`] or [`POSITION_END`] for either end.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn create_escalation_policy(
        &self,
        escalation_chain_id: &str,
        position: i32,
        rule: EscalationPolicyRule,
    ) -> Result<EscalationPolicy> {
        let policy = EscalationPolicy {
            id: String::new(),
            escalation_chain_id: escalation_chain_id.to_string(),
            position,
            rule: Some(rule),
        };
        self.post(&[ESCALATION_POLICIES_PATH], &policy).await
    }

    /// Fetch one page of escalation policies. `page` is zero-based.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response does not decode.
    pub async fn list_escalation_policies_page(
        &self,
        page: u32,
        filter: &EscalationPolicyFilter,
    ) -> Result<Page<EscalationPolicy>> {
        self.get_page(ESCALATION_POLICIES_PATH, page, filter).await
    }

    /// Fetch every escalation policy matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns the first page error; no partial list is returned.
    #[instrument(skip(self))]
    pub async fn list_escalation_policies(
        &self,
        filter: &EscalationPolicyFilter,
    ) -> Result<Vec<EscalationPolicy>> {
        paginate(
            move |page, filter| self.list_escalation_policies_page(page, filter),
            filter,
        )
        .await
    }

    /// Fetch one escalation policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the policy does not exist.
    pub async fn get_escalation_policy(&self, id: &str) -> Result<EscalationPolicy> {
        self.get(&[ESCALATION_POLICIES_PATH, id]).await
    }

    /// Delete an escalation policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn delete_escalation_policy(&self, id: &str) -> Result<()> {
        self.delete(&[ESCALATION_POLICIES_PATH, id]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::FakeTransport;
    use crate::variant::{type_string_for_variant, variant_for_type_string};
    use serde_json::json;

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn every_rule() -> Vec<EscalationPolicyRule> {
        vec![
            EscalationPolicyRule::Wait {
                duration: Duration::from_secs(300),
            },
            EscalationPolicyRule::NotifyPersons {
                important: true,
                user_ids: vec!["U1".into(), "U2".into()],
            },
            EscalationPolicyRule::NotifyPersonNextEachTime {
                user_ids: vec!["U3".into()],
            },
            EscalationPolicyRule::NotifyOnCallFromSchedule {
                important: false,
                schedule_id: "SBM7DV7BKFUYU".into(),
            },
            EscalationPolicyRule::NotifyUserGroup {
                important: true,
                user_group_id: "GRP1".into(),
            },
            EscalationPolicyRule::TriggerAction {
                action_id: "ACT1".into(),
            },
            EscalationPolicyRule::Resolve,
            EscalationPolicyRule::NotifyWholeChannel,
            EscalationPolicyRule::NotifyIfTimeFromTo {
                from: hms(9, 0, 0),
                to: hms(17, 30, 15),
            },
        ]
    }

    #[test]
    fn test_every_rule_round_trips() {
        for (position, rule) in every_rule().into_iter().enumerate() {
            let policy = EscalationPolicy {
                id: format!("E{position}"),
                escalation_chain_id: "F5JU6KJET33FE".into(),
                position: i32::try_from(position).unwrap(),
                rule: Some(rule),
            };

            let encoded = serde_json::to_value(&policy).unwrap();
            let decoded: EscalationPolicy = serde_json::from_value(encoded.clone()).unwrap();
            assert_eq!(decoded, policy, "round trip through {encoded}");
        }
    }

    #[test]
    fn test_every_kind_is_registered() {
        for rule in every_rule() {
            let type_str = type_string_for_variant(Some(&rule));
            assert_ne!(type_str, variant::UNKNOWN_TYPE);
            assert_eq!(
                variant_for_type_string::<EscalationPolicyRule>(type_str),
                Some(rule.kind())
            );
        }
    }

    #[test]
    fn test_decode_api_example() {
        let raw = json!({
            "id": "E3GA6SJETWWJS",
            "escalation_chain_id": "F5JU6KJET33FE",
            "position": 0,
            "type": "notify_persons",
            "important": false,
            "persons_to_notify": ["U4DNY931HHJS5"]
        });

        let policy: EscalationPolicy = serde_json::from_value(raw).unwrap();
        assert_eq!(policy.id, "E3GA6SJETWWJS");
        assert_eq!(
            policy.rule,
            Some(EscalationPolicyRule::NotifyPersons {
                important: false,
                user_ids: vec!["U4DNY931HHJS5".into()],
            })
        );
    }

    #[test]
    fn test_decode_is_case_insensitive() {
        let raw = json!({"id": "E1", "escalation_chain_id": "F1", "position": 1, "type": "WAIT", "duration": 60});
        let policy: EscalationPolicy = serde_json::from_value(raw).unwrap();
        assert_eq!(
            policy.rule,
            Some(EscalationPolicyRule::Wait {
                duration: Duration::from_secs(60)
            })
        );
    }

    #[test]
    fn test_unknown_rule_type_decodes_without_rule() {
        let raw = json!({
            "id": "E1",
            "escalation_chain_id": "F1",
            "position": 2,
            "type": "notify_team_members",
            "notify_to_team_members": "T1"
        });

        let policy: EscalationPolicy = serde_json::from_value(raw).unwrap();
        assert_eq!(policy.position, 2);
        assert!(policy.rule.is_none());
    }

    #[test]
    fn test_null_header_fields_decode_as_default() {
        let raw = json!({
            "id": "E1",
            "escalation_chain_id": null,
            "position": null,
            "type": "resolve"
        });

        let policy: EscalationPolicy = serde_json::from_value(raw).unwrap();
        assert_eq!(policy.escalation_chain_id, "");
        assert_eq!(policy.position, 0);
        assert_eq!(policy.rule, Some(EscalationPolicyRule::Resolve));
    }

    #[test]
    fn test_time_window_uses_time_of_day_layout() {
        let policy = EscalationPolicy {
            id: String::new(),
            escalation_chain_id: "F1".into(),
            position: POSITION_END,
            rule: Some(EscalationPolicyRule::NotifyIfTimeFromTo {
                from: hms(22, 0, 0),
                to: hms(6, 0, 0),
            }),
        };

        assert_eq!(
            serde_json::to_value(&policy).unwrap(),
            json!({
                "escalation_chain_id": "F1",
                "position": -1,
                "type": "notify_if_time_from_to",
                "notify_if_time_from": "22:00:00Z",
                "notify_if_time_to": "06:00:00Z"
            })
        );
    }

    #[test]
    fn test_bad_time_window_fails_decode() {
        let raw = json!({
            "type": "notify_if_time_from_to",
            "notify_if_time_from": "2023-01-15T10:30:00Z",
            "notify_if_time_to": "06:00:00Z"
        });
        assert!(serde_json::from_value::<EscalationPolicy>(raw).is_err());
    }

    #[test]
    fn test_uncreated_policy_never_emits_id() {
        for rule in every_rule().into_iter().map(Some).chain([None]) {
            let policy = EscalationPolicy {
                id: String::new(),
                escalation_chain_id: "F1".into(),
                position: POSITION_START,
                rule,
            };
            let encoded = serde_json::to_value(&policy).unwrap();
            assert!(encoded.get("id").is_none(), "{encoded}");
        }
    }

    #[test]
    fn test_type_display() {
        assert_eq!(
            EscalationPolicyType::NotifyOnCallFromSchedule.to_string(),
            "notify_on_call_from_schedule"
        );
    }

    #[test]
    fn test_filter_query() {
        assert!(EscalationPolicyFilter::default().query().is_empty());
        let filter = EscalationPolicyFilter {
            escalation_chain_id: "F1".into(),
        };
        assert_eq!(
            filter.query(),
            vec![("escalation_chain_id".to_string(), "F1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_create_sends_flat_body() {
        let created = json!({
            "id": "E9",
            "escalation_chain_id": "F1",
            "position": 0,
            "type": "wait",
            "duration": 900
        });
        let client = OnCallClient::with_transport(
            FakeTransport::default().respond(201, &created.to_string()),
        );

        let policy = client
            .create_escalation_policy(
                "F1",
                POSITION_START,
                EscalationPolicyRule::Wait {
                    duration: Duration::from_secs(900),
                },
            )
            .await
            .unwrap();
        assert_eq!(policy.id, "E9");

        let sent = client.transport().sent();
        let body: Value = serde_json::from_slice(sent[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({"escalation_chain_id": "F1", "position": 0, "type": "wait", "duration": 900})
        );
    }
}
