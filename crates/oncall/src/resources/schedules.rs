//! On-call schedules.
//!
//! A schedule is backed either by shifts defined in the web UI or by an
//! external iCal feed; the wire `type` field says which. See
//! [`crate::variant`] for how the flat object is split and rejoined.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::instrument;

use super::{null_as_default, push_if_set, ListFilter};
use crate::client::OnCallClient;
use crate::error::Result;
use crate::pagination::{paginate, Page};
use crate::transport::Transport;
use crate::variant::{self, object_fields, Polymorphic, Variant};

const SCHEDULES_PATH: &str = "schedules";

/// Time zone used when none is given at creation.
pub const DEFAULT_TIME_ZONE: &str = "UTC";

/// An on-call schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    /// Server-assigned ID; empty until created.
    pub id: String,
    pub name: String,
    pub team_id: String,
    /// IANA time zone name, e.g. `Europe/Berlin`.
    pub time_zone: String,
    /// iCal feed whose events override the schedule.
    pub ical_url_overrides: String,
    pub slack: ScheduleSlackMetadata,
    /// `None` when the server reports a calendar type this client does not know.
    pub calendar: Option<ScheduleCalendar>,
}

/// Slack integration settings of a schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlackMetadata {
    #[serde(default, deserialize_with = "null_as_default")]
    pub channel_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_group_id: String,
}

/// Header fields shared by every calendar type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleHeader {
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub team_id: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub time_zone: String,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "String::is_empty")]
    pub ical_url_overrides: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub slack: ScheduleSlackMetadata,
}

impl Polymorphic for Schedule {
    type Header = ScheduleHeader;
    type Variant = ScheduleCalendar;

    fn from_parts(header: ScheduleHeader, calendar: Option<ScheduleCalendar>) -> Self {
        Self {
            id: header.id,
            name: header.name,
            team_id: header.team_id,
            time_zone: header.time_zone,
            ical_url_overrides: header.ical_url_overrides,
            slack: header.slack,
            calendar,
        }
    }

    fn header(&self) -> ScheduleHeader {
        ScheduleHeader {
            id: self.id.clone(),
            name: self.name.clone(),
            team_id: self.team_id.clone(),
            time_zone: self.time_zone.clone(),
            ical_url_overrides: self.ical_url_overrides.clone(),
            slack: self.slack.clone(),
        }
    }

    fn variant(&self) -> Option<&ScheduleCalendar> {
        self.calendar.as_ref()
    }
}

impl Serialize for Schedule {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        variant::serialize_entity(self, serializer)
    }
}

impl<'de> Deserialize<'de> for Schedule {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        variant::deserialize_entity(deserializer)
    }
}

/// Calendar types understood by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScheduleCalendarType {
    Web,
    ICal,
}

impl std::fmt::Display for ScheduleCalendarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(variant::type_string_for_kind::<ScheduleCalendar>(*self))
    }
}

/// Where a schedule's shifts come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleCalendar {
    /// Shifts managed through the API or web UI.
    Web { shift_ids: Vec<String> },
    /// Shifts read from an external iCal feed.
    ICal { primary_url: String },
}

#[derive(Serialize, Deserialize)]
struct WebFields {
    #[serde(default, deserialize_with = "null_as_default")]
    shifts: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct ICalFields {
    #[serde(default, deserialize_with = "null_as_default")]
    ical_url_primary: String,
}

impl Variant for ScheduleCalendar {
    type Kind = ScheduleCalendarType;

    const FAMILY: &'static str = "schedule";

    const REGISTRY: &'static [(&'static str, ScheduleCalendarType)] = &[
        ("calendar", ScheduleCalendarType::Web),
        ("ical", ScheduleCalendarType::ICal),
    ];

    fn kind(&self) -> ScheduleCalendarType {
        match self {
            Self::Web { .. } => ScheduleCalendarType::Web,
            Self::ICal { .. } => ScheduleCalendarType::ICal,
        }
    }

    fn decode(kind: ScheduleCalendarType, payload: &Value) -> serde_json::Result<Self> {
        Ok(match kind {
            ScheduleCalendarType::Web => Self::Web {
                shift_ids: WebFields::deserialize(payload)?.shifts,
            },
            ScheduleCalendarType::ICal => Self::ICal {
                primary_url: ICalFields::deserialize(payload)?.ical_url_primary,
            },
        })
    }

    fn encode_fields(&self) -> serde_json::Result<Map<String, Value>> {
        match self {
            Self::Web { shift_ids } => object_fields(&WebFields {
                shifts: shift_ids.clone(),
            }),
            Self::ICal { primary_url } => object_fields(&ICalFields {
                ical_url_primary: primary_url.clone(),
            }),
        }
    }
}

/// Optional settings for [`OnCallClient::create_schedule`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateScheduleOptions {
    pub team_id: String,
    pub slack: ScheduleSlackMetadata,
    pub ical_url_overrides: String,
    /// Defaults to [`DEFAULT_TIME_ZONE`] when empty.
    pub time_zone: String,
}

/// Narrows a schedule listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleFilter {
    /// Only schedules with exactly this name.
    pub name: String,
}

impl ListFilter for ScheduleFilter {
    fn query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        push_if_set(&mut query, "name", &self.name);
        query
    }
}

impl<T: Transport> OnCallClient<T> {
    /// Create a schedule.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn create_schedule(
        &self,
        name: &str,
        calendar: ScheduleCalendar,
        options: &CreateScheduleOptions,
    ) -> Result<Schedule> {
        let time_zone = if options.time_zone.is_empty() {
            DEFAULT_TIME_ZONE.to_string()
        } else {
            options.time_zone.clone()
        };

        let schedule = Schedule {
            id: String::new(),
            name: name.to_string(),
            team_id: options.team_id.clone(),
            time_zone,
            ical_url_overrides: options.ical_url_overrides.clone(),
            slack: options.slack.clone(),
            calendar: Some(calendar),
        };
        self.post(&[SCHEDULES_PATH], &schedule).await
    }

    /// Fetch one page of schedules. `page` is zero-based.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response does not decode.
    pub async fn list_schedules_page(
        &self,
        page: u32,
        filter: &ScheduleFilter,
    ) -> Result<Page<Schedule>> {
        self.get_page(SCHEDULES_PATH, page, filter).await
    }

    /// Fetch every schedule matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns the first page error; no partial list is returned.
    #[instrument(skip(self))]
    pub async fn list_schedules(&self, filter: &ScheduleFilter) -> Result<Vec<Schedule>> {
        paginate(move |page, filter| self.list_schedules_page(page, filter), filter).await
    }

    /// Fetch one schedule.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the schedule does not exist.
    pub async fn get_schedule(&self, id: &str) -> Result<Schedule> {
        self.get(&[SCHEDULES_PATH, id]).await
    }

    /// Delete a schedule.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn delete_schedule(&self, id: &str) -> Result<()> {
        self.delete(&[SCHEDULES_PATH, id]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::FakeTransport;
    use crate::error::OnCallError;
    use serde_json::json;

    fn schedule(calendar: Option<ScheduleCalendar>) -> Schedule {
        Schedule {
            id: "SBM7DV7BKFUYU".into(),
            name: "Primary".into(),
            team_id: "TI73TDU19W48J".into(),
            time_zone: "America/New_York".into(),
            ical_url_overrides: "https://example.com/overrides.ics".into(),
            slack: ScheduleSlackMetadata {
                channel_id: "MCMJAE5I3LP5T".into(),
                user_group_id: String::new(),
            },
            calendar,
        }
    }

    #[test]
    fn test_both_calendars_round_trip() {
        let calendars = [
            ScheduleCalendar::Web {
                shift_ids: vec!["OH3V5FYQEYJ6M".into(), "O9WTH7CKM3KZW".into()],
            },
            ScheduleCalendar::ICal {
                primary_url: "https://example.com/primary.ics".into(),
            },
        ];

        for calendar in calendars {
            let original = schedule(Some(calendar));
            let encoded = serde_json::to_value(&original).unwrap();
            let decoded: Schedule = serde_json::from_value(encoded.clone()).unwrap();
            assert_eq!(decoded, original, "round trip through {encoded}");
        }
    }

    #[test]
    fn test_decode_api_example() {
        let raw = json!({
            "id": "SBM7DV7BKFUYU",
            "name": "Demo schedule iCal",
            "type": "ical",
            "team_id": null,
            "ical_url_primary": "https://example.com/meow_calendar.ics",
            "ical_url_overrides": "https://example.com/meow_calendar_overrides.ics",
            "on_call_now": ["U4DNY931HHJS5"],
            "slack": {"channel_id": "MCMJAE5I3LP5T", "user_group_id": null}
        });

        let schedule: Schedule = serde_json::from_value(raw).unwrap();
        assert_eq!(schedule.name, "Demo schedule iCal");
        assert_eq!(schedule.team_id, "");
        assert_eq!(schedule.slack.channel_id, "MCMJAE5I3LP5T");
        assert_eq!(
            schedule.calendar,
            Some(ScheduleCalendar::ICal {
                primary_url: "https://example.com/meow_calendar.ics".into()
            })
        );
    }

    #[test]
    fn test_unknown_calendar_type_decodes_without_calendar() {
        let raw = json!({"id": "S1", "name": "Web", "type": "web", "shifts": []});
        let schedule: Schedule = serde_json::from_value(raw).unwrap();
        assert_eq!(schedule.name, "Web");
        assert!(schedule.calendar.is_none());
    }

    #[test]
    fn test_null_header_fields_decode_as_default() {
        let raw = json!({
            "id": null,
            "name": null,
            "team_id": null,
            "time_zone": null,
            "slack": null,
            "type": "ical",
            "ical_url_primary": null
        });
        let schedule: Schedule = serde_json::from_value(raw).unwrap();
        assert_eq!(schedule.id, "");
        assert_eq!(schedule.name, "");
        assert_eq!(schedule.slack, ScheduleSlackMetadata::default());
        assert_eq!(
            schedule.calendar,
            Some(ScheduleCalendar::ICal {
                primary_url: String::new()
            })
        );
    }

    #[test]
    fn test_encode_omits_empty_optional_headers() {
        let schedule = Schedule {
            id: String::new(),
            name: "Bare".into(),
            team_id: String::new(),
            time_zone: String::new(),
            ical_url_overrides: String::new(),
            slack: ScheduleSlackMetadata::default(),
            calendar: None,
        };

        assert_eq!(
            serde_json::to_value(&schedule).unwrap(),
            json!({"name": "Bare", "slack": {"channel_id": "", "user_group_id": ""}})
        );
    }

    #[test]
    fn test_calendar_type_names() {
        assert_eq!(ScheduleCalendarType::Web.to_string(), "calendar");
        assert_eq!(ScheduleCalendarType::ICal.to_string(), "ical");
    }

    #[tokio::test]
    async fn test_create_defaults_time_zone() {
        let created = json!({"id": "S1", "name": "Nights", "type": "calendar", "time_zone": "UTC", "shifts": []});
        let client = OnCallClient::with_transport(
            FakeTransport::default().respond(201, &created.to_string()),
        );

        let schedule = client
            .create_schedule(
                "Nights",
                ScheduleCalendar::Web { shift_ids: vec![] },
                &CreateScheduleOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(schedule.id, "S1");

        let sent = client.transport().sent();
        let body: Value = serde_json::from_slice(sent[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "name": "Nights",
                "type": "calendar",
                "time_zone": "UTC",
                "shifts": [],
                "slack": {"channel_id": "", "user_group_id": ""}
            })
        );
    }

    #[tokio::test]
    async fn test_get_missing_schedule() {
        let client = OnCallClient::with_transport(
            FakeTransport::default().respond(404, r#"{"detail": "Not found."}"#),
        );
        let err = client.get_schedule("nope").await.unwrap_err();
        assert!(err.is_not_found());
        assert!(matches!(err, OnCallError::Api { .. }));
    }
}
