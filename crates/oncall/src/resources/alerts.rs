//! Alerts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

use super::{push_if_set, ListFilter};
use crate::client::OnCallClient;
use crate::error::Result;
use crate::pagination::{paginate, Page};
use crate::time;
use crate::transport::Transport;

const ALERTS_PATH: &str = "alerts";

/// A single alert received by an integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: String,
    pub alert_group_id: String,
    #[serde(with = "time::instant")]
    pub created_at: DateTime<Utc>,
    /// Raw payload as sent by the monitoring system.
    #[serde(default)]
    pub payload: Map<String, Value>,
}

/// Narrows an alert listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertFilter {
    /// Only alerts belonging to this alert group.
    pub alert_group_id: String,
    /// Free-text search over the alert payload.
    pub search: String,
}

impl ListFilter for AlertFilter {
    fn query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        push_if_set(&mut query, "alert_group_id", &self.alert_group_id);
        push_if_set(&mut query, "search", &self.search);
        query
    }
}

impl<T: Transport> OnCallClient<T> {
    /// Fetch one page of alerts. `page` is zero-based.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response does not decode.
    pub async fn list_alerts_page(&self, page: u32, filter: &AlertFilter) -> Result<Page<Alert>> {
        self.get_page(ALERTS_PATH, page, filter).await
    }

    /// Fetch every alert matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns the first page error; no partial list is returned.
    #[instrument(skip(self))]
    pub async fn list_alerts(&self, filter: &AlertFilter) -> Result<Vec<Alert>> {
        paginate(move |page, filter| self.list_alerts_page(page, filter), filter).await
    }
}
