//! Escalation chains.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::ListFilter;
use crate::client::OnCallClient;
use crate::error::Result;
use crate::pagination::{paginate, Page};
use crate::transport::Transport;

const ESCALATION_CHAINS_PATH: &str = "escalation_chains";

/// An ordered list of escalation policies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscalationChain {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub team_id: Option<String>,
}

/// Escalation chains cannot be filtered yet; the type keeps list calls
/// uniform with the other resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EscalationChainFilter;

impl ListFilter for EscalationChainFilter {
    fn query(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Optional settings for [`OnCallClient::create_escalation_chain`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateEscalationChainOptions {
    /// Team owning the chain. Empty means no team.
    pub team_id: String,
}

#[derive(Serialize)]
struct CreateEscalationChainBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "str::is_empty")]
    team_id: &'a str,
}

impl<T: Transport> OnCallClient<T> {
    /// Fetch one page of escalation chains. `page` is zero-based.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response does not decode.
    pub async fn list_escalation_chains_page(
        &self,
        page: u32,
        filter: &EscalationChainFilter,
    ) -> Result<Page<EscalationChain>> {
        self.get_page(ESCALATION_CHAINS_PATH, page, filter).await
    }

    /// Fetch every escalation chain.
    ///
    /// # Errors
    ///
    /// Returns the first page error; no partial list is returned.
    #[instrument(skip(self))]
    pub async fn list_escalation_chains(
        &self,
        filter: &EscalationChainFilter,
    ) -> Result<Vec<EscalationChain>> {
        paginate(
            move |page, filter| self.list_escalation_chains_page(page, filter),
            filter,
        )
        .await
    }

    /// Fetch one escalation chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the chain does not exist.
    pub async fn get_escalation_chain(&self, id: &str) -> Result<EscalationChain> {
        self.get(&[ESCALATION_CHAINS_PATH, id]).await
    }

    /// Create an escalation chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn create_escalation_chain(
        &self,
        name: &str,
        options: &CreateEscalationChainOptions,
    ) -> Result<EscalationChain> {
        let body = CreateEscalationChainBody {
            name,
            team_id: &options.team_id,
        };
        self.post(&[ESCALATION_CHAINS_PATH], &body).await
    }

    /// Delete an escalation chain.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server rejects it.
    pub async fn delete_escalation_chain(&self, id: &str) -> Result<()> {
        self.delete(&[ESCALATION_CHAINS_PATH, id]).await
    }
}
