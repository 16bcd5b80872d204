//! Conversations API.

use crate::client::DifyClient;
use crate::error::{Error, Result};
use crate::types::{
    ConversationVariablesQuery, ConversationVariablesResponse, ConversationsQuery,
    ConversationsResponse, RenameConversationRequest, RenameConversationResponse,
};

/// Page size used when the caller does not set one.
const DEFAULT_LIMIT: u32 = 20;

/// Largest page size the variables endpoint accepts.
const MAX_VARIABLES_LIMIT: u32 = 100;

/// Conversations API client.
pub struct ConversationsApi {
    client: DifyClient,
}

impl ConversationsApi {
    pub(crate) fn new(client: DifyClient) -> Self {
        Self { client }
    }

    /// List the user's conversations, most recent first.
    pub async fn list(&self, mut query: ConversationsQuery) -> Result<ConversationsResponse> {
        if query.user.is_empty() {
            return Err(Error::Validation("user is required".to_string()));
        }
        query.limit = Some(query.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT));
        self.client.get_with_query("conversations", &query).await
    }

    /// List the variables stored on a conversation.
    pub async fn variables(
        &self,
        mut query: ConversationVariablesQuery,
    ) -> Result<ConversationVariablesResponse> {
        if query.conversation_id.is_empty() {
            return Err(Error::Validation("conversation_id is required".to_string()));
        }
        if query.user.is_empty() {
            return Err(Error::Validation("user is required".to_string()));
        }
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_VARIABLES_LIMIT).contains(&limit) {
            return Err(Error::Validation(format!(
                "limit must be between 1 and {}",
                MAX_VARIABLES_LIMIT
            )));
        }
        query.limit = Some(limit);

        let path = format!("conversations/{}/variables", query.conversation_id);
        self.client.get_with_query(&path, &query).await
    }

    /// Rename a conversation.
    pub async fn rename(
        &self,
        conversation_id: &str,
        request: RenameConversationRequest,
    ) -> Result<RenameConversationResponse> {
        if conversation_id.is_empty() {
            return Err(Error::Validation("conversation_id is required".to_string()));
        }
        if request.name.is_none() && request.auto_generate != Some(true) {
            return Err(Error::Validation(
                "name is required unless auto_generate is set".to_string(),
            ));
        }
        let path = format!("conversations/{}/name", conversation_id);
        self.client.post(&path, &request).await
    }
}
