use crate::error::{ClientError, Operation};
use crate::gateway::Gateway;
use crate::models::ChatMessage;

/// Bot reply shown when a query gets no answer.
pub const FALLBACK_ANSWER: &str = "Error occurred while querying.";

/// Append-only chat log for the query panel. Lives as long as the process.
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// Appends the question right away, then the backend's answer or the
    /// fallback bubble. The transcript gets a bot message either way; the
    /// error is handed back so the caller can report it.
    pub async fn ask(&mut self, gateway: &Gateway, question: &str) -> Result<String, ClientError> {
        self.messages.push(ChatMessage::user(question));

        match gateway.query(question).await {
            Ok(resp) => {
                self.messages
                    .push(ChatMessage::bot(resp.answer.clone(), resp.sources));
                Ok(resp.answer)
            }
            Err(e) => {
                log::error!("Query failed: {}", e);
                self.messages.push(ChatMessage::bot_failure(FALLBACK_ANSWER));
                Err(ClientError::Fetch {
                    operation: Operation::Query,
                    source: e,
                })
            }
        }
    }
}
