//! # Mock Completion Model for Testing
//!
//! Provides a `MockCompletionModel` that implements the `CompletionModel` trait
//! for use in tests. Replies are scripted in order, so a test can make one
//! chunk fail with an HTTP status and the next one succeed.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::Mutex;

use super::{CompletionError, CompletionModel, CompletionRequest, CompletionResponse};

/// A scripted reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Successful completion with this text
    Text(String),
    /// Non-success HTTP status with this body
    Status(u16, String),
}

/// A mock completion model for testing purposes.
///
/// Returns scripted replies in order; once the script is exhausted every call
/// returns an empty text. All requests are recorded.
#[derive(Debug, Clone, Default)]
pub struct MockCompletionModel {
    replies: Arc<Mutex<VecDeque<MockReply>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl MockCompletionModel {
    /// Creates a new mock model with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock model that will return the given replies in order.
    pub fn with_replies(replies: impl IntoIterator<Item = MockReply>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            requests: Arc::default(),
        }
    }

    /// Appends a text reply to the script.
    pub async fn push_text(&self, text: &str) {
        self.replies
            .lock()
            .await
            .push_back(MockReply::Text(text.to_string()));
    }

    /// Appends an HTTP failure to the script.
    pub async fn push_status(&self, status_code: u16, body: &str) {
        self.replies
            .lock()
            .await
            .push_back(MockReply::Status(status_code, body.to_string()));
    }

    /// Requests received so far.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

impl CompletionModel for MockCompletionModel {
    async fn completion(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, CompletionError> {
        self.requests.lock().await.push(request);
        let reply = self.replies.lock().await.pop_front();
        match reply {
            Some(MockReply::Text(text)) => Ok(CompletionResponse { text, usage: None }),
            Some(MockReply::Status(status_code, message)) => Err(CompletionError::Api {
                status_code,
                message,
            }),
            None => Ok(CompletionResponse {
                text: String::new(),
                usage: None,
            }),
        }
    }
}
