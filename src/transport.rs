use async_trait::async_trait;
use reqwest::Client;

use crate::error::{NavigatorError, Result};
use crate::models::{
    ApiErrorEnvelope, CreateMessageRequest, CreateRunRequest, ListEnvelope, MessageObject,
    RunObject, RunStatus, ThreadObject,
};

const ASSISTANTS_BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// Client-side view of the hosted assistant backend: threads, runs, messages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssistantApi: Send + Sync {
    /// Create a fresh conversation thread, returning its remote id
    async fn create_thread(&self) -> Result<String>;

    /// List the generation runs associated with a thread
    async fn list_runs(&self, thread_id: &str) -> Result<Vec<RunObject>>;

    /// Append a message to a thread. Fails with `NavigatorError::ActiveRun`
    /// when the backend rejects the append because a run is in flight.
    async fn create_message(&self, thread_id: &str, role: &str, content: &str) -> Result<()>;

    /// Start a generation run against the given assistant, returning the run id
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<String>;

    /// Current status of one run
    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<RunStatus>;

    /// Messages on the thread, in the order the backend returns them
    async fn list_messages(&self, thread_id: &str) -> Result<Vec<MessageObject>>;
}

/// reqwest-backed implementation against the OpenAI Assistants v2 REST API
pub struct OpenAiTransport {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiTransport {
    pub fn new(api_key: String, base_url: String) -> Result<Self> {
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header(ASSISTANTS_BETA_HEADER.0, ASSISTANTS_BETA_HEADER.1)
    }

    fn parse_error_message(body: &str) -> String {
        serde_json::from_str::<ApiErrorEnvelope>(body)
            .map(|e| e.error.message)
            .unwrap_or_else(|_| body.to_string())
    }

    /// Classify a non-success response body for a thread-scoped call
    fn classify_api_error(thread_id: &str, status: u16, body: &str) -> NavigatorError {
        let message = Self::parse_error_message(body);
        if message.contains("while a run") && message.contains("is active") {
            NavigatorError::ActiveRun {
                thread_id: thread_id.to_string(),
            }
        } else {
            NavigatorError::Api { status, message }
        }
    }

    /// Errors from thread creation: there is no thread yet, so an
    /// active-run conflict is impossible and no conflict sniffing applies
    fn creation_error(status: u16, body: &str) -> NavigatorError {
        NavigatorError::Api {
            status,
            message: Self::parse_error_message(body),
        }
    }

    async fn api_error(thread_id: &str, response: reqwest::Response) -> NavigatorError {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        Self::classify_api_error(thread_id, status, &body)
    }
}

#[async_trait]
impl AssistantApi for OpenAiTransport {
    async fn create_thread(&self) -> Result<String> {
        let response = self
            .request(self.client.post(self.url("/threads")))
            .json(&serde_json::json!({}))
            .send()
            .await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(Self::creation_error(status, &body));
        }
        let thread: ThreadObject = response.json().await?;
        tracing::debug!(thread_id = %thread.id, "Created assistant thread");
        Ok(thread.id)
    }

    async fn list_runs(&self, thread_id: &str) -> Result<Vec<RunObject>> {
        let response = self
            .request(
                self.client
                    .get(self.url(&format!("/threads/{thread_id}/runs"))),
            )
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::api_error(thread_id, response).await);
        }
        let runs: ListEnvelope<RunObject> = response.json().await?;
        Ok(runs.data)
    }

    async fn create_message(&self, thread_id: &str, role: &str, content: &str) -> Result<()> {
        let body = CreateMessageRequest {
            role: role.to_string(),
            content: content.to_string(),
        };
        let response = self
            .request(
                self.client
                    .post(self.url(&format!("/threads/{thread_id}/messages"))),
            )
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::api_error(thread_id, response).await);
        }
        Ok(())
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<String> {
        let body = CreateRunRequest {
            assistant_id: assistant_id.to_string(),
        };
        let response = self
            .request(
                self.client
                    .post(self.url(&format!("/threads/{thread_id}/runs"))),
            )
            .json(&body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::api_error(thread_id, response).await);
        }
        let run: RunObject = response.json().await?;
        tracing::debug!(thread_id = %thread_id, run_id = %run.id, "Started generation run");
        Ok(run.id)
    }

    async fn get_run(&self, thread_id: &str, run_id: &str) -> Result<RunStatus> {
        let response = self
            .request(
                self.client
                    .get(self.url(&format!("/threads/{thread_id}/runs/{run_id}"))),
            )
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::api_error(thread_id, response).await);
        }
        let run: RunObject = response.json().await?;
        Ok(run.status)
    }

    async fn list_messages(&self, thread_id: &str) -> Result<Vec<MessageObject>> {
        let response = self
            .request(
                self.client
                    .get(self.url(&format!("/threads/{thread_id}/messages"))),
            )
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(Self::api_error(thread_id, response).await);
        }
        let messages: ListEnvelope<MessageObject> = response.json().await?;
        Ok(messages.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFLICT_BODY: &str = r#"{"error": {"message": "Can't add messages to thread_abc while a run run_1 is active.", "type": "invalid_request_error"}}"#;

    #[test]
    fn conflict_body_classifies_as_active_run() {
        let err = OpenAiTransport::classify_api_error("thread_abc", 400, CONFLICT_BODY);
        match err {
            NavigatorError::ActiveRun { thread_id } => assert_eq!(thread_id, "thread_abc"),
            other => panic!("expected ActiveRun, got {other:?}"),
        }
    }

    #[test]
    fn plain_failure_classifies_as_api_error() {
        let err = OpenAiTransport::classify_api_error(
            "thread_abc",
            500,
            r#"{"error": {"message": "server exploded", "type": "server_error"}}"#,
        );
        match err {
            NavigatorError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "server exploded");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn unparseable_body_is_kept_verbatim() {
        let err = OpenAiTransport::classify_api_error("thread_abc", 502, "Bad Gateway");
        match err {
            NavigatorError::Api { status, message } => {
                assert_eq!(status, 502);
                assert_eq!(message, "Bad Gateway");
            }
            other => panic!("expected Api, got {other:?}"),
        }
    }

    #[test]
    fn thread_creation_failure_maps_to_api_error() {
        // Even a conflict-shaped body must not map to ActiveRun here: there
        // is no thread id to attach and nothing for the caller to wait on
        let err = OpenAiTransport::creation_error(400, CONFLICT_BODY);
        assert!(matches!(err, NavigatorError::Api { status: 400, .. }));
    }

    #[test]
    fn base_url_trailing_slash_is_normalized() {
        let transport =
            OpenAiTransport::new("sk-test".to_string(), "https://api.openai.com/v1/".to_string())
                .unwrap();
        assert_eq!(
            transport.url("/threads/t_1/runs"),
            "https://api.openai.com/v1/threads/t_1/runs"
        );
    }
}
