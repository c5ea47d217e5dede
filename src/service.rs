use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::models::{AnonymousPost, Outcome, QueryContext, QueryType, Sentiment};
use crate::orchestrator::Orchestrator;
use crate::repository_traits::PostRepository;
use crate::sentiment;
use crate::threads::ThreadRegistry;
use crate::transport::{AssistantApi, OpenAiTransport};

/// Main service facade for the Cultural Navigator
pub struct NavigatorService<R: PostRepository> {
    orchestrator: Orchestrator,
    registry: Arc<ThreadRegistry>,
    repository: Arc<R>,
}

impl<R: PostRepository> NavigatorService<R> {
    /// Create a service instance talking to the real assistant backend
    pub fn new(config: &Config, repository: Arc<R>) -> Result<Self> {
        let transport: Arc<dyn AssistantApi> = Arc::new(OpenAiTransport::new(
            config.assistant.api_key.clone(),
            config.assistant.base_url.clone(),
        )?);
        Ok(Self::with_transport(config, transport, repository))
    }

    /// Create a service instance over an arbitrary transport (used by tests)
    pub fn with_transport(
        config: &Config,
        transport: Arc<dyn AssistantApi>,
        repository: Arc<R>,
    ) -> Self {
        let registry = Arc::new(ThreadRegistry::new(transport.clone()));
        let orchestrator = Orchestrator::new(
            transport,
            registry.clone(),
            config.assistant.assistant_id.clone(),
            config.poll_interval(),
            config.polling.max_attempts,
        );
        tracing::info!(
            assistant_id = %config.assistant.assistant_id,
            poll_interval_ms = config.polling.interval_ms,
            max_poll_attempts = config.polling.max_attempts,
            "NavigatorService initialized"
        );
        Self {
            orchestrator,
            registry,
            repository,
        }
    }

    /// Run one generation attempt for a session. Total: every failure mode
    /// is an `Outcome` variant.
    pub async fn chat(
        &self,
        session_id: &str,
        text: &str,
        query_type: QueryType,
        context: Option<&QueryContext>,
    ) -> Outcome {
        let outcome = self
            .orchestrator
            .generate(session_id, text, query_type, context)
            .await;
        if query_type == QueryType::EmotionSupport && !outcome.is_waiting() {
            // Best-effort log of the observed emotional state, one entry per
            // accepted query: a Waiting outcome means the utterance was not
            // taken, and the user's retry will log it. Never blocks or fails
            // the conversation.
            let label = emotion_label(sentiment::score(text).polarity);
            if let Err(e) = self.repository.record_emotion(session_id, label).await {
                tracing::warn!(session = %session_id, error = %e, "Failed to record emotional state");
            }
        }
        outcome
    }

    /// Pure sentiment signal for a piece of text
    pub fn score_sentiment(&self, text: &str) -> Sentiment {
        sentiment::score(text)
    }

    /// Persist an anonymous post, scored at save time
    pub async fn share_post(&self, content: &str, category: &str) -> Result<AnonymousPost> {
        let polarity = sentiment::score(content).polarity;
        self.repository.save_post(content, category, polarity).await
    }

    /// All anonymous posts, newest first
    pub async fn list_posts(&self) -> Result<Vec<AnonymousPost>> {
        self.repository.list_posts().await
    }

    /// Drop the session's conversation thread; the next chat starts fresh
    pub fn clear_history(&self, session_id: &str) {
        self.registry.clear(session_id);
    }
}

fn emotion_label(polarity: f64) -> &'static str {
    if polarity >= 0.25 {
        "positive"
    } else if polarity <= -0.25 {
        "distressed"
    } else {
        "neutral"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageContent, MessageObject, MessageRole, RunStatus, TextValue};
    use crate::repository_traits::MockPostRepository;
    use crate::transport::MockAssistantApi;

    fn test_config() -> Config {
        let mut config = Config::default();
        config.assistant.assistant_id = "asst_test".to_string();
        config.polling.interval_ms = 1;
        config.polling.max_attempts = 5;
        config
    }

    fn reply_transport(reply: &'static str) -> MockAssistantApi {
        let mut transport = MockAssistantApi::new();
        transport
            .expect_create_thread()
            .returning(|| Ok("thread_1".to_string()));
        transport.expect_list_runs().returning(|_| Ok(vec![]));
        transport
            .expect_create_message()
            .returning(|_, _, _| Ok(()));
        transport
            .expect_create_run()
            .returning(|_, _| Ok("run_1".to_string()));
        transport
            .expect_get_run()
            .returning(|_, _| Ok(RunStatus::Completed));
        transport.expect_list_messages().returning(move |_| {
            Ok(vec![MessageObject {
                id: "msg_1".to_string(),
                role: MessageRole::Assistant,
                created_at: 100,
                content: vec![MessageContent::Text {
                    text: TextValue {
                        value: reply.to_string(),
                    },
                }],
            }])
        });
        transport
    }

    #[tokio::test]
    async fn chat_returns_assistant_reply() {
        let config = test_config();
        let mut repository = MockPostRepository::new();
        repository.expect_record_emotion().times(0);
        let service = NavigatorService::with_transport(
            &config,
            Arc::new(reply_transport("welcome!")),
            Arc::new(repository),
        );

        let outcome = service
            .chat("session_a", "library hours?", QueryType::CulturalAdvice, None)
            .await;
        assert_eq!(outcome, Outcome::Reply("welcome!".to_string()));
    }

    #[tokio::test]
    async fn emotion_support_chat_records_emotional_state() {
        let config = test_config();
        let mut repository = MockPostRepository::new();
        repository
            .expect_record_emotion()
            .times(1)
            .withf(|session, label| session == "session_a" && label == "distressed")
            .returning(|_, _| Ok(()));
        let service = NavigatorService::with_transport(
            &config,
            Arc::new(reply_transport("it gets easier")),
            Arc::new(repository),
        );

        let outcome = service
            .chat("session_a", "I hate it here", QueryType::EmotionSupport, None)
            .await;
        assert_eq!(outcome, Outcome::Reply("it gets easier".to_string()));
    }

    #[tokio::test]
    async fn waiting_outcome_is_not_logged_as_emotional_state() {
        let config = test_config();
        let mut transport = MockAssistantApi::new();
        transport
            .expect_create_thread()
            .returning(|| Ok("thread_1".to_string()));
        transport.expect_list_runs().returning(|_| {
            Ok(vec![crate::models::RunObject {
                id: "run_0".to_string(),
                status: RunStatus::InProgress,
            }])
        });
        transport.expect_create_message().times(0);
        transport.expect_create_run().times(0);

        let mut repository = MockPostRepository::new();
        // The utterance was not accepted; the retry will log it instead
        repository.expect_record_emotion().times(0);
        let service = NavigatorService::with_transport(
            &config,
            Arc::new(transport),
            Arc::new(repository),
        );

        let outcome = service
            .chat("session_a", "I hate it here", QueryType::EmotionSupport, None)
            .await;
        assert_eq!(outcome, Outcome::Waiting);
    }

    #[tokio::test]
    async fn emotion_log_failure_does_not_break_chat() {
        let config = test_config();
        let mut repository = MockPostRepository::new();
        repository.expect_record_emotion().returning(|_, _| {
            Err(crate::error::NavigatorError::Internal("redis down".to_string()))
        });
        let service = NavigatorService::with_transport(
            &config,
            Arc::new(reply_transport("still here")),
            Arc::new(repository),
        );

        let outcome = service
            .chat("session_a", "feeling lonely", QueryType::EmotionSupport, None)
            .await;
        assert_eq!(outcome, Outcome::Reply("still here".to_string()));
    }

    #[tokio::test]
    async fn share_post_scores_and_saves() {
        let config = test_config();
        let mut repository = MockPostRepository::new();
        repository
            .expect_save_post()
            .times(1)
            .withf(|content, category, polarity| {
                content == "I love it here" && category == "culture" && *polarity > 0.0
            })
            .returning(|content, category, polarity| {
                Ok(AnonymousPost::new(
                    content.to_string(),
                    category.to_string(),
                    polarity,
                ))
            });
        let service = NavigatorService::with_transport(
            &config,
            Arc::new(MockAssistantApi::new()),
            Arc::new(repository),
        );

        let post = service.share_post("I love it here", "culture").await.unwrap();
        assert_eq!(post.content, "I love it here");
        assert!(post.sentiment_score > 0.0);
    }

    #[tokio::test]
    async fn clear_history_gives_fresh_thread() {
        let config = test_config();
        let mut transport = MockAssistantApi::new();
        let mut n = 0;
        transport.expect_create_thread().times(2).returning(move || {
            n += 1;
            Ok(format!("thread_{n}"))
        });
        transport.expect_list_runs().returning(|_| Ok(vec![]));
        transport
            .expect_create_message()
            .returning(|_, _, _| Ok(()));
        transport
            .expect_create_run()
            .returning(|_, _| Ok("run_1".to_string()));
        transport
            .expect_get_run()
            .returning(|_, _| Ok(RunStatus::Completed));
        transport.expect_list_messages().returning(|_| {
            Ok(vec![MessageObject {
                id: "msg_1".to_string(),
                role: MessageRole::Assistant,
                created_at: 100,
                content: vec![MessageContent::Text {
                    text: TextValue {
                        value: "hi".to_string(),
                    },
                }],
            }])
        });

        let repository = MockPostRepository::new();
        let service = NavigatorService::with_transport(
            &config,
            Arc::new(transport),
            Arc::new(repository),
        );

        let _ = service.chat("session_a", "one", QueryType::Other, None).await;
        service.clear_history("session_a");
        let _ = service.chat("session_a", "two", QueryType::Other, None).await;
        // create_thread expectation of exactly two calls is verified on drop
    }

    #[test]
    fn emotion_labels() {
        assert_eq!(emotion_label(0.8), "positive");
        assert_eq!(emotion_label(0.0), "neutral");
        assert_eq!(emotion_label(-0.6), "distressed");
    }
}
