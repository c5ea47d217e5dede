use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Which conversational mode a query belongs to. Drives prompt augmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    CulturalAdvice,
    EmotionSupport,
    AnonymousSharing,
    Other,
}

/// Background the UI holds for the current user, re-sent with every call.
/// Rendered verbatim into cultural-advice prompts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryContext {
    pub situation_type: Option<String>,
    pub current_status: Option<String>,
    pub emotional_state: Option<String>,
}

impl QueryContext {
    /// Render the context block appended to cultural-advice prompts.
    pub fn render(&self) -> String {
        format!(
            "Situation type: {}\nCurrent status: {}\nEmotional state: {}",
            self.situation_type.as_deref().unwrap_or("unspecified"),
            self.current_status.as_deref().unwrap_or("unspecified"),
            self.emotional_state.as_deref().unwrap_or("unspecified"),
        )
    }
}

/// Lightweight emotion signal produced by the sentiment scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    /// Negative to positive valence, in [-1, 1]
    pub polarity: f64,
    /// Objective to subjective, in [0, 1]
    pub subjectivity: f64,
}

/// Anonymous post stored in Redis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnonymousPost {
    pub id: String,
    pub content: String,
    pub category: String,
    pub sentiment_score: f64,
    pub timestamp: String,
}

impl AnonymousPost {
    /// Create a new post with generated ID and timestamp
    pub fn new(content: String, category: String, sentiment_score: f64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content,
            category,
            sentiment_score,
            timestamp: Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        }
    }
}

/// Terminal result of one generation attempt.
///
/// Every failure mode of `Orchestrator::generate` is encoded here; the HTTP
/// layer decides how each variant reads to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Assistant produced a reply
    Reply(String),
    /// A run is still active on this session's thread; nothing was submitted
    Waiting,
    /// The remote run finished in the `failed` state
    Failed,
    /// The run did not resolve within the configured polling budget
    TimedOut,
    /// Run completed but no assistant message was found on the thread
    NoReply,
    /// Unclassified failure, with the underlying detail
    Error(String),
}

impl Outcome {
    pub fn is_waiting(&self) -> bool {
        matches!(self, Outcome::Waiting)
    }
}

// ----- Assistants API wire format -----

#[derive(Debug, Deserialize)]
pub struct ThreadObject {
    pub id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Active means the backend will reject a new message or run on the thread.
    /// `requires_action` counts as active; tool calls are not handled here.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            RunStatus::Queued | RunStatus::InProgress | RunStatus::RequiresAction
        )
    }
}

#[derive(Debug, Deserialize)]
pub struct RunObject {
    pub id: String,
    pub status: RunStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct MessageObject {
    pub id: String,
    pub role: MessageRole,
    /// Unix seconds; ties broken by list order
    pub created_at: i64,
    pub content: Vec<MessageContent>,
}

impl MessageObject {
    /// First text block of the message, if any
    pub fn text(&self) -> Option<&str> {
        self.content.iter().find_map(|c| match c {
            MessageContent::Text { text } => Some(text.value.as_str()),
            MessageContent::Other => None,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text { text: TextValue },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub struct TextValue {
    pub value: String,
}

/// Paged list envelope shared by the runs and messages endpoints
#[derive(Debug, Deserialize)]
pub struct ListEnvelope<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Serialize)]
pub struct CreateMessageRequest {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct CreateRunRequest {
    pub assistant_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub message: String,
}
