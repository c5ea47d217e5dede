use crate::error::Result;
use crate::models::AnonymousPost;
use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

/// Storage for anonymous posts and the emotional-state log.
///
/// Deliberately a plain append/read store - none of the conversation state
/// machine leaks in here.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PostRepository: Send + Sync + 'static {
    /// Persist an anonymous post, returning the stored record
    async fn save_post(
        &self,
        content: &str,
        category: &str,
        sentiment_score: f64,
    ) -> Result<AnonymousPost>;

    /// All posts, newest first
    async fn list_posts(&self) -> Result<Vec<AnonymousPost>>;

    /// Append one observation to the per-session emotional-state log
    async fn record_emotion(&self, session_id: &str, emotion: &str) -> Result<()>;
}
