use async_trait::async_trait;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::Result;
use crate::models::AnonymousPost;
use crate::redis::RedisManager;
use crate::repository_traits::PostRepository;

#[derive(Debug, Serialize, Deserialize)]
struct EmotionEntry {
    emotion: String,
    timestamp: String,
}

/// Redis implementation of PostRepository
///
/// Posts live in one list per namespace, pushed from the left so a plain
/// range read comes back newest first.
pub struct RedisPostRepository {
    redis: Arc<RedisManager>,
    namespace: String,
}

impl RedisPostRepository {
    pub fn new(redis: Arc<RedisManager>, namespace: String) -> Self {
        Self { redis, namespace }
    }

    fn posts_key(&self) -> String {
        format!("{}:anonymous_posts", self.namespace)
    }

    fn emotions_key(&self, session_id: &str) -> String {
        format!("{}:emotions:{}", self.namespace, session_id)
    }
}

#[async_trait]
impl PostRepository for RedisPostRepository {
    async fn save_post(
        &self,
        content: &str,
        category: &str,
        sentiment_score: f64,
    ) -> Result<AnonymousPost> {
        let post = AnonymousPost::new(content.to_string(), category.to_string(), sentiment_score);
        let payload = serde_json::to_string(&post)?;

        let mut conn = self.redis.get_connection().await?;
        conn.lpush::<_, _, ()>(self.posts_key(), payload).await?;

        tracing::debug!(post_id = %post.id, category = %post.category, "Saved anonymous post");
        Ok(post)
    }

    async fn list_posts(&self) -> Result<Vec<AnonymousPost>> {
        let mut conn = self.redis.get_connection().await?;
        let raw: Vec<String> = conn.lrange(self.posts_key(), 0, -1).await?;

        let mut posts = Vec::with_capacity(raw.len());
        for payload in raw {
            match serde_json::from_str::<AnonymousPost>(&payload) {
                Ok(post) => posts.push(post),
                Err(e) => {
                    // One corrupt entry must not hide the rest
                    tracing::warn!(error = %e, "Skipping unparseable anonymous post");
                }
            }
        }
        Ok(posts)
    }

    async fn record_emotion(&self, session_id: &str, emotion: &str) -> Result<()> {
        let entry = EmotionEntry {
            emotion: emotion.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        };
        let payload = serde_json::to_string(&entry)?;

        let mut conn = self.redis.get_connection().await?;
        conn.lpush::<_, _, ()>(self.emotions_key(session_id), payload)
            .await?;
        Ok(())
    }
}
