use crate::models::{QueryContext, QueryType};
use crate::sentiment;

/// Compose the full prompt submitted to the assistant for one user query.
///
/// Pure: same inputs always produce the same prompt. The emotion-support
/// branch embeds the sentiment scorer's polarity as advisory context, which
/// keeps determinism since the scorer itself is pure.
pub fn build(raw_text: &str, query_type: QueryType, context: Option<&QueryContext>) -> String {
    match query_type {
        QueryType::CulturalAdvice => {
            let ctx = context.cloned().unwrap_or_default();
            format!(
                "As a cultural advisor, please provide detailed advice and explanation \
                 for the following situation: {raw_text}\nUser background:\n{}",
                ctx.render()
            )
        }
        QueryType::EmotionSupport => {
            let emotion = sentiment::score(raw_text);
            format!(
                "Considering the user's emotional state (sentiment polarity: {:.2}), \
                 please offer gentle support and suggestions: {raw_text}",
                emotion.polarity
            )
        }
        QueryType::AnonymousSharing => {
            format!(
                "Regarding this anonymous share: {raw_text}\nPlease respond with \
                 understanding and support, staying mindful of cultural sensitivity."
            )
        }
        QueryType::Other => raw_text.to_string(),
    }
}
