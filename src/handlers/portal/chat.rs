use crate::chatbot::{self, ChatMessage, ChatReply};
use crate::error::Result;
use crate::extractors::Json;

/// Keyword-matched support answers. Stateless, so nothing is audited.
pub async fn chat(Json(input): Json<ChatMessage>) -> Result<Json<ChatReply>> {
    input.validate()?;
    Ok(Json(chatbot::reply_to(&input.message)))
}
