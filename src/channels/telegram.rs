//! Telegram channel — long-polls the Bot API for updates.
//!
//! Native Bot API implementation over reqwest; no SDK crate. Outbound
//! messages go HTML-first with a plain-text fallback, and the handoff
//! reply carries a single inline URL button.

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingReply};
use crate::error::ChannelError;

use async_trait::async_trait;

/// Maximum message length for Telegram's sendMessage API.
const TELEGRAM_MAX_MESSAGE_LENGTH: usize = 4096;

/// Telegram channel — connects to the Bot API via long-polling.
pub struct TelegramChannel {
    bot_token: String,
    client: reqwest::Client,
}

impl TelegramChannel {
    pub fn new(bot_token: String) -> Self {
        Self {
            bot_token,
            client: reqwest::Client::new(),
        }
    }

    fn api_url(&self, method: &str) -> String {
        format!("https://api.telegram.org/bot{}/{method}", self.bot_token)
    }

    /// Send a text message, splitting at Telegram's 4096 char limit.
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        button: Option<&crate::channels::InlineButton>,
    ) -> Result<(), ChannelError> {
        let chunks = split_message(text, TELEGRAM_MAX_MESSAGE_LENGTH);
        let last = chunks.len() - 1;

        for (i, chunk) in chunks.iter().enumerate() {
            // The button, if any, goes on the final chunk.
            let chunk_button = if i == last { button } else { None };
            self.send_message_chunk(chat_id, chunk, chunk_button).await?;
        }
        Ok(())
    }

    /// Send a single chunk (≤4096 chars), HTML-first with plain fallback.
    async fn send_message_chunk(
        &self,
        chat_id: &str,
        text: &str,
        button: Option<&crate::channels::InlineButton>,
    ) -> Result<(), ChannelError> {
        let mut html_body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML"
        });
        if let Some(btn) = button {
            html_body["reply_markup"] = button_markup(btn);
        }

        let html_resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&html_body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if html_resp.status().is_success() {
            return Ok(());
        }

        let html_status = html_resp.status();
        let _html_err = html_resp.text().await.unwrap_or_default();
        tracing::warn!(
            status = ?html_status,
            "Telegram sendMessage with HTML failed; retrying without parse_mode"
        );

        // Retry without parse_mode
        let mut plain_body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        if let Some(btn) = button {
            plain_body["reply_markup"] = button_markup(btn);
        }
        let plain_resp = self
            .client
            .post(self.api_url("sendMessage"))
            .json(&plain_body)
            .send()
            .await
            .map_err(|e| ChannelError::SendFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if !plain_resp.status().is_success() {
            let plain_err = plain_resp.text().await.unwrap_or_default();
            return Err(ChannelError::SendFailed {
                name: "telegram".into(),
                reason: format!(
                    "sendMessage failed (html: {}, plain: {})",
                    html_status, plain_err
                ),
            });
        }

        Ok(())
    }
}

// ── Channel trait implementation ────────────────────────────────────

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let bot_token = self.bot_token.clone();
        let client = self.client.clone();

        tokio::spawn(async move {
            let mut offset: i64 = 0;

            tracing::info!("Telegram channel listening for messages...");

            loop {
                let url = format!("https://api.telegram.org/bot{}/getUpdates", bot_token);
                let body = serde_json::json!({
                    "offset": offset,
                    "timeout": 30,
                    "allowed_updates": ["message"]
                });

                let resp = match client.post(&url).json(&body).send().await {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!("Telegram poll error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                let data: serde_json::Value = match resp.json().await {
                    Ok(d) => d,
                    Err(e) => {
                        tracing::warn!("Telegram parse error: {e}");
                        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
                        continue;
                    }
                };

                if let Some(results) = data.get("result").and_then(serde_json::Value::as_array) {
                    for update in results {
                        // Advance offset past this update
                        if let Some(uid) =
                            update.get("update_id").and_then(serde_json::Value::as_i64)
                        {
                            offset = uid + 1;
                        }

                        let Some(message) = update.get("message") else {
                            continue;
                        };

                        let Some(incoming) = parse_update_message(message) else {
                            continue;
                        };

                        if tx.send(incoming).is_err() {
                            tracing::info!("Telegram listener channel closed");
                            return;
                        }
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        msg: &IncomingMessage,
        reply: OutgoingReply,
    ) -> Result<(), ChannelError> {
        self.send_message(&msg.chat_id, &reply.text, reply.button.as_ref())
            .await
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        let resp = self
            .client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: e.to_string(),
            })?;

        if resp.status().is_success() {
            Ok(())
        } else {
            Err(ChannelError::StartupFailed {
                name: "telegram".into(),
                reason: format!("getMe returned {}", resp.status()),
            })
        }
    }

    async fn shutdown(&self) -> Result<(), ChannelError> {
        tracing::info!("Telegram channel shutting down");
        Ok(())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Build the `reply_markup` JSON for a single inline URL button.
fn button_markup(button: &crate::channels::InlineButton) -> serde_json::Value {
    serde_json::json!({
        "inline_keyboard": [[
            { "text": button.label, "url": button.url }
        ]]
    })
}

/// Extract an [`IncomingMessage`] from a `getUpdates` message object.
///
/// Returns `None` for non-text messages or messages with no sender id.
fn parse_update_message(message: &serde_json::Value) -> Option<IncomingMessage> {
    let text = message.get("text").and_then(serde_json::Value::as_str)?;

    let from = message.get("from")?;
    let user_id = from.get("id").and_then(serde_json::Value::as_i64)?;
    let username = from
        .get("username")
        .and_then(serde_json::Value::as_str)
        .map(String::from);

    let chat_id = message
        .get("chat")
        .and_then(|c| c.get("id"))
        .and_then(serde_json::Value::as_i64)?
        .to_string();

    Some(IncomingMessage {
        channel: "telegram",
        chat_id,
        user_id,
        username,
        text: text.to_string(),
    })
}

/// Split a message into chunks that fit Telegram's character limit.
/// Tries to split on newlines, then spaces, then hard-cuts.
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = text;

    while !remaining.is_empty() {
        if remaining.len() <= max_len {
            chunks.push(remaining.to_string());
            break;
        }

        // Clamp the cut to a char boundary before slicing
        let mut cut = max_len;
        while cut > 0 && !remaining.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            // max_len is narrower than the first char; take it whole
            cut = remaining.chars().next().map_or(remaining.len(), char::len_utf8);
        }

        // Find a good split point
        let chunk = &remaining[..cut];
        let split_at = chunk
            .rfind('\n')
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(cut);

        // Don't split at position 0 (infinite loop guard)
        let split_at = if split_at == 0 { cut } else { split_at };

        chunks.push(remaining[..split_at].to_string());
        remaining = remaining[split_at..].trim_start();
    }

    chunks
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channels::InlineButton;

    #[test]
    fn telegram_channel_name() {
        let ch = TelegramChannel::new("fake-token".into());
        assert_eq!(ch.name(), "telegram");
    }

    #[test]
    fn telegram_api_url() {
        let ch = TelegramChannel::new("123:ABC".into());
        assert_eq!(
            ch.api_url("sendMessage"),
            "https://api.telegram.org/bot123:ABC/sendMessage"
        );
    }

    // ── Update parsing ──────────────────────────────────────────────

    #[test]
    fn parse_update_extracts_all_fields() {
        let message = serde_json::json!({
            "text": "/start",
            "from": { "id": 42, "username": "jon_doe", "first_name": "Jon" },
            "chat": { "id": 4242 }
        });
        let incoming = parse_update_message(&message).unwrap();
        assert_eq!(incoming.user_id, 42);
        assert_eq!(incoming.chat_id, "4242");
        assert_eq!(incoming.username.as_deref(), Some("jon_doe"));
        assert_eq!(incoming.text, "/start");
    }

    #[test]
    fn parse_update_without_username() {
        let message = serde_json::json!({
            "text": "Oslo, 30",
            "from": { "id": 7 },
            "chat": { "id": 7 }
        });
        let incoming = parse_update_message(&message).unwrap();
        assert_eq!(incoming.username, None);
    }

    #[test]
    fn parse_update_skips_non_text() {
        let message = serde_json::json!({
            "sticker": { "file_id": "abc" },
            "from": { "id": 7 },
            "chat": { "id": 7 }
        });
        assert!(parse_update_message(&message).is_none());
    }

    #[test]
    fn parse_update_skips_missing_sender() {
        let message = serde_json::json!({
            "text": "hello",
            "chat": { "id": 7 }
        });
        assert!(parse_update_message(&message).is_none());
    }

    // ── Button markup ───────────────────────────────────────────────

    #[test]
    fn button_markup_is_single_url_button() {
        let markup = button_markup(&InlineButton {
            label: "💬 Message the manager".into(),
            url: "https://t.me/manager".into(),
        });
        assert_eq!(
            markup,
            serde_json::json!({
                "inline_keyboard": [[
                    { "text": "💬 Message the manager", "url": "https://t.me/manager" }
                ]]
            })
        );
    }

    // ── Message splitting ───────────────────────────────────────────

    #[test]
    fn split_message_short() {
        let chunks = split_message("Hello", 4096);
        assert_eq!(chunks, vec!["Hello"]);
    }

    #[test]
    fn split_message_exact_limit() {
        let msg = "a".repeat(4096);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].len(), 4096);
    }

    #[test]
    fn split_message_over_limit_on_newline() {
        let msg = format!("{}\n{}", "a".repeat(2000), "b".repeat(3000));
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0], "a".repeat(2000));
        assert_eq!(chunks[1], "b".repeat(3000));
    }

    #[test]
    fn split_message_no_good_split_point() {
        let msg = "a".repeat(5000);
        let chunks = split_message(&msg, 4096);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].len(), 4096);
        assert_eq!(chunks[1].len(), 904);
    }

    #[test]
    fn split_message_multibyte_never_cuts_a_char() {
        // 3000 two-byte chars = 6000 bytes, over the limit with no spaces.
        let msg = "я".repeat(3000);
        let chunks = split_message(&msg, 4096);
        assert!(chunks.len() >= 2);
        for chunk in &chunks {
            assert!(chunk.len() <= 4096);
            assert!(chunk.chars().all(|c| c == 'я'));
        }
        assert_eq!(chunks.concat(), msg);
    }

    #[test]
    fn split_message_clamps_cut_to_char_boundary() {
        // 5 bytes falls mid-char for two-byte α's; the cut backs up to 4.
        let chunks = split_message("ααα", 5);
        assert_eq!(chunks, vec!["αα", "α"]);
    }
}
