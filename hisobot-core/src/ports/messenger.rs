//! Outbound messenger port
//!
//! Transport delivery mechanics are out of scope; the core only ever
//! needs to push a text message at a chat.

use crate::domain::result::Result;

pub trait Messenger: Send + Sync {
    fn send_text(&self, chat_id: &str, text: &str) -> Result<()>;
}
