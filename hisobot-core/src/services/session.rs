//! Session store - one typed `ChatSession` per chat id
//!
//! Sessions are created lazily on first interaction and never expire;
//! `/start` and the reset flow clear the pending state explicitly.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::{ChatSession, Lang, PendingState};

#[derive(Clone, Default)]
pub struct SessionService {
    sessions: Arc<Mutex<HashMap<String, ChatSession>>>,
}

impl SessionService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self, chat_id: &str) -> ChatSession {
        self.sessions
            .lock()
            .expect("session lock poisoned")
            .entry(chat_id.to_string())
            .or_insert_with(|| ChatSession::new(chat_id))
            .clone()
    }

    /// Replace the chat's pending state (never stacked)
    pub fn set_pending(&self, chat_id: &str, pending: PendingState) {
        let mut sessions = self.sessions.lock().expect("session lock poisoned");
        sessions
            .entry(chat_id.to_string())
            .or_insert_with(|| ChatSession::new(chat_id))
            .pending = Some(pending);
    }

    pub fn clear_pending(&self, chat_id: &str) {
        let mut sessions = self.sessions.lock().expect("session lock poisoned");
        if let Some(session) = sessions.get_mut(chat_id) {
            session.pending = None;
        }
    }

    pub fn lang(&self, chat_id: &str) -> Lang {
        self.session(chat_id).lang
    }

    pub fn set_lang(&self, chat_id: &str, lang: Lang) {
        let mut sessions = self.sessions.lock().expect("session lock poisoned");
        sessions
            .entry(chat_id.to_string())
            .or_insert_with(|| ChatSession::new(chat_id))
            .lang = lang;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_replaces_not_stacks() {
        let svc = SessionService::new();
        svc.set_pending("1", PendingState::GoalName);
        svc.set_pending("1", PendingState::NewCategoryName);

        match svc.session("1").pending {
            Some(PendingState::NewCategoryName) => {}
            other => panic!("unexpected: {other:?}"),
        }
        svc.clear_pending("1");
        assert!(svc.session("1").pending.is_none());
    }

    #[test]
    fn test_sessions_are_per_chat() {
        let svc = SessionService::new();
        svc.set_pending("1", PendingState::GoalName);
        assert!(svc.session("2").pending.is_none());
        svc.set_lang("2", Lang::Uz);
        assert_eq!(svc.lang("2"), Lang::Uz);
        assert_eq!(svc.lang("1"), Lang::Ru);
    }
}
