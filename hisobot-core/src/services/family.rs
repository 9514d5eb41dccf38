//! Family sharing - membership, invite codes and authorization scope

use std::sync::Arc;

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::domain::result::{Error, Result};
use crate::domain::FamilyMember;
use crate::ports::LedgerStore;

#[derive(Clone)]
pub struct FamilyService {
    store: Arc<dyn LedgerStore>,
    owner_chat_id: String,
}

impl FamilyService {
    pub fn new(store: Arc<dyn LedgerStore>, owner_chat_id: String) -> Self {
        Self {
            store,
            owner_chat_id,
        }
    }

    /// Only the configured owner chat or a recognized family member may
    /// use the ledgers; everyone else is limited to onboarding.
    pub fn is_authorized(&self, chat_id: &str) -> Result<bool> {
        if chat_id == self.owner_chat_id {
            return Ok(true);
        }
        Ok(self.membership(chat_id)?.is_some())
    }

    /// `Err(Unauthorized)` unless the chat may use the ledgers
    pub fn authorize(&self, chat_id: &str) -> Result<()> {
        if self.is_authorized(chat_id)? {
            Ok(())
        } else {
            Err(Error::Unauthorized)
        }
    }

    pub fn membership(&self, chat_id: &str) -> Result<Option<FamilyMember>> {
        Ok(self
            .store
            .families()?
            .into_iter()
            .find(|m| m.member_id == chat_id))
    }

    pub fn members_of_family(&self, family_id: &str) -> Result<Vec<FamilyMember>> {
        Ok(self
            .store
            .families()?
            .into_iter()
            .filter(|m| m.family_id == family_id)
            .collect())
    }

    /// The ids a family-scope report reads across: the whole family if
    /// the chat belongs to one, just the chat otherwise.
    pub fn scope_ids(&self, chat_id: &str) -> Result<Vec<String>> {
        match self.membership(chat_id)? {
            Some(member) => Ok(self
                .members_of_family(&member.family_id)?
                .into_iter()
                .map(|m| m.member_id)
                .collect()),
            None => Ok(vec![chat_id.to_string()]),
        }
    }

    pub fn create(&self, chat_id: &str, member_name: &str, family_name: &str) -> Result<FamilyMember> {
        if family_name.trim().is_empty() {
            return Err(Error::validation("family name must not be empty"));
        }
        if self.membership(chat_id)?.is_some() {
            return Err(Error::validation("already in a family"));
        }
        let member = FamilyMember {
            family_id: format!("F{}", Utc::now().timestamp_millis()),
            invite_code: generate_invite_code(),
            member_id: chat_id.to_string(),
            member_name: member_name.to_string(),
            family_name: family_name.trim().to_string(),
        };
        self.store.append_family_member(&member)?;
        Ok(member)
    }

    pub fn join(&self, chat_id: &str, invite_code: &str, member_name: &str) -> Result<FamilyMember> {
        if self.membership(chat_id)?.is_some() {
            return Err(Error::validation("already in a family"));
        }
        let code = invite_code.trim().to_uppercase();
        let existing = self
            .store
            .families()?
            .into_iter()
            .find(|m| m.invite_code == code)
            .ok_or_else(|| Error::not_found("invite code not recognized"))?;

        let member = FamilyMember {
            family_id: existing.family_id,
            invite_code: existing.invite_code,
            member_id: chat_id.to_string(),
            member_name: member_name.to_string(),
            family_name: existing.family_name,
        };
        self.store.append_family_member(&member)?;
        Ok(member)
    }

    pub fn leave(&self, chat_id: &str) -> Result<()> {
        if self.membership(chat_id)?.is_none() {
            return Err(Error::not_found("not in a family"));
        }
        self.store.remove_family_member(chat_id)
    }
}

fn generate_invite_code() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryStore;

    fn service() -> FamilyService {
        FamilyService::new(
            Arc::new(InMemoryStore::with_seed_categories()),
            "777".to_string(),
        )
    }

    #[test]
    fn test_owner_is_always_authorized() {
        let svc = service();
        assert!(svc.is_authorized("777").unwrap());
        assert!(!svc.is_authorized("123").unwrap());
    }

    #[test]
    fn test_authorize_rejects_strangers() {
        let svc = service();
        assert!(svc.authorize("777").is_ok());
        assert!(matches!(svc.authorize("123"), Err(Error::Unauthorized)));
    }

    #[test]
    fn test_join_by_invite_code() {
        let svc = service();
        let family = svc.create("100", "Анна", "Наша семья").unwrap();
        assert!(svc.is_authorized("100").unwrap());

        let joined = svc.join("200", &family.invite_code, "Борис").unwrap();
        assert_eq!(joined.family_id, family.family_id);
        assert!(svc.is_authorized("200").unwrap());

        let mut scope = svc.scope_ids("200").unwrap();
        scope.sort();
        assert_eq!(scope, vec!["100".to_string(), "200".to_string()]);
    }

    #[test]
    fn test_bad_invite_code_rejected() {
        let svc = service();
        assert!(matches!(
            svc.join("200", "NOPE11", "Борис"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_leave() {
        let svc = service();
        svc.create("100", "Анна", "Семья").unwrap();
        svc.leave("100").unwrap();
        assert!(!svc.is_authorized("100").unwrap());
        assert!(svc.leave("100").is_err());
    }

    #[test]
    fn test_invite_code_shape() {
        let code = generate_invite_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(code, code.to_uppercase());
    }
}
