// User profiles: the ledger's record of a token subject, needed before the
// caller can open campaigns or payout accounts.

use std::sync::Arc;
use tracing::info;

use crate::auth::CallerIdentity;
use crate::error::{AppError, AppResult};
use crate::ledger::models::{NewUser, User};
use crate::ledger::LedgerStore;

#[derive(Debug, Clone)]
pub struct ProfileDraft {
    pub full_name: String,
    pub username: String,
    pub email: String,
}

pub struct UserService {
    ledger: Arc<dyn LedgerStore>,
}

impl UserService {
    pub fn new(ledger: Arc<dyn LedgerStore>) -> Self {
        Self { ledger }
    }

    /// Store the caller's profile under their token subject. One profile per subject.
    pub async fn register(&self, caller: &CallerIdentity, draft: ProfileDraft) -> AppResult<User> {
        let full_name = draft.full_name.trim().to_string();
        let username = draft.username.trim().to_string();
        let email = draft.email.trim().to_string();

        if full_name.is_empty() || username.is_empty() || email.is_empty() {
            return Err(AppError::InvalidInput("Please enter all fields".to_string()));
        }

        let user = self
            .ledger
            .insert_user(NewUser {
                id: caller.user_id,
                full_name,
                username,
                email,
            })
            .await?;

        info!("✓ Registered profile {} ({})", user.id, user.username);
        Ok(user)
    }

    pub async fn me(&self, caller: &CallerIdentity) -> AppResult<User> {
        self.ledger
            .get_user(caller.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;
    use uuid::Uuid;

    fn draft(name: &str) -> ProfileDraft {
        ProfileDraft {
            full_name: format!("{} Obi", name),
            username: name.to_string(),
            email: format!("{}@example.com", name),
        }
    }

    #[tokio::test]
    async fn test_profile_is_keyed_by_token_subject() {
        let service = UserService::new(Arc::new(InMemoryLedger::new()));
        let caller = CallerIdentity { user_id: Uuid::new_v4() };

        let user = service.register(&caller, draft("ngozi")).await.unwrap();
        assert_eq!(user.id, caller.user_id);
        assert_eq!(service.me(&caller).await.unwrap().username, "ngozi");
    }

    #[tokio::test]
    async fn test_second_registration_is_conflict() {
        let service = UserService::new(Arc::new(InMemoryLedger::new()));
        let caller = CallerIdentity { user_id: Uuid::new_v4() };

        service.register(&caller, draft("ngozi")).await.unwrap();
        let result = service.register(&caller, draft("emeka")).await;
        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_blank_fields_are_rejected() {
        let service = UserService::new(Arc::new(InMemoryLedger::new()));
        let caller = CallerIdentity { user_id: Uuid::new_v4() };

        let mut blank = draft("ngozi");
        blank.full_name = "   ".to_string();
        let result = service.register(&caller, blank).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert!(matches!(service.me(&caller).await, Err(AppError::NotFound(_))));
    }
}
