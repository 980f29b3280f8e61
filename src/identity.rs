//! Caller identity asserted by the identity provider, and the sign-in mirror hook

use chrono::Utc;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::repository::{UserRecord, UserRepository};

/// A signed-in user as reported by the identity provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            user_id: user_id.into(),
            email,
        }
    }
}

/// Mirrors signed-in users into the local users table
#[derive(Clone)]
pub struct UserMirror {
    users: Arc<dyn UserRepository>,
}

impl UserMirror {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Sign-in hook. Runs the upsert in the background; failures are logged and dropped.
    pub fn on_signed_in(&self, identity: &Identity) -> JoinHandle<()> {
        let users = self.users.clone();
        let record = UserRecord {
            id: identity.user_id.clone(),
            email: identity.email.clone().unwrap_or_default(),
            last_sign_in: Utc::now(),
        };

        tokio::spawn(async move {
            let user_id = record.id.clone();
            match users.upsert_user(record).await {
                Ok(()) => info!(user_id = %user_id, "Mirrored signed-in user"),
                Err(e) => error!(user_id = %user_id, error = %e, "Failed to mirror signed-in user"),
            }
        })
    }
}
