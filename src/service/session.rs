use std::sync::Arc;

use tokio::sync::Mutex;

use crate::models::token::TokenSet;

/// Single-tenant holder for the current token set. One slot for the whole
/// process; a new authorization overwrites the previous one, and a restart
/// loses it.
#[derive(Clone, Default)]
pub struct SessionStore {
    token: Arc<Mutex<Option<TokenSet>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_token(&self, tokens: TokenSet) {
        *self.token.lock().await = Some(tokens);
    }

    pub async fn has_token(&self) -> bool {
        self.token.lock().await.is_some()
    }

    /// Read lazily, immediately before each provider call.
    pub async fn access_token(&self) -> Option<String> {
        self.token
            .lock()
            .await
            .as_ref()
            .map(|t| t.access_token.clone())
    }
}
