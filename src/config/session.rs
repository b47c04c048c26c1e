use serde::Serialize;

use crate::storage::Storage;

pub const ONBOARDING_KEY: &str = "onboardingCompleted";

/// Per-installation flags, read once at startup and handed to the journal
/// agent instead of being looked up from the store on every request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionConfig {
    pub onboarding_completed: bool,
}

impl SessionConfig {
    pub async fn load(storage: &Storage) -> Self {
        Self {
            onboarding_completed: storage.get(ONBOARDING_KEY, false).await,
        }
    }

    pub async fn complete_onboarding(&mut self, storage: &Storage) {
        storage.set(ONBOARDING_KEY, &true).await;
        self.onboarding_completed = true;
    }
}
