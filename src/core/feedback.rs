use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::bandit::BanditStore;
use crate::core::cache::ResultCache;
use crate::core::types::SelectionResult;
use crate::error::{Result, StoreError, chain_message};

/// Ratings at or above this count as a success.
pub const POSITIVE_RATING: u8 = 4;

/// User reaction to one generated result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackSignal {
    #[serde(default)]
    pub liked: bool,
    #[serde(default)]
    pub saved: bool,
    /// 1 to 5 star rating, when given.
    #[serde(default)]
    pub rating: Option<u8>,
}

impl FeedbackSignal {
    pub fn liked() -> Self {
        Self {
            liked: true,
            ..Self::default()
        }
    }

    pub fn rated(rating: u8) -> Self {
        Self {
            rating: Some(rating),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.liked || self.saved || self.rating.is_some_and(|r| r >= POSITIVE_RATING)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedbackOutcome {
    pub success: bool,
    pub increments: usize,
    pub evicted: usize,
}

/// Turns feedback into bandit increments and invalidates the user's cache.
pub struct FeedbackUpdater {
    store: Arc<dyn BanditStore>,
    cache: Option<Arc<dyn ResultCache>>,
}

impl FeedbackUpdater {
    pub fn new(store: Arc<dyn BanditStore>, cache: Option<Arc<dyn ResultCache>>) -> Self {
        Self { store, cache }
    }

    /// One increment per distinct (category, key) in `selection`. The first
    /// store failure is returned; cache entries are dropped either way.
    pub async fn apply(
        &self,
        user_id: &str,
        selection: &SelectionResult,
        signal: FeedbackSignal,
    ) -> Result<FeedbackOutcome> {
        let success = signal.is_success();
        let targets = selection.credit_targets();

        let mut increments = 0;
        let mut failure = None;
        for (category, attribute) in &targets {
            if let Err(err) = self
                .store
                .increment(user_id, *category, attribute, success)
                .await
            {
                failure = Some(StoreError::Increment {
                    user_id: user_id.to_string(),
                    category: category.to_string(),
                    attribute: attribute.clone(),
                    message: chain_message(&err),
                });
                break;
            }
            increments += 1;
        }

        let evicted = self
            .cache
            .as_ref()
            .map_or(0, |cache| cache.evict_user(user_id));

        if let Some(err) = failure {
            tracing::warn!(user_id, increments, error = %err, "feedback update failed");
            return Err(err.into());
        }

        tracing::info!(user_id, success, increments, evicted, "feedback applied");
        Ok(FeedbackOutcome {
            success,
            increments,
            evicted,
        })
    }
}
