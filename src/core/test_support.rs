use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use crate::core::bandit::SelectionMode;
use crate::core::types::{PromptMetadata, PromptResult, SelectionResult};

pub(crate) fn prompt_result(positive: &str) -> PromptResult {
    PromptResult {
        positive_prompt: positive.into(),
        negative_prompt: String::new(),
        metadata: PromptMetadata {
            prompt_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            mode: SelectionMode::Exploit,
            creativity: 0.3,
            consistency_score: 0.5,
            brand_dna_applied: false,
            records_considered: 0,
            chosen: BTreeMap::new(),
            selections: SelectionResult::default(),
        },
    }
}
