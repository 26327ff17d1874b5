#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::struct_field_names,
    clippy::must_use_candidate,
    clippy::new_without_default,
    clippy::return_self_not_must_use
)]

pub mod config;
pub mod core;
pub mod error;
pub mod observability;

pub use config::AtelierConfig;
pub use crate::core::PromptEngine;
pub use crate::core::bandit::{BanditStore, InMemoryBanditStore, SqliteBanditStore, create_bandit_store};
pub use crate::core::brand::{BrandDna, StyleProfile};
pub use crate::core::cache::{CacheKey, FifoCache, ResultCache};
pub use crate::core::feedback::{FeedbackOutcome, FeedbackSignal};
pub use crate::core::sources::{
    DescriptorSource, InMemoryDescriptorSource, InMemoryProfileSource, ProfileSource,
};
pub use crate::core::types::{
    Category, Filters, ModelGender, PromptMetadata, PromptRequest, PromptResult, SelectionResult,
};
pub use error::{AtelierError, Result};
