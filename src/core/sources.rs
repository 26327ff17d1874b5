use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use anyhow::Result;
use serde_json::Value;

use crate::core::brand::StyleProfile;

/// Read-only feed of a user's analyzed portfolio images.
pub trait DescriptorSource: Send + Sync {
    /// Up to `limit` raw records, most recent first.
    fn recent<'a>(
        &'a self,
        user_id: &'a str,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Value>>> + Send + 'a>>;
}

/// Read-only feed of precomputed style profiles.
pub trait ProfileSource: Send + Sync {
    fn style_profile<'a>(
        &'a self,
        user_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<StyleProfile>>> + Send + 'a>>;
}

#[derive(Debug, Default)]
pub struct InMemoryDescriptorSource {
    records: Mutex<HashMap<String, Vec<Value>>>,
}

impl InMemoryDescriptorSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly analyzed image; it becomes the most recent.
    pub fn push(&self, user_id: &str, record: Value) -> Result<()> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| anyhow::anyhow!("descriptor source lock poisoned"))?;
        records
            .entry(user_id.to_string())
            .or_default()
            .insert(0, record);
        Ok(())
    }
}

impl DescriptorSource for InMemoryDescriptorSource {
    fn recent<'a>(
        &'a self,
        user_id: &'a str,
        limit: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Value>>> + Send + 'a>> {
        Box::pin(async move {
            let records = self
                .records
                .lock()
                .map_err(|_| anyhow::anyhow!("descriptor source lock poisoned"))?;
            Ok(records
                .get(user_id)
                .map(|list| list.iter().take(limit).cloned().collect())
                .unwrap_or_default())
        })
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProfileSource {
    profiles: Mutex<HashMap<String, StyleProfile>>,
}

impl InMemoryProfileSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user_id: &str, profile: StyleProfile) -> Result<()> {
        self.profiles
            .lock()
            .map_err(|_| anyhow::anyhow!("profile source lock poisoned"))?
            .insert(user_id.to_string(), profile);
        Ok(())
    }
}

impl ProfileSource for InMemoryProfileSource {
    fn style_profile<'a>(
        &'a self,
        user_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Option<StyleProfile>>> + Send + 'a>> {
        Box::pin(async move {
            let profiles = self
                .profiles
                .lock()
                .map_err(|_| anyhow::anyhow!("profile source lock poisoned"))?;
            Ok(profiles.get(user_id).cloned())
        })
    }
}
