//! Per-request orchestration.
//!
//! One request runs strictly in order: load descriptors, posteriors and the
//! style profile; aggregate; decide explore/exploit once; sample categories
//! in [`Category`] order; compose; score. All I/O happens before the first
//! random draw, so composition itself is synchronous and reproducible with a
//! scripted [`RandomSource`].

use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use uuid::Uuid;

use crate::config::{AtelierConfig, finite_or};
use crate::core::bandit::{
    BanditStore, RandomSource, RngSource, SamplingEngine, UserParams, create_bandit_store,
    decide_mode,
};
use crate::core::brand::{self, BrandDna};
use crate::core::cache::{CacheKey, FifoCache, ResultCache};
use crate::core::composer::{CompositionInput, compose};
use crate::core::consistency::consistency_score;
use crate::core::descriptor::{DescriptorAggregator, DescriptorRecord};
use crate::core::feedback::{FeedbackOutcome, FeedbackSignal, FeedbackUpdater};
use crate::core::sources::{DescriptorSource, ProfileSource};
use crate::core::types::{
    Category, ModelGender, PreferenceTable, PromptMetadata, PromptRequest, PromptResult,
    Selected, SelectionResult,
};
use crate::error::{Result, SourceError, StoreError, chain_message};

/// Everything loaded for one request before any sampling happens.
struct RequestContext {
    table: PreferenceTable,
    records_considered: usize,
    params: UserParams,
    brand: Option<BrandDna>,
}

pub struct PromptEngine {
    config: AtelierConfig,
    aggregator: DescriptorAggregator,
    store: Arc<dyn BanditStore>,
    descriptors: Arc<dyn DescriptorSource>,
    profiles: Arc<dyn ProfileSource>,
    cache: Option<Arc<dyn ResultCache>>,
    feedback: FeedbackUpdater,
}

impl PromptEngine {
    /// Build an engine; the cache follows `config.cache`.
    pub fn new(
        mut config: AtelierConfig,
        store: Arc<dyn BanditStore>,
        descriptors: Arc<dyn DescriptorSource>,
        profiles: Arc<dyn ProfileSource>,
    ) -> Self {
        config.normalize();
        let cache: Option<Arc<dyn ResultCache>> = config
            .cache
            .enabled
            .then(|| Arc::new(FifoCache::new(config.cache.capacity)) as Arc<dyn ResultCache>);
        let aggregator = DescriptorAggregator::new(&config.aggregator);
        let feedback = FeedbackUpdater::new(Arc::clone(&store), cache.clone());
        Self {
            config,
            aggregator,
            store,
            descriptors,
            profiles,
            cache,
            feedback,
        }
    }

    /// Build an engine whose bandit store comes from `config.store`.
    pub async fn from_config(
        config: AtelierConfig,
        descriptors: Arc<dyn DescriptorSource>,
        profiles: Arc<dyn ProfileSource>,
    ) -> Result<Self> {
        let store = create_bandit_store(&config.store).await?;
        Ok(Self::new(config, store, descriptors, profiles))
    }

    /// Replace the result cache (or disable it with `None`).
    #[must_use]
    pub fn with_cache(mut self, cache: Option<Arc<dyn ResultCache>>) -> Self {
        self.feedback = FeedbackUpdater::new(Arc::clone(&self.store), cache.clone());
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &AtelierConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn BanditStore> {
        &self.store
    }

    pub fn cache(&self) -> Option<&Arc<dyn ResultCache>> {
        self.cache.as_ref()
    }

    pub async fn generate(&self, request: &PromptRequest) -> Result<PromptResult> {
        let mut rng = RngSource(StdRng::from_rng(&mut rand::rng()));
        self.generate_with_rng(request, &mut rng).await
    }

    /// Like [`Self::generate`] with caller-supplied randomness.
    pub async fn generate_with_rng<R: RandomSource + ?Sized>(
        &self,
        request: &PromptRequest,
        rng: &mut R,
    ) -> Result<PromptResult> {
        let cache_key = self.cacheable(request).then(|| CacheKey::new(&request.user_id, &request.filters));
        if let (Some(cache), Some(key)) = (&self.cache, &cache_key)
            && let Some(hit) = cache.get(key)
        {
            tracing::debug!(user_id = %request.user_id, "prompt cache hit");
            return Ok(hit);
        }

        let context = self.load(request).await?;
        let result = self.compose_one(request, &context, rng);

        if let (Some(cache), Some(key)) = (&self.cache, cache_key) {
            cache.set(key, result.clone());
        }
        Ok(result)
    }

    /// Compose `n` independent prompts for one request. Each prompt makes its
    /// own explore/exploit decision; the cache is neither read nor written.
    pub async fn generate_batch(&self, request: &PromptRequest, n: usize) -> Result<Vec<PromptResult>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let context = self.load(request).await?;
        let mut rng = RngSource(StdRng::from_rng(&mut rand::rng()));
        let results: Vec<PromptResult> = (0..n)
            .map(|_| self.compose_one(request, &context, &mut rng))
            .collect();
        tracing::info!(user_id = %request.user_id, count = n, "prompt batch composed");
        Ok(results)
    }

    /// Credit every attribute of a previously generated selection.
    pub async fn record_feedback(
        &self,
        user_id: &str,
        selection: &SelectionResult,
        signal: FeedbackSignal,
    ) -> Result<FeedbackOutcome> {
        self.feedback.apply(user_id, selection, signal).await
    }

    /// Only requests without per-call user input share cached results: the
    /// cache key is (user, filters), so free text, an explicit color or a
    /// model gender would otherwise be answered with another request's prompt.
    fn cacheable(&self, request: &PromptRequest) -> bool {
        let blank = |value: Option<&str>| value.is_none_or(|v| v.trim().is_empty());
        self.cache.is_some()
            && blank(request.user_text.as_deref())
            && blank(request.user_color.as_deref())
            && request.model_gender == ModelGender::Unspecified
    }

    async fn load(&self, request: &PromptRequest) -> Result<RequestContext> {
        let user_id = request.user_id.as_str();

        let raw = self
            .descriptors
            .recent(user_id, self.aggregator.max_records())
            .await
            .map_err(|err| SourceError::Descriptors {
                user_id: user_id.to_string(),
                message: chain_message(&err),
            })?;
        let records: Vec<DescriptorRecord> = raw.iter().map(DescriptorRecord::from_value).collect();
        let (table, records_considered) = self.aggregator.aggregate_filtered(&records, &request.filters);

        let params = self
            .store
            .get(user_id)
            .await
            .map_err(|err| StoreError::Fetch {
                user_id: user_id.to_string(),
                message: chain_message(&err),
            })?;

        let brand = if request.use_brand_dna && self.config.brand.enabled {
            let profile = self
                .profiles
                .style_profile(user_id)
                .await
                .map_err(|err| SourceError::Profile {
                    user_id: user_id.to_string(),
                    message: chain_message(&err),
                })?;
            brand::extract(profile.as_ref(), &self.config.brand)
        } else {
            None
        };

        Ok(RequestContext {
            table,
            records_considered,
            params,
            brand,
        })
    }

    fn compose_one<R: RandomSource + ?Sized>(
        &self,
        request: &PromptRequest,
        context: &RequestContext,
        rng: &mut R,
    ) -> PromptResult {
        let sampling = &self.config.sampling;
        let creativity = finite_or(
            request.creativity.unwrap_or(sampling.default_creativity),
            sampling.default_creativity,
        )
        .clamp(0.0, 1.0);
        let mode = decide_mode(creativity, rng);
        let brand = context.brand.as_ref();

        let selection = {
            let mut engine =
                SamplingEngine::new(mode, &context.params, sampling.brand_bias_strength, rng);
            select(&mut engine, &context.table, brand, &self.config)
        };

        let composed = compose(&CompositionInput {
            selection: &selection,
            brand,
            user_text: request.user_text.as_deref(),
            user_color: request.user_color.as_deref(),
            model_gender: request.model_gender,
        });
        let consistency = consistency_score(&selection, brand);

        tracing::info!(
            user_id = %request.user_id,
            %mode,
            creativity,
            consistency,
            records = context.records_considered,
            brand = brand.is_some(),
            "prompt composed"
        );

        PromptResult {
            positive_prompt: composed.positive,
            negative_prompt: composed.negative,
            metadata: PromptMetadata {
                prompt_id: Uuid::new_v4(),
                generated_at: chrono::Utc::now(),
                mode,
                creativity,
                consistency_score: consistency,
                brand_dna_applied: brand.is_some(),
                records_considered: context.records_considered,
                chosen: selection.chosen(),
                selections: selection,
            },
        }
    }
}

/// Sample every category in order. Fabric and construction candidates are
/// narrowed to those seen with the chosen garment when any exist.
fn select<R: RandomSource + ?Sized>(
    engine: &mut SamplingEngine<'_, R>,
    table: &PreferenceTable,
    brand: Option<&BrandDna>,
    config: &AtelierConfig,
) -> SelectionResult {
    let sampling = &config.sampling;

    let style_context = pick_one(engine, table, brand, Category::StyleContext, None);
    let garment = pick_one(engine, table, brand, Category::Garment, None);
    let garment_key = garment.as_ref().map(|g| g.key.as_str());
    let fabric = pick_one(engine, table, brand, Category::Fabric, garment_key);
    let colors = pick_many(engine, table, brand, Category::Color, None, sampling.color_count);
    let construction = pick_many(
        engine,
        table,
        brand,
        Category::Construction,
        garment_key,
        sampling.construction_count,
    );
    let pose = pick_one(engine, table, brand, Category::Pose, None);
    let accessories = pick_many(
        engine,
        table,
        brand,
        Category::Accessory,
        None,
        sampling.accessory_count,
    );
    let photography = pick_one(engine, table, brand, Category::Photography, None);

    SelectionResult {
        style_context,
        garment,
        fabric,
        colors,
        construction,
        pose,
        accessories,
        photography,
    }
}

fn bias(brand: Option<&BrandDna>, category: Category) -> Vec<String> {
    brand.map(|b| b.bias_for(category)).unwrap_or_default()
}

fn pick_one<R: RandomSource + ?Sized>(
    engine: &mut SamplingEngine<'_, R>,
    table: &PreferenceTable,
    brand: Option<&BrandDna>,
    category: Category,
    garment: Option<&str>,
) -> Option<Selected> {
    let candidates = candidates(table, category, garment);
    engine
        .sample_category(category, &candidates, &bias(brand, category))
        .and_then(|key| selected(table, category, key))
}

fn pick_many<R: RandomSource + ?Sized>(
    engine: &mut SamplingEngine<'_, R>,
    table: &PreferenceTable,
    brand: Option<&BrandDna>,
    category: Category,
    garment: Option<&str>,
    n: usize,
) -> Vec<Selected> {
    let candidates = candidates(table, category, garment);
    engine
        .sample_multiple(category, &candidates, &bias(brand, category), n)
        .into_iter()
        .filter_map(|key| selected(table, category, key))
        .collect()
}

/// Keys of `category`, most frequent first.
fn candidates(table: &PreferenceTable, category: Category, garment: Option<&str>) -> Vec<String> {
    let Some(stats) = table.get(&category) else {
        return Vec::new();
    };
    let mut ranked: Vec<_> = stats.iter().collect();
    if let Some(garment) = garment {
        let narrowed: Vec<_> = ranked
            .iter()
            .copied()
            .filter(|(_, stat)| stat.garments.contains(garment))
            .collect();
        if !narrowed.is_empty() {
            ranked = narrowed;
        }
    }
    ranked.sort_by(|a, b| b.1.count.cmp(&a.1.count));
    ranked.into_iter().map(|(key, _)| key.clone()).collect()
}

fn selected(table: &PreferenceTable, category: Category, key: String) -> Option<Selected> {
    let stat = table.get(&category)?.get(&key)?;
    Some(Selected::new(key, stat.payload.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bandit::{BetaParams, InMemoryBanditStore, ScriptedRandom};
    use crate::core::brand::{StyleProfile, WeightedValue};
    use crate::core::sources::{InMemoryDescriptorSource, InMemoryProfileSource};
    use serde_json::json;

    struct Fixture {
        store: Arc<InMemoryBanditStore>,
        descriptors: Arc<InMemoryDescriptorSource>,
        profiles: Arc<InMemoryProfileSource>,
    }

    impl Fixture {
        fn new() -> Self {
            let descriptors = Arc::new(InMemoryDescriptorSource::new());
            descriptors
                .push(
                    "u1",
                    json!({
                        "garments": [{"type": "bomber jacket", "fabric": "nylon", "colors": ["black"]}],
                        "contextual_attributes": {"aesthetic": "utilitarian"}
                    }),
                )
                .unwrap();
            descriptors
                .push(
                    "u1",
                    json!({
                        "garments": [{"type": "slip dress", "fabric": "silk", "colors": ["olive"]}],
                        "contextual_attributes": {"aesthetic": "romantic", "season": "summer"}
                    }),
                )
                .unwrap();
            Self {
                store: Arc::new(InMemoryBanditStore::new()),
                descriptors,
                profiles: Arc::new(InMemoryProfileSource::new()),
            }
        }

        fn engine(&self, config: AtelierConfig) -> PromptEngine {
            PromptEngine::new(
                config,
                self.store.clone(),
                self.descriptors.clone(),
                self.profiles.clone(),
            )
        }
    }

    #[tokio::test]
    async fn exploit_prefers_strong_posterior() {
        let fixture = Fixture::new();
        fixture
            .store
            .seed("u1", Category::Color, "olive", BetaParams::new(20.0, 2.0))
            .unwrap();
        let mut config = AtelierConfig::default();
        config.sampling.color_count = 1;
        let engine = fixture.engine(config);

        let request = PromptRequest::new("u1").with_creativity(0.0);
        let mut rng = ScriptedRandom::new(vec![0.9]);
        let result = engine.generate_with_rng(&request, &mut rng).await.unwrap();

        let colors = &result.metadata.selections.colors;
        assert_eq!(colors.len(), 1);
        assert_eq!(colors[0].key, "olive");
        assert_eq!(result.metadata.mode, crate::core::bandit::SelectionMode::Exploit);
        assert_eq!(result.metadata.records_considered, 2);
    }

    #[tokio::test]
    async fn fabric_candidates_follow_garment() {
        let fixture = Fixture::new();
        let records: Vec<DescriptorRecord> = fixture
            .descriptors
            .recent("u1", 10)
            .await
            .unwrap()
            .iter()
            .map(DescriptorRecord::from_value)
            .collect();
        let table = DescriptorAggregator::new(&AtelierConfig::default().aggregator).aggregate(&records);

        assert_eq!(candidates(&table, Category::Fabric, Some("slip dress")), vec!["silk"]);
        assert_eq!(candidates(&table, Category::Fabric, Some("kimono")).len(), 2);
        assert!(candidates(&table, Category::Pose, None).is_empty());
    }

    #[tokio::test]
    async fn free_text_bypasses_cache() {
        let fixture = Fixture::new();
        let engine = fixture.engine(AtelierConfig::default());
        let request = PromptRequest::new("u1").with_user_text("gold buttons");

        let first = engine.generate(&request).await.unwrap();
        let second = engine.generate(&request).await.unwrap();
        assert_ne!(first.metadata.prompt_id, second.metadata.prompt_id);
        assert!(engine.cache().unwrap().is_empty());
        assert!(first.positive_prompt.contains("(gold buttons:1.2)"));
    }

    #[tokio::test]
    async fn user_overrides_bypass_cache() {
        let fixture = Fixture::new();
        let engine = fixture.engine(AtelierConfig::default());

        engine.generate(&PromptRequest::new("u1")).await.unwrap();
        let colored = engine
            .generate(&PromptRequest::new("u1").with_user_color("burgundy"))
            .await
            .unwrap();
        let male = engine
            .generate(&PromptRequest::new("u1").with_model_gender(ModelGender::Male))
            .await
            .unwrap();

        assert!(colored.positive_prompt.contains("(burgundy:1.4)"));
        assert!(male.positive_prompt.contains("(male fashion model:1.0)"));
        assert_eq!(engine.cache().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn one_mode_draw_per_request() {
        let fixture = Fixture::new();
        let engine = fixture.engine(AtelierConfig::default()).with_cache(None);

        // No records means no candidates, so the mode decision is the only draw.
        let mut rng = ScriptedRandom::new(vec![0.1]);
        let result = engine
            .generate_with_rng(&PromptRequest::new("stranger").with_creativity(0.5), &mut rng)
            .await
            .unwrap();
        assert_eq!(rng.consumed(), 1);
        assert_eq!(result.metadata.mode, crate::core::bandit::SelectionMode::Explore);
    }

    #[tokio::test]
    async fn batch_skips_cache_and_yields_n() {
        let fixture = Fixture::new();
        let engine = fixture.engine(AtelierConfig::default());
        let request = PromptRequest::new("u1");

        let batch = engine.generate_batch(&request, 3).await.unwrap();
        assert_eq!(batch.len(), 3);
        assert_ne!(batch[0].metadata.prompt_id, batch[1].metadata.prompt_id);
        assert!(engine.cache().unwrap().is_empty());
        assert!(engine.generate_batch(&request, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn brand_dna_can_be_skipped_per_request() {
        let fixture = Fixture::new();
        fixture
            .profiles
            .insert(
                "u1",
                StyleProfile {
                    aesthetic_themes: vec![WeightedValue::new("utilitarian", 1.0)],
                    ..StyleProfile::default()
                },
            )
            .unwrap();
        let engine = fixture.engine(AtelierConfig::default()).with_cache(None);

        let with_brand = engine.generate(&PromptRequest::new("u1")).await.unwrap();
        assert!(with_brand.metadata.brand_dna_applied);

        let mut request = PromptRequest::new("u1");
        request.use_brand_dna = false;
        let without = engine.generate(&request).await.unwrap();
        assert!(!without.metadata.brand_dna_applied);
        assert!((without.metadata.consistency_score - 0.5).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn filters_narrow_the_window() {
        let fixture = Fixture::new();
        let engine = fixture.engine(AtelierConfig::default()).with_cache(None);
        let request = PromptRequest::new("u1").with_filters(crate::core::types::Filters {
            season: Some("summer".into()),
            ..Default::default()
        });

        let result = engine.generate(&request).await.unwrap();
        assert_eq!(result.metadata.records_considered, 1);
        assert_eq!(result.metadata.selections.garment_type(), Some("slip dress"));
    }
}
