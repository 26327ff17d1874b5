pub mod schema;

pub use schema::{
    AggregatorConfig, AtelierConfig, BrandConfig, CacheConfig, ObservabilityConfig,
    SamplingConfig, StoreBackend, StoreConfig,
};
pub(crate) use schema::finite_or;
