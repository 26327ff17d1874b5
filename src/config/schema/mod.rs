mod core;
mod engine;
mod observability;
mod store;

pub use self::core::AtelierConfig;
pub(crate) use self::core::finite_or;
pub use engine::{AggregatorConfig, BrandConfig, CacheConfig, SamplingConfig};
pub use observability::ObservabilityConfig;
pub use store::{StoreBackend, StoreConfig};
