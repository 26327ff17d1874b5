pub mod extractor;
pub mod types;

pub use extractor::extract;
pub use types::{BrandDna, DEFAULT_AESTHETIC, ProfileSample, StyleProfile, WeightedValue};
