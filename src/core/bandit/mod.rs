pub mod params;
pub mod random;
pub mod sampler;
pub mod sqlite;
pub mod store;

pub use params::{BetaParams, DEFAULT_ALPHA, DEFAULT_BETA, UserParams, params_for};
pub use random::{RandomSource, RngSource, ScriptedRandom};
pub use sampler::{SamplingEngine, SelectionMode, beta_sample, decide_mode, is_biased};
pub use sqlite::SqliteBanditStore;
pub use store::{BanditStore, InMemoryBanditStore, create_bandit_store};
