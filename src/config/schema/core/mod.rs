mod env_overrides;
mod loader;
#[cfg(test)]
mod test_env;
mod types;

pub use types::AtelierConfig;
pub(crate) use types::finite_or;
