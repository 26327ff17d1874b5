pub mod bandit;
pub mod brand;
pub mod cache;
pub mod composer;
pub mod consistency;
pub mod descriptor;
pub mod engine;
pub mod feedback;
pub mod sources;
#[cfg(test)]
pub(crate) mod test_support;
pub mod types;

pub use engine::PromptEngine;
