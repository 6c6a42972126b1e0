//! Standard node library
//!
//! Collection of built-in steps for common scraping pipelines

mod conditional;
mod debug;
mod http;
mod merge;
mod parse;
mod transform;

pub use conditional::{key_present, KeyPresentNode, KeyPresentNodeFactory};
pub use debug::{DebugNode, DebugNodeFactory};
pub use http::{FetchNode, FetchNodeFactory};
pub use merge::{MergeAnswersNode, MergeAnswersNodeFactory};
pub use parse::{ParseNode, ParseNodeFactory};
pub use transform::{JsonParseNode, JsonParseNodeFactory};
use scraperuntime::NodeRegistry;

use std::sync::Arc;

/// Register all standard nodes with a registry
pub fn register_all(registry: &mut NodeRegistry) {
    registry.register(Arc::new(debug::DebugNodeFactory));
    registry.register(Arc::new(http::FetchNodeFactory));
    registry.register(Arc::new(parse::ParseNodeFactory));
    registry.register(Arc::new(transform::JsonParseNodeFactory));
    registry.register(Arc::new(merge::MergeAnswersNodeFactory));
    registry.register(Arc::new(conditional::KeyPresentNodeFactory));
}

/// A registry with every standard node registered
pub fn default_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();
    register_all(&mut registry);
    registry
}
