//! Completion providers backed by remote language models.

mod openai;

pub use openai::OpenAiProvider;

use std::sync::Arc;
use wand_rs_config::ProviderConfig;
use wand_rs_protocol::{CompletionProvider, ProviderError};

/// Build the provider described by `config`.
pub fn build_provider(
    config: &ProviderConfig,
) -> Result<Arc<dyn CompletionProvider>, ProviderError> {
    Ok(Arc::new(OpenAiProvider::from_config(config)?))
}
