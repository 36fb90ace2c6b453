use anyhow::Result;
use async_trait::async_trait;

/// Pluggable completion backend. The model is strictly a translator from
/// colloquial text to the structured order shape; every price, total, and
/// ledger decision is made deterministically downstream.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}
