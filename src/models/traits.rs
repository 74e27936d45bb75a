use async_trait::async_trait;

use super::types::{GenerationRequest, ModelResponse};
use crate::utils::AssistantError;

/// Core trait that all generation backends must implement
#[async_trait]
pub trait Model: Send + Sync {
    /// Send a rendered prompt to the model and get a response.
    ///
    /// An empty completion is a `Generation` error, never an empty success.
    async fn generate(&self, request: &GenerationRequest) -> Result<ModelResponse, AssistantError>;

    /// Get the name of the model
    fn name(&self) -> &str;

    /// Validate that the model is accessible
    async fn validate_connection(&self) -> Result<bool, AssistantError> {
        Ok(true)
    }
}
