use super::remote::RemoteModel;
use super::traits::Model;
use crate::app::ModelSettings;
use crate::utils::AssistantError;

/// Factory for creating generation backends
pub struct ModelFactory;

impl ModelFactory {
    /// Create a model instance from settings
    pub fn create(settings: &ModelSettings) -> Result<Box<dyn Model>, AssistantError> {
        let model = RemoteModel::new(settings)?;
        Ok(Box::new(model))
    }
}
