// Gateway module for models - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod factory;
mod remote;
mod traits;
mod types;

// Public re-exports - the ONLY way to access model functionality
pub use factory::ModelFactory;
pub use remote::RemoteModel;
pub use traits::Model;
pub use types::{GenerationRequest, Message, MessageRole, ModelResponse, TokenUsage};
