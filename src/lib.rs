pub mod app;
pub mod classify;
pub mod cli;
pub mod constants;
pub mod memory;
pub mod models;
pub mod runtime;
pub mod search;
pub mod store;
pub mod utils;

pub use app::{load_config, Config};
pub use memory::ConversationMemory;
pub use models::{Message, MessageRole, Model};
pub use runtime::{Assistant, TurnReport};
pub use search::{SearchGateway, SearchOutcome};
pub use store::{ConversationDocument, SessionStore};
pub use utils::AssistantError;
