// Gateway module for the session store - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod document;
mod session_store;

// Public re-exports - the ONLY way to access store functionality
pub use document::ConversationDocument;
pub use session_store::SessionStore;
