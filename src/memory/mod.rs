// Gateway module for conversation memory - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod conversation;

// Public re-exports - the ONLY way to access memory functionality
pub use conversation::ConversationMemory;
