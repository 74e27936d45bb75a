// Gateway module for web search - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod gateway;
mod provider;

// Public re-exports - the ONLY way to access search functionality
pub use gateway::{SearchContext, SearchGateway, SearchOutcome};
pub use provider::{SearchHit, SearchProvider, TavilyProvider, WikipediaProvider};
