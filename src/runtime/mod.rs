// Gateway module for the runtime - follows the Train Station Pattern
// All external access must go through this gateway

// Private submodules - not directly accessible from outside
mod assistant;
mod repl;
mod synthesizer;
mod turn;

// Public re-exports - the ONLY way to access runtime functionality
pub use assistant::{Assistant, SessionInfo};
pub use repl::run_repl;
pub use synthesizer::ResponseSynthesizer;
pub use turn::{TurnReport, TurnRunner, FALLBACK_REPLY};
