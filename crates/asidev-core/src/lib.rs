pub mod ai;
pub mod auth;
pub mod config;
pub mod error;
pub mod fallback;
pub mod markdown;
pub mod reveal;
pub mod state;

// Re-export main types for convenience
pub use ai::DeepSeekClient;
pub use auth::{SessionStore, UserProfile};
pub use config::Config;
pub use error::ApiError;
pub use fallback::{fallback, FALLBACK_RESPONSES};
pub use reveal::{reveal, CancelToken, ProgressFn, Reveal};
pub use state::{ChatMessage, ChatRole};
