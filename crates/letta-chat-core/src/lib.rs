pub mod config;
pub mod envfile;
pub mod error;
pub mod letta;
pub mod normalize;
pub mod provision;
pub mod render;
pub mod state;
pub mod suggestions;

// Re-export main types for convenience
pub use config::Config;
pub use envfile::{EnvContents, EnvFile};
pub use error::SetupError;
pub use letta::{AgentService, LettaClient, MessageBatch};
pub use normalize::{normalize, normalize_blocks, Block, Language};
pub use provision::{setup, AgentPreset, Outcome, Provisioner, Step};
pub use render::{markdown_to_html, render_message, CopyButton, MessageView, SystemClipboard};
pub use state::{ChatMessage, ChatRole};
pub use suggestions::{Suggestion, SUGGESTIONS};
