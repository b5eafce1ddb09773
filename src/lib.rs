pub mod app;
pub mod config;
pub mod conversation;
pub mod gemini;
pub mod handler;
pub mod lexicon;
pub mod model;
pub mod orchestrator;
pub mod page;
pub mod prompt;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use config::Config;
pub use conversation::{Conversation, Message, Role};
pub use gemini::{GeminiClient, GeminiError, GenerationRequest, StreamEvent};
pub use lexicon::{LexicalHint, Lexicon};
pub use model::{AiModel, GenerationConfig};
pub use orchestrator::{GenerationClient, Orchestrator, TurnUpdate, GENERATION_ERROR_TEXT};
pub use prompt::Persona;
