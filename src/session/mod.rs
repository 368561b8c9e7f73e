// Public API - what other modules can use
pub use generators::{normalize_code, CodeGenerator, RandomCodeGenerator, ScriptedCodeGenerator};
pub use service::SessionManager;
pub use types::{CreateGameResponse, JoinGameResponse};

pub mod generators;
pub mod handlers;
pub mod service;
pub mod types;
