// Public API - what other modules can use
pub use models::WordOption;
pub use repository::{draw_options, StaticWordCatalog, WordCatalog};

// Internal modules
mod defaults;
mod models;
mod repository;
