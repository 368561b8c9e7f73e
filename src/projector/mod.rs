pub mod handlers;
pub mod models;
pub mod service;
pub mod watcher;

pub use models::{GameSnapshot, PlayerView};
pub use service::ViewProjector;
pub use watcher::GameWatcher;
