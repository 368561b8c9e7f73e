pub mod handlers;
pub mod latch;
pub mod service;
pub mod timer;
pub mod types;

pub use latch::ResolutionLatch;
pub use service::RoundOrchestrator;
pub use timer::{CountdownWindow, TimerRegistry};
pub use types::Resolution;
