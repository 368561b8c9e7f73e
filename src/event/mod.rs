// Change feed plumbing
//
// Every successful store mutation is published on a per-game broadcast
// channel. Projectors and watchers subscribe to a game and re-derive their
// snapshot whenever something changes.

// Public API - what other modules can use
pub use bus::EventBus;
pub use events::{ChangeKind, StoreChange, Table};

// Internal modules
mod bus;
mod events;
