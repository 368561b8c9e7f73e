pub mod engine;

pub use engine::{pick_tie_breaker, tally, tie_timeout_target, TallyOutcome};
