pub mod pointer;
pub mod scenarios;
pub mod tracked;

pub use pointer::{SharedPointer, StdShared};
pub use scenarios::{find, run, Scenario, Target, SCENARIOS};
pub use tracked::Tracked;
