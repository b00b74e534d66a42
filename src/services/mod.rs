//! Lending business logic

pub mod decision;
pub mod lending;
pub mod messages;
pub mod session;

pub use decision::{decide, Decision};
pub use lending::{LendingProcedure, LendingSettings};
pub use messages::Notice;
pub use session::{KioskSession, RunSummary, Shutdown};
