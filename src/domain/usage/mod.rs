//! Usage ledger entities and repository trait

mod record;
mod repository;

pub use record::{UsageDay, UsageQuery};
pub use repository::UsageLedger;
