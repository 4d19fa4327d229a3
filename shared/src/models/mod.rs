//! Data models
//!
//! Wire types of the job source. All JSON field names are camelCase.

pub mod order_session;
pub mod print_job;
pub mod printer_profile;
pub mod serde_helpers;

// Re-exports
pub use order_session::*;
pub use print_job::*;
pub use printer_profile::*;
