//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod accounts;
pub mod banks;
pub mod categories;
pub mod expenses;
pub mod info;
pub mod ledger;
pub mod payment_methods;
pub mod reports;

// Re-export all handlers for use in router
pub use accounts::*;
pub use banks::*;
pub use categories::*;
pub use expenses::*;
pub use info::*;
pub use ledger::*;
pub use payment_methods::*;
pub use reports::*;
