//! Core types and traits for the machine-log store.
//!
//! Wire forms match the values the dashboard writes into the generic key-value contract
//! (`log_keys` directory, `log_<id>` records).

mod dto;
mod record;
mod session;
mod traits;

pub use dto::*;
pub use record::*;
pub use session::*;
pub use traits::*;
