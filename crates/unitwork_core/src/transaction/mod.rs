//! Transaction primitive contract and the nesting-aware boundary.

mod boundary;
mod handle;

pub use boundary::TransactionBoundary;
pub use handle::{TransactionHandle, TransactionProvider};
