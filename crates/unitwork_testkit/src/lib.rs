//! # unitwork_testkit
//!
//! In-memory test doubles and generators for `unitwork_core`.
//!
//! This crate provides:
//! - [`StorageJournal`] — shared recorder of the storage calls a flush
//!   makes, surviving ledger clears
//! - [`MemRecord`] — persistable record with scripted outcomes
//! - [`Widget`] / [`WidgetMapper`] — sample entity and mapping strategy
//! - [`MemConnection`] / [`MemTransaction`] — nesting-aware transaction
//!   primitive double
//! - [`generators`] — proptest strategies over scheduling scripts
//!
//! ## Usage
//!
//! ```rust,ignore
//! use unitwork_core::{Tracked, TransactionBoundary};
//! use unitwork_testkit::prelude::*;
//!
//! let journal = StorageJournal::new();
//! let mapper = WidgetMapper::new(&journal);
//! let mut boundary = TransactionBoundary::new(MemConnection::new());
//!
//! boundary.begin().unwrap();
//! boundary.persist(&Tracked::new(Widget::new("bolt", 7)), &mapper).unwrap();
//! boundary.commit().unwrap();
//!
//! assert_eq!(journal.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod generators;
mod journal;
mod mapper;
mod record;
mod transaction;

pub use journal::{StorageCall, StorageJournal};
pub use mapper::{Widget, WidgetMapper};
pub use record::MemRecord;
pub use transaction::{MemConnection, MemTransaction};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::generators::{script, script_op, ScriptOp};
    pub use crate::journal::{StorageCall, StorageJournal};
    pub use crate::mapper::{Widget, WidgetMapper};
    pub use crate::record::MemRecord;
    pub use crate::transaction::{MemConnection, MemTransaction};
}
