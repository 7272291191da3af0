//! # unitwork_core
//!
//! Transactional unit-of-work coordinator for record-mapped persistence.
//!
//! This crate provides:
//! - A pending-operation ledger ([`UnitOfWork`]) that tracks entity
//!   insertions, updates, and deletions, reconciling conflicting
//!   operations on the same entity before they reach storage
//! - A nesting-aware transaction gate ([`TransactionBoundary`]) that
//!   flushes the ledger exactly once, at the outermost commit, and
//!   discards it on rollback
//! - The pluggable collaborator contracts: [`EntityMapper`],
//!   [`PersistableRecord`], [`TransactionProvider`]
//!
//! The flush is all-or-nothing within the surrounding transaction:
//! deletions are issued first, then insertions, then updates, and the
//! first storage operation that does not report success aborts the
//! flush with the ledger intact so the caller can roll back.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use unitwork_core::{Tracked, TransactionBoundary};
//!
//! let mut boundary = TransactionBoundary::new(connection);
//! boundary.begin()?;
//!
//! let user = Tracked::new(User::new("ada"));
//! boundary.persist(&user, &mapper)?;
//!
//! let loaded = boundary.get_for_update(row, &mapper);
//! boundary.schedule_for_delete(&loaded)?;
//!
//! boundary.commit()?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod entity;
mod error;
mod mapper;
mod record;
mod transaction;
mod unit_of_work;

pub use entity::{EntityKey, Tracked};
pub use error::{WorkError, WorkResult};
pub use mapper::EntityMapper;
pub use record::PersistableRecord;
pub use transaction::{TransactionBoundary, TransactionHandle, TransactionProvider};
pub use unit_of_work::{Schedule, UnitOfWork};
