//! Portfolio domain model.
//!
//! # Responsibility
//! - Define the flat record shape stored in the portfolio collection.
//! - Expose identity/name accessors without constraining other fields.
//!
//! # Invariants
//! - Fields other than `id` and `name` are opaque and round-trip unchanged.
//! - Collection order is storage order and is never changed by core.

pub mod record;
