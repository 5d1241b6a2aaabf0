//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store access and reconciliation stages into one pass.
//! - Keep CLI/host layers decoupled from storage details.

pub mod reconcile_service;
