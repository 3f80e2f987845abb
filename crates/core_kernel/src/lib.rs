//! Core Kernel - Foundational types for the claim audit system
//!
//! This crate provides the building blocks shared by the audit crates:
//! - Port error type and marker trait for external collaborators
//! - Strongly-typed identifiers for audit runs and retrieved files
//! - Whole-unit monetary amounts used by itemized claim reports

pub mod amount;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use amount::{WholeAmount, AmountError};
pub use identifiers::{AuditRunId, FileId};
pub use ports::{PortError, DomainPort};
pub use error::CoreError;
