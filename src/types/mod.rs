//! Type definitions for the Commvault client
//!
//! Types are organized into focused submodules:
//! - `identifiers`: Newtype wrappers for client and subclient ids
//! - `options`: Session options and builder
//! - `records`: Normalized client records and per-subclient results

pub mod identifiers;
pub mod options;
pub mod records;
