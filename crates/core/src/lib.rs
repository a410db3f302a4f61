//! Apothecary Core - Shared domain types.
//!
//! This crate provides the types used across the Apothecary components:
//! - `storefront` - Customer-facing pharmacy storefront and the `/admin` console
//! - `cli` - Command-line tools for migrations, seeding and admin grants
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP clients. Database encoding is available behind the
//! `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, emails, slugs and status enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
