//! Core types for Apothecary.
//!
//! This module provides type-safe wrappers for catalog and account concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use slug::{Slug, SlugError};
pub use status::*;
