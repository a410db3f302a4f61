//! Apothecary storefront library.
//!
//! The storefront and the `/admin` console share this crate so that handlers
//! can be exercised in tests without a running server.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session_state;
pub mod state;
