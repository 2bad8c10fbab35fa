//! OneShot core domain logic.
//!
//! This crate has no database or HTTP dependencies. Everything here is a
//! pure function of its inputs so the API layer, background tooling, and
//! tests can share one implementation of the recruiting journey rules.

pub mod error;
pub mod journey;
pub mod roles;
pub mod types;
