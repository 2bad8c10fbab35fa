pub mod achievements;
pub mod admin;
pub mod catalog;
pub mod journey;
