//! Implementation of the `#[derive(Searchable)]` macro.
//!
//! This module turns `#[search(...)]` field annotations into the static
//! descriptor table and value accessor the esform compiler walks.

mod attrs;
mod derive;

pub use derive::searchable_derive_impl;
