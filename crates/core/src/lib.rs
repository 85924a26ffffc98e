//! `shelfwatch-core`: shared building blocks.
//!
//! This crate contains **pure** primitives (ids, errors, entity identity) used by
//! every other crate. No infrastructure concerns live here.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CityId, ManagerId, ProductId, StoreId};
