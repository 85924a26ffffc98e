//! Catalog of cities, stores, and products.
//!
//! Loaded once per process from the persistence collaborator and read-only
//! afterwards, so it is shared by reference (`Arc<Catalog>`) without locking.

pub mod catalog;
pub mod entry;

pub use catalog::{Catalog, CatalogSpec};
pub use entry::{City, Product, Store};
