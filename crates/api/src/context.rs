use serde::{Deserialize, Serialize};

use shelfwatch_catalog::Catalog;
use shelfwatch_core::{DomainError, DomainResult, ManagerId, StoreId};
use shelfwatch_infra::Scope;

/// An already-authorized caller of the feed.
///
/// Authentication and role checks happen upstream; this only turns the
/// outcome into the [`Scope`] every read is filtered by.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Viewer {
    /// Sees every store.
    Admin,
    /// Sees only the store they manage.
    Manager { store_id: StoreId },
}

impl Viewer {
    pub fn scope(&self) -> Scope {
        match self {
            Viewer::Admin => Scope::All,
            Viewer::Manager { store_id } => Scope::Store(*store_id),
        }
    }

    /// Manager viewer for the store assigned to `manager` in the catalog.
    pub fn manager_of(catalog: &Catalog, manager: ManagerId) -> DomainResult<Self> {
        catalog
            .stores()
            .iter()
            .find(|s| s.manager == Some(manager))
            .map(|s| Viewer::Manager { store_id: s.id })
            .ok_or_else(|| {
                DomainError::not_found(format!("no store assigned to manager {manager}"))
            })
    }

    /// Manager viewer for an explicitly selected branch, which must exist.
    pub fn manager_for_store(catalog: &Catalog, store_id: StoreId) -> DomainResult<Self> {
        catalog
            .store(store_id)
            .map(|s| Viewer::Manager { store_id: s.id })
            .ok_or_else(|| DomainError::not_found(format!("store {store_id}")))
    }
}
