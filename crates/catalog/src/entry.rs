use serde::{Deserialize, Serialize};

use shelfwatch_core::{CityId, Entity, ManagerId, ProductId, StoreId};

/// A city stores are located in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
}

impl City {
    pub fn new(id: CityId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A store (branch). Bound to exactly one city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: StoreId,
    pub name: String,
    pub city_id: CityId,
    /// Operating company, when the branch belongs to a chain.
    #[serde(default)]
    pub company: Option<String>,
    /// Manager credential reference; checked by the access-control layer, not here.
    #[serde(default)]
    pub manager: Option<ManagerId>,
}

impl Store {
    pub fn new(id: StoreId, name: impl Into<String>, city_id: CityId) -> Self {
        Self {
            id,
            name: name.into(),
            city_id,
            company: None,
            manager: None,
        }
    }

    pub fn with_company(mut self, company: impl Into<String>) -> Self {
        self.company = Some(company.into());
        self
    }

    pub fn with_manager(mut self, manager: ManagerId) -> Self {
        self.manager = Some(manager);
        self
    }
}

/// A sellable product.
///
/// `code` is globally unique across the catalog; `name` is for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub code: String,
    pub name: String,
}

impl Product {
    pub fn new(id: ProductId, code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            code: code.into(),
            name: name.into(),
        }
    }
}

impl Entity for City {
    type Id = CityId;

    fn id(&self) -> CityId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

impl Entity for Store {
    type Id = StoreId;

    fn id(&self) -> StoreId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }
}
