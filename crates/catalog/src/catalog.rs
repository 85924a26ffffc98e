use std::collections::{HashMap, HashSet};

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use shelfwatch_core::{CityId, DomainError, DomainResult, Entity, ProductId, StoreId};

use crate::entry::{City, Product, Store};

/// Raw catalog contents as loaded from persistence or a JSON file.
///
/// Not validated; turn it into a [`Catalog`] with [`Catalog::from_spec`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSpec {
    #[serde(default)]
    pub cities: Vec<City>,
    #[serde(default)]
    pub stores: Vec<Store>,
    #[serde(default)]
    pub products: Vec<Product>,
}

/// Validated, immutable registry of cities, stores, and products.
///
/// Invariants (checked at construction):
/// - ids are unique per entity kind
/// - every store references an existing city
/// - product codes are unique (case-insensitive)
#[derive(Debug, Clone)]
pub struct Catalog {
    cities: Vec<City>,
    stores: Vec<Store>,
    products: Vec<Product>,
    city_index: HashMap<CityId, usize>,
    store_index: HashMap<StoreId, usize>,
    product_index: HashMap<ProductId, usize>,
}

impl Catalog {
    pub fn new(
        cities: Vec<City>,
        stores: Vec<Store>,
        products: Vec<Product>,
    ) -> DomainResult<Self> {
        let city_index = index_by_id(&cities, "city")?;
        let store_index = index_by_id(&stores, "store")?;
        let product_index = index_by_id(&products, "product")?;

        for store in &stores {
            if !city_index.contains_key(&store.city_id) {
                return Err(DomainError::validation(format!(
                    "store {} references unknown city {}",
                    store.id, store.city_id
                )));
            }
        }

        let mut codes = HashSet::with_capacity(products.len());
        for product in &products {
            if product.code.trim().is_empty() {
                return Err(DomainError::validation(format!(
                    "product {} has an empty code",
                    product.id
                )));
            }
            if !codes.insert(product.code.to_lowercase()) {
                return Err(DomainError::validation(format!(
                    "duplicate product code '{}'",
                    product.code
                )));
            }
        }

        Ok(Self {
            cities,
            stores,
            products,
            city_index,
            store_index,
            product_index,
        })
    }

    pub fn from_spec(spec: CatalogSpec) -> DomainResult<Self> {
        Self::new(spec.cities, spec.stores, spec.products)
    }

    /// Parse and validate a JSON catalog (`{"cities": [...], "stores": [...], "products": [...]}`).
    pub fn from_json(json: &str) -> DomainResult<Self> {
        let spec: CatalogSpec = serde_json::from_str(json)
            .map_err(|e| DomainError::validation(format!("catalog json: {e}")))?;
        Self::from_spec(spec)
    }

    /// True when no (store, product) pair can be drawn.
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty() || self.products.is_empty()
    }

    pub fn city(&self, id: CityId) -> Option<&City> {
        self.city_index.get(&id).map(|&i| &self.cities[i])
    }

    pub fn store(&self, id: StoreId) -> Option<&Store> {
        self.store_index.get(&id).map(|&i| &self.stores[i])
    }

    pub fn product(&self, id: ProductId) -> Option<&Product> {
        self.product_index.get(&id).map(|&i| &self.products[i])
    }

    pub fn contains_pair(&self, store_id: StoreId, product_id: ProductId) -> bool {
        self.store_index.contains_key(&store_id) && self.product_index.contains_key(&product_id)
    }

    /// Cities sorted by display name.
    pub fn cities(&self) -> Vec<&City> {
        sorted_by_name(self.cities.iter())
    }

    pub fn stores(&self) -> &[Store] {
        &self.stores
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Branches located in a city, sorted by name. Empty for unknown cities.
    pub fn stores_in_city(&self, city_id: CityId) -> Vec<&Store> {
        sorted_by_name(self.stores.iter().filter(|s| s.city_id == city_id))
    }

    /// Draw one store and one product, each uniformly at random.
    pub fn pick_pair<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<(&Store, &Product)> {
        let store = self.stores.choose(rng)?;
        let product = self.products.choose(rng)?;
        Some((store, product))
    }
}

fn sorted_by_name<'a, E: Entity>(entries: impl Iterator<Item = &'a E>) -> Vec<&'a E> {
    let mut sorted: Vec<&E> = entries.collect();
    sorted.sort_by(|a, b| a.display_name().cmp(b.display_name()));
    sorted
}

fn index_by_id<E: Entity>(entries: &[E], kind: &str) -> DomainResult<HashMap<E::Id, usize>> {
    let mut index = HashMap::with_capacity(entries.len());
    for (pos, entry) in entries.iter().enumerate() {
        if index.insert(entry.id(), pos).is_some() {
            return Err(DomainError::validation(format!(
                "duplicate {kind} id {:?}",
                entry.id()
            )));
        }
    }
    Ok(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sample() -> (Catalog, CityId, StoreId, StoreId) {
        let karachi = CityId::new();
        let lahore = CityId::new();
        let clifton = StoreId::new();
        let saddar = StoreId::new();
        let gulberg = StoreId::new();

        let catalog = Catalog::new(
            vec![City::new(lahore, "Lahore"), City::new(karachi, "Karachi")],
            vec![
                Store::new(saddar, "Saddar", karachi),
                Store::new(clifton, "Clifton", karachi).with_company("FreshMart"),
                Store::new(gulberg, "Gulberg", lahore),
            ],
            vec![
                Product::new(ProductId::new(), "MILK-1L", "Milk 1L"),
                Product::new(ProductId::new(), "BREAD", "Bread"),
            ],
        )
        .unwrap();

        (catalog, karachi, clifton, saddar)
    }

    #[test]
    fn stores_in_city_are_sorted_by_name() {
        let (catalog, karachi, clifton, saddar) = sample();
        let ids: Vec<StoreId> = catalog.stores_in_city(karachi).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![clifton, saddar]);
    }

    #[test]
    fn stores_in_unknown_city_is_empty() {
        let (catalog, ..) = sample();
        assert!(catalog.stores_in_city(CityId::new()).is_empty());
    }

    #[test]
    fn cities_are_sorted_by_name() {
        let (catalog, ..) = sample();
        let names: Vec<&str> = catalog.cities().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Karachi", "Lahore"]);
    }

    #[test]
    fn store_with_unknown_city_is_rejected() {
        let err = Catalog::new(
            vec![],
            vec![Store::new(StoreId::new(), "Orphan", CityId::new())],
            vec![],
        )
        .unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("unknown city")));
    }

    #[test]
    fn duplicate_product_codes_are_rejected_case_insensitively() {
        let err = Catalog::new(
            vec![],
            vec![],
            vec![
                Product::new(ProductId::new(), "milk", "Milk"),
                Product::new(ProductId::new(), "MILK", "Milk (again)"),
            ],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DomainError::Validation(msg) if msg.contains("duplicate product code")
        ));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let city = CityId::new();
        let err = Catalog::new(vec![City::new(city, "A"), City::new(city, "B")], vec![], vec![])
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(msg) if msg.contains("duplicate city id")));
    }

    #[test]
    fn empty_when_no_store_or_no_product() {
        let city = CityId::new();
        let only_stores = Catalog::new(
            vec![City::new(city, "A")],
            vec![Store::new(StoreId::new(), "S", city)],
            vec![],
        )
        .unwrap();
        assert!(only_stores.is_empty());

        let mut rng = StdRng::seed_from_u64(7);
        assert!(only_stores.pick_pair(&mut rng).is_none());

        let (full, ..) = sample();
        assert!(!full.is_empty());
        let (store, product) = full.pick_pair(&mut rng).unwrap();
        assert!(full.contains_pair(store.id, product.id));
    }

    #[test]
    fn json_catalog_is_parsed_and_validated() {
        let (catalog, karachi, clifton, _) = sample();
        let spec = CatalogSpec {
            cities: catalog.cities().into_iter().cloned().collect(),
            stores: catalog.stores().to_vec(),
            products: catalog.products().to_vec(),
        };
        let json = serde_json::to_string(&spec).unwrap();

        let parsed = Catalog::from_json(&json).unwrap();
        assert_eq!(parsed.store(clifton).unwrap().city_id, karachi);
        assert_eq!(parsed.store(clifton).unwrap().company.as_deref(), Some("FreshMart"));
        assert_eq!(parsed.products().len(), 2);

        assert!(Catalog::from_json("{not json").is_err());
    }
}
