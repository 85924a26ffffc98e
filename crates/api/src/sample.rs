//! Built-in demo catalog used when no catalog file is configured.

use shelfwatch_catalog::{Catalog, City, Product, Store};
use shelfwatch_core::{CityId, DomainResult, ManagerId, ProductId, StoreId};

const CITIES: &[(&str, &[(&str, &str)])] = &[
    ("Karachi", &[("Saddar", "FreshMart"), ("Clifton", "FreshMart"), ("Gulshan", "Daily Needs")]),
    ("Lahore", &[("Gulberg", "FreshMart"), ("Model Town", "Daily Needs")]),
    ("Islamabad", &[("F-7 Markaz", "Capital Stores"), ("Blue Area", "Daily Needs")]),
];

const PRODUCTS: &[(&str, &str)] = &[
    ("MILK-1L", "Fresh Milk 1L"),
    ("BREAD-WHT", "White Bread"),
    ("EGGS-12", "Eggs (dozen)"),
    ("RICE-5KG", "Basmati Rice 5kg"),
    ("OIL-1L", "Cooking Oil 1L"),
    ("SUGAR-1KG", "Sugar 1kg"),
    ("TEA-500G", "Black Tea 500g"),
    ("SOAP-BAR", "Bath Soap"),
];

/// Three cities, seven branches (each with its own manager), eight products.
pub fn sample_catalog() -> DomainResult<Catalog> {
    let mut cities = Vec::with_capacity(CITIES.len());
    let mut stores = Vec::new();

    for (city_name, branches) in CITIES {
        let city = City::new(CityId::new(), *city_name);
        for (branch, company) in *branches {
            stores.push(
                Store::new(StoreId::new(), *branch, city.id)
                    .with_company(*company)
                    .with_manager(ManagerId::new()),
            );
        }
        cities.push(city);
    }

    let products = PRODUCTS
        .iter()
        .map(|(code, name)| Product::new(ProductId::new(), *code, *name))
        .collect();

    Catalog::new(cities, stores, products)
}
