//! Static product catalog served by `GET /menu` and used to price order items.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Product {
    pub sku: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "precio")]
    pub price: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MenuCategory {
    #[serde(rename = "categoria")]
    pub name: String,
    #[serde(rename = "productos")]
    pub products: Vec<Product>,
}

/// Read-only in-memory catalog. Never persisted.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct Catalog {
    pub menu: Vec<MenuCategory>,
}

fn product(sku: &str, name: &str, price: f64) -> Product {
    Product {
        sku: sku.to_string(),
        name: name.to_string(),
        price,
    }
}

impl Catalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The restaurant menu.
    pub fn standard() -> Self {
        Self {
            menu: vec![
                MenuCategory {
                    name: "Cafeteria".to_string(),
                    products: vec![
                        product("CAF-001", "Cafe americano", 35.0),
                        product("CAF-002", "Latte", 55.0),
                        product("CAF-003", "Capuchino", 55.0),
                    ],
                },
                MenuCategory {
                    name: "Comida".to_string(),
                    products: vec![
                        product("COM-001", "Hamburguesa clasica", 120.0),
                        product("COM-002", "Tacos (5)", 95.0),
                        product("COM-003", "Ensalada", 110.0),
                    ],
                },
                MenuCategory {
                    name: "Postres".to_string(),
                    products: vec![
                        product("POS-001", "Pay de limon", 60.0),
                        product("POS-002", "Brownie", 65.0),
                    ],
                },
            ],
        }
    }

    pub fn find(&self, sku: &str) -> Option<&Product> {
        self.menu
            .iter()
            .flat_map(|c| c.products.iter())
            .find(|p| p.sku == sku)
    }
}
