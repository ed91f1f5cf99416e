use async_trait::async_trait;
use serde::Serialize;

use orchestra_skill::{Result as SkillResult, Skill, SkillInput, SkillMetadata, SkillOutput};

use crate::error::Result;
use crate::skill_agent::SkillAgent;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Product {
    pub key: &'static str,
    pub name: &'static str,
    pub price: &'static str,
    pub specs: &'static str,
    pub stock: u32,
}

pub const PRODUCTS: [Product; 3] = [
    Product {
        key: "laptop",
        name: "UltraBook Pro",
        price: "$1299",
        specs: "16GB RAM, 512GB SSD, Intel i7",
        stock: 15,
    },
    Product {
        key: "phone",
        name: "SmartPhone X",
        price: "$899",
        specs: "128GB Storage, 5G, OLED Display",
        stock: 42,
    },
    Product {
        key: "tablet",
        name: "TabletMax",
        price: "$599",
        specs: "10-inch Display, 64GB Storage",
        stock: 8,
    },
];

/// First product whose key or name appears in the query, in catalogue order
pub fn find_product(query: &str) -> Option<&'static Product> {
    let query = query.to_lowercase();
    PRODUCTS
        .iter()
        .find(|p| query.contains(p.key) || query.contains(&p.name.to_lowercase()))
}

/// Product lookup: pricing, specifications and stock
pub struct ProductCatalogSkill {
    metadata: SkillMetadata,
}

impl ProductCatalogSkill {
    pub fn new() -> Self {
        Self {
            metadata: SkillMetadata::new(
                "search_product_catalog",
                "Product inquiries: pricing, specifications and inventory",
            )
            .with_tags(vec!["catalog", "products"]),
        }
    }

    pub fn search(query: &str) -> String {
        match find_product(query) {
            Some(p) => format!(
                "Product: {}\nPrice: {}\nSpecifications: {}\nIn Stock: {} units",
                p.name, p.price, p.specs, p.stock
            ),
            None => {
                let listing: Vec<String> = PRODUCTS
                    .iter()
                    .map(|p| format!("- {}: {}", p.name, p.price))
                    .collect();
                format!("Available Products:\n{}", listing.join("\n"))
            }
        }
    }
}

impl Default for ProductCatalogSkill {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Skill for ProductCatalogSkill {
    fn metadata(&self) -> &SkillMetadata {
        &self.metadata
    }

    async fn execute(&self, input: SkillInput) -> SkillResult<SkillOutput> {
        let query = input.require_text()?;
        let output = SkillOutput::text(Self::search(query));
        Ok(match find_product(query) {
            Some(product) => output.with_result("product", serde_json::to_value(product)?),
            None => output,
        })
    }
}

/// Agent named `catalog` owning the product search
pub fn catalog_agent() -> Result<SkillAgent> {
    SkillAgent::builder("catalog")
        .description("Product catalog: prices, specifications, stock")
        .skill(ProductCatalogSkill::new())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_by_key() {
        assert_eq!(
            ProductCatalogSkill::search("What laptops do you have available?"),
            "Product: UltraBook Pro\nPrice: $1299\nSpecifications: 16GB RAM, 512GB SSD, Intel i7\nIn Stock: 15 units"
        );
    }

    #[test]
    fn matches_by_product_name_case_insensitively() {
        assert_eq!(find_product("Is the TABLETMAX any good?").map(|p| p.key), Some("tablet"));
        assert_eq!(find_product("tell me about smartphone x").map(|p| p.key), Some("phone"));
    }

    #[test]
    fn first_match_wins_in_catalogue_order() {
        assert_eq!(find_product("phone or laptop?").map(|p| p.key), Some("laptop"));
    }

    #[test]
    fn lists_everything_without_a_match() {
        assert_eq!(
            ProductCatalogSkill::search("anything cheap?"),
            "Available Products:\n- UltraBook Pro: $1299\n- SmartPhone X: $899\n- TabletMax: $599"
        );
    }

    #[tokio::test]
    async fn structured_result_carries_product() {
        let out = ProductCatalogSkill::new()
            .execute(SkillInput::text("phone price"))
            .await
            .unwrap();
        assert_eq!(out.result["product"]["stock"], 42);
    }
}
