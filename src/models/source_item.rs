use serde::{Deserialize, Serialize};

/// One input row describing a product that needs a generated recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceItem {
    pub id: String,
    pub product_name: String,
    pub brand_name: String,
    pub category_hint: Option<String>,
    pub image_url: Option<String>,
}

impl SourceItem {
    /// Build an item, synthesizing the identifier from product and brand when
    /// no explicit one is given.
    pub fn new(
        id: Option<&str>,
        product_name: &str,
        brand_name: &str,
        category_hint: Option<&str>,
        image_url: Option<&str>,
    ) -> Self {
        let product_name = product_name.trim().to_string();
        let brand_name = brand_name.trim().to_string();
        let id = match id.map(str::trim).filter(|s| !s.is_empty()) {
            Some(explicit) => explicit.to_string(),
            None => format!("{}_{}", product_name, brand_name),
        };

        Self {
            id,
            product_name,
            brand_name,
            category_hint: non_empty(category_hint),
            image_url: non_empty(image_url),
        }
    }

    /// Product name as it should appear in prose: the brand is prefixed unless
    /// it is already part of the product name (case-insensitive).
    pub fn display_name(&self) -> String {
        if self.brand_name.is_empty()
            || self
                .product_name
                .to_lowercase()
                .contains(&self.brand_name.to_lowercase())
        {
            self.product_name.clone()
        } else {
            format!("{} {}", self.brand_name, self.product_name)
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
