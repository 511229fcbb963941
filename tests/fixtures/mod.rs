//! Test fixtures: product rows and canned model responses

#![allow(dead_code)]

use copycat_recipes::models::source_item::SourceItem;

/// A product row with the category the pipeline should settle on
#[derive(Debug, Clone)]
pub struct ProductFixture {
    pub id: &'static str,
    pub product: &'static str,
    pub brand: &'static str,
    pub category_hint: Option<&'static str>,
    pub expected_category: &'static str,
}

pub const PRODUCT_FIXTURES: &[ProductFixture] = &[
    ProductFixture {
        id: "A",
        product: "Sour Cream & Onion Crisps",
        brand: "Pringles",
        category_hint: None,
        expected_category: "Chips",
    },
    ProductFixture {
        id: "B",
        product: "Heinz 57 Sauce",
        brand: "Heinz",
        category_hint: Some("Sauce"),
        expected_category: "Sauce",
    },
    ProductFixture {
        id: "C",
        product: "Cheddar Chips",
        brand: "BrandX",
        category_hint: None,
        expected_category: "Chips",
    },
    ProductFixture {
        id: "D",
        product: "Golden Oreo",
        brand: "Nabisco",
        category_hint: Some("cookie"),
        expected_category: "Cookies",
    },
    ProductFixture {
        id: "E",
        product: "Mystery Product",
        brand: "Acme",
        category_hint: None,
        expected_category: "Other",
    },
];

pub fn fixture_items() -> Vec<SourceItem> {
    PRODUCT_FIXTURES
        .iter()
        .map(|f| SourceItem::new(Some(f.id), f.product, f.brand, f.category_hint, None))
        .collect()
}

/// Items with identifiers `item-0` .. `item-{count-1}`
pub fn numbered_items(count: usize) -> Vec<SourceItem> {
    (0..count)
        .map(|i| {
            SourceItem::new(
                Some(&format!("item-{i}")),
                &format!("Product {i}"),
                "Acme",
                None,
                None,
            )
        })
        .collect()
}

/// A well-formed model answer wrapped in chatter, the way models often reply
pub const CHATTY_RESPONSE: &str = r#"Sure! Here is your copycat recipe:

{
  "title": "Homemade Copycat Crisps",
  "category": "Savory Treats",
  "introduction": "These crisps taste just like the original.",
  "prep_time": 15,
  "cook_time": "20 minutes",
  "total_time": 35,
  "yield": "4 servings",
  "ingredients": ["2 potatoes", "1 tbsp oil", "1 tsp salt"],
  "instructions": ["Slice", "Fry", "Season"],
  "storage_instructions": "Airtight container, 5 days.",
  "pro_tips": ["Slice thin", "Dry the slices"],
  "nutritional_comparison": "Less sodium than store-bought.",
  "faq": [
    {"q": "Can I bake them?", "a": "Yes, at 400F."},
    {"question": "Gluten free?"}
  ],
  "serving_suggestions": ["With dip"],
  "cost_comparison": "About $1 per batch."
}

Enjoy!"#;

pub const NO_JSON_RESPONSE: &str = "I'm sorry, I cannot create that recipe today.";
