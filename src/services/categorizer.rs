//! Product category reference data and keyword categorization.
//!
//! Categories are matched in table order, so the order of [`PRODUCT_CATEGORIES`]
//! is the tie-break when a product name matches keywords from several entries.

/// Category returned when nothing in the table matches.
pub const FALLBACK_CATEGORY: &str = "Other";

/// Canonical category name and the lowercase keywords that select it.
pub type CategoryTable = [(&'static str, &'static [&'static str])];

// ── Product categories ─────────────────────────────────────────────────

pub const PRODUCT_CATEGORIES: &CategoryTable = &[
    (
        "Sauce",
        &["sauce", "ketchup", "mustard", "mayo", "dressing", "gravy", "marinade"],
    ),
    (
        "Condiments",
        &["relish", "pickle", "spread", "jam", "jelly", "honey", "syrup"],
    ),
    ("Chips", &["chips", "crisps", "crackers", "wafers"]),
    (
        "Cookies",
        &["cookie", "biscuit", "wafer", "oreo", "shortbread"],
    ),
    (
        "Candy",
        &["candy", "chocolate", "gum", "mint", "sweet", "lollipop", "toffee"],
    ),
    (
        "Beverages",
        &["drink", "soda", "pop", "juice", "tea", "coffee", "water", "beer", "wine"],
    ),
    (
        "Snacks",
        &["snack", "popcorn", "pretzel", "nuts", "trail mix", "granola"],
    ),
    (
        "Baked Goods",
        &["bread", "roll", "bun", "muffin", "cake", "pastry", "donut", "bagel"],
    ),
    (
        "Breakfast",
        &["cereal", "oatmeal", "pancake", "waffle", "syrup"],
    ),
    (
        "Dairy",
        &["milk", "cheese", "yogurt", "butter", "cream", "ice cream"],
    ),
    (
        "Desserts",
        &["dessert", "pudding", "pie", "brownie", "ice cream"],
    ),
    ("Frozen Foods", &["frozen", "pizza", "ice cream", "popsicle"]),
    (
        "Meat",
        &["beef", "chicken", "pork", "turkey", "sausage", "bacon", "ham"],
    ),
    (
        "Seafood",
        &["fish", "shrimp", "crab", "lobster", "salmon", "tuna"],
    ),
    ("Spices", &["spice", "seasoning", "herb", "salt", "pepper"]),
    ("Pasta", &["pasta", "noodle", "spaghetti", "macaroni", "ramen"]),
];

/// Canonical category names in table order, for prompts and reporting.
pub fn category_names() -> impl Iterator<Item = &'static str> {
    PRODUCT_CATEGORIES.iter().map(|(name, _)| *name)
}

/// Categorize a product against [`PRODUCT_CATEGORIES`].
pub fn categorize(product_name: &str, brand_name: &str, provided: Option<&str>) -> String {
    categorize_with(PRODUCT_CATEGORIES, product_name, brand_name, provided)
}

/// Categorize a product against an explicit table.
///
/// A non-empty `provided` category that equals (case-insensitively) a canonical
/// name or one of its keywords is normalized to that canonical name. Otherwise
/// the combined `"<product> <brand>"` text is scanned for keyword substrings and
/// the first category in table order with a hit wins.
pub fn categorize_with(
    table: &CategoryTable,
    product_name: &str,
    brand_name: &str,
    provided: Option<&str>,
) -> String {
    if let Some(provided) = provided.map(str::trim).filter(|p| !p.is_empty()) {
        let provided = provided.to_lowercase();
        let normalized = table.iter().find(|(name, keywords)| {
            name.to_lowercase() == provided
                || keywords.iter().any(|k| k.to_lowercase() == provided)
        });
        if let Some((name, _)) = normalized {
            return name.to_string();
        }
    }

    let haystack = format!("{} {}", product_name, brand_name).to_lowercase();

    table
        .iter()
        .find(|(_, keywords)| {
            keywords
                .iter()
                .any(|keyword| haystack.contains(&keyword.to_lowercase()))
        })
        .map(|(name, _)| name.to_string())
        .unwrap_or_else(|| FALLBACK_CATEGORY.to_string())
}
