use garde::Validate;
use serde::{Deserialize, Serialize};

/// Maximum length of the SEO meta description, in Unicode code points.
pub const SEO_DESCRIPTION_MAX_CHARS: usize = 160;

/// Ingredient list, always wrapped as `{"items": [...]}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngredientsList {
    pub items: Vec<String>,
}

/// Nutrition details. `text` carries the free-form homemade vs. store-bought
/// comparison; the remaining fields are filled when the model reports them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionalInfo {
    pub text: String,
    pub calories: Option<u32>,
    pub protein: Option<String>,
    pub carbs: Option<String>,
    pub fat: Option<String>,
    pub sugar: Option<String>,
    pub fiber: Option<String>,
    pub sodium: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct FaqItem {
    #[garde(length(min = 1))]
    pub question: String,

    #[garde(length(min = 1))]
    pub answer: String,
}

/// Canonical recipe record handed to a persistence sink.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
pub struct NormalizedRecord {
    #[garde(skip)]
    pub title: String,

    #[garde(length(max = 200))]
    pub brand_name: String,

    #[garde(length(min = 1, max = 100))]
    pub category: String,

    #[garde(skip)]
    pub prep_time: u32,

    #[garde(skip)]
    pub cook_time: u32,

    #[garde(skip)]
    pub total_time: u32,

    #[serde(rename = "yield")]
    #[garde(skip)]
    pub yield_amount: String,

    #[garde(skip)]
    pub ingredients: IngredientsList,

    #[garde(skip)]
    pub instructions: String,

    #[garde(skip)]
    pub storage_instructions: String,

    #[garde(skip)]
    pub recipe_variations: String,

    #[garde(skip)]
    pub special_equipment: String,

    #[garde(skip)]
    pub pro_tips: String,

    #[garde(skip)]
    pub nutritional_info: NutritionalInfo,

    #[garde(dive)]
    pub faq: Vec<FaqItem>,

    #[garde(skip)]
    pub serving_suggestions: String,

    #[garde(skip)]
    pub cost_comparison: String,

    #[garde(skip)]
    pub introduction: String,

    #[garde(length(chars, max = 160))]
    pub seo_meta_description: String,

    #[garde(skip)]
    pub image_url: String,
}
