//! Prompt rendering for copycat recipe generation.

use crate::models::source_item::SourceItem;
use crate::services::categorizer;

pub const SYSTEM_PROMPT: &str = concat!(
    "You are a professional chef and recipe developer specializing in creating copycat ",
    "recipes of popular branded products. IMPORTANT: Do NOT duplicate brand names in your ",
    "recipes. If the product name already includes the brand (e.g., 'Heinz 57 Sauce'), do not ",
    "add the brand name again (avoid 'Heinz Heinz 57 Sauce'). Provide extremely detailed ",
    "nutritional comparisons between homemade and store-bought versions. Include specific cost ",
    "breakdowns with actual dollar amounts for both homemade ingredients and store-bought ",
    "products. Your content should be keyword-rich and SEO-optimized, focusing on terms like ",
    "'homemade', 'copycat recipe', 'make at home', etc. Always answer with a single JSON object."
);

/// Response schema shown to the model.
pub const RESPONSE_SCHEMA: &str = r#"{
  "title": "Recipe title",
  "category": "Recipe category",
  "introduction": "Introduction text",
  "prep_time": 15,
  "cook_time": 30,
  "total_time": 45,
  "yield": "4 servings",
  "ingredients": ["Ingredient 1", "Ingredient 2"],
  "instructions": ["Step 1", "Step 2"],
  "storage_instructions": "Storage instructions text",
  "pro_tips": ["Tip 1", "Tip 2", "Tip 3"],
  "nutritional_comparison": "Nutritional comparison text",
  "faq": [
    {"q": "Question 1", "a": "Answer 1"},
    {"q": "Question 2", "a": "Answer 2"}
  ],
  "serving_suggestions": ["Suggestion 1", "Suggestion 2"],
  "cost_comparison": "Cost comparison text",
  "image_url": "URL to image"
}"#;

/// Render the user prompt for one item.
pub fn render_user_prompt(item: &SourceItem) -> String {
    let full_name = item.display_name();

    let brand_note = if item.brand_name.is_empty() || full_name == item.product_name {
        format!(
            "The product is '{}' - it already contains the brand name, do not repeat it.",
            full_name
        )
    } else {
        format!(
            "The product is '{}' - mention '{}' exactly once.",
            full_name, item.brand_name
        )
    };

    let category_section = match item.category_hint.as_deref() {
        Some(category) => format!("This recipe belongs to the '{}' category.", category),
        None => format!(
            "Categorize this recipe into ONE of the following categories: {}, or {}.",
            categorizer::category_names().collect::<Vec<_>>().join(", "),
            categorizer::FALLBACK_CATEGORY
        ),
    };

    let image_section = match item.image_url.as_deref() {
        Some(url) => format!("\nIMPORTANT: Include the image_url in your response: {}\n", url),
        None => String::new(),
    };

    format!(
        r#"
Generate a unique, creative homemade copycat recipe for {full_name}. This should closely replicate the original product using common household ingredients while allowing for customization and improved nutritional value. {category_section}

### **Recipe Title:**
- Create a UNIQUE, CATCHY, and CREATIVE title that contains relevant SEO keywords.
- Make sure the brand name appears EXACTLY ONCE in the title. {brand_note}

### **Introduction (SEO-Optimized)**
- Write an extensive, keyword-rich SEO description about {full_name}, covering its history, flavor profile and texture.
- Mention benefits of a homemade version (healthier, customizable, cost-effective).
- Include a **personal anecdote** or a **story** to make it engaging.

### **Recipe Details**
- **Prep Time:** X minutes
- **Cook Time:** X minutes
- **Total Time:** X minutes
- **Yield:** X servings

### **Ingredients**
Provide a **detailed ingredient list** in both **US and metric measurements**.

### **Instructions**
Step-by-step cooking instructions that explain all necessary steps, techniques and timing.

### **Storage Instructions**
Explain how long the product lasts in the fridge, freezer, or pantry.

### **Pro Tips**
Provide **3 expert-level cooking tips** to perfect the recipe.

### **Nutritional Comparison**
Compare the homemade and store-bought versions with specific values (calories, fat, sodium, carbs, protein).

### **Common Questions & Troubleshooting**
Include an **FAQ section** with 5-7 common questions.

### **Serving Suggestions**
List creative ways to use the homemade product.

### **Cost Comparison**
Provide a **detailed cost breakdown** with actual prices, the cost per serving and the savings compared to the store-bought product.

IMPORTANT: Format your response as a single JSON object with the following structure:
{schema}
{image_section}"#,
        full_name = full_name,
        category_section = category_section,
        brand_note = brand_note,
        schema = RESPONSE_SCHEMA,
        image_section = image_section,
    )
}
