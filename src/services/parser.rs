//! Normalization of model output into [`NormalizedRecord`].
//!
//! The model is asked for a single JSON object but frequently wraps it in prose,
//! so the candidate payload is everything from the first `{` to the last `}`.
//! Every field has a default; only the absence of a JSON object is an error.

use serde_json::{Map, Value};

use crate::models::recipe::{
    FaqItem, IngredientsList, NormalizedRecord, NutritionalInfo, SEO_DESCRIPTION_MAX_CHARS,
};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("no JSON object found in model response")]
    NoJsonObject,

    #[error("model response contained malformed JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("model response JSON is not an object")]
    NotAnObject,
}

/// Parse raw model text into a normalized record.
pub fn parse(raw_text: &str) -> Result<NormalizedRecord, ParseError> {
    let payload = extract_json_object(raw_text).ok_or(ParseError::NoJsonObject)?;
    let value: Value = serde_json::from_str(payload)?;
    match value {
        Value::Object(fields) => Ok(normalize(&fields)),
        _ => Err(ParseError::NotAnObject),
    }
}

/// Slice between the first `{` and the last `}`, inclusive.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// First `max_chars` code points of `text`. Never splits a multi-byte character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

fn normalize(fields: &Map<String, Value>) -> NormalizedRecord {
    let introduction = first_text(fields, &["introduction", "description"]);
    let seo_meta_description = truncate_chars(&introduction, SEO_DESCRIPTION_MAX_CHARS).to_string();

    NormalizedRecord {
        title: text(fields, "title"),
        brand_name: text(fields, "brand_name"),
        category: text(fields, "category"),
        prep_time: minutes(fields.get("prep_time")),
        cook_time: minutes(fields.get("cook_time")),
        total_time: minutes(fields.get("total_time")),
        yield_amount: text(fields, "yield"),
        ingredients: ingredients(fields.get("ingredients")),
        instructions: instructions(fields.get("instructions")),
        storage_instructions: text(fields, "storage_instructions"),
        recipe_variations: text(fields, "recipe_variations"),
        special_equipment: text(fields, "special_equipment"),
        pro_tips: text(fields, "pro_tips"),
        nutritional_info: nutrition(fields),
        faq: faq(fields.get("faq")),
        serving_suggestions: text(fields, "serving_suggestions"),
        cost_comparison: text(fields, "cost_comparison"),
        introduction,
        seo_meta_description,
        image_url: text(fields, "image_url"),
    }
}

/// Render a JSON value as display text. Lists are joined one entry per line.
fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.trim().to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(entries) => entries
            .iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => map
            .values()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn text(fields: &Map<String, Value>, key: &str) -> String {
    fields.get(key).map(value_to_text).unwrap_or_default()
}

fn first_text(fields: &Map<String, Value>, keys: &[&str]) -> String {
    keys.iter()
        .map(|key| text(fields, key))
        .find(|s| !s.is_empty())
        .unwrap_or_default()
}

/// Whole minutes from a number or a string such as "15 minutes".
/// Negative, fractional-only or unparseable values become 0.
fn minutes(value: Option<&Value>) -> u32 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .map(|m| m.min(u32::MAX as u64) as u32)
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let digits: String = s
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            digits.parse().unwrap_or(0)
        }
        _ => 0,
    }
}

fn ingredients(value: Option<&Value>) -> IngredientsList {
    let items = match value {
        Some(Value::Array(entries)) => entries
            .iter()
            .map(value_to_text)
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::Object(map)) if map.contains_key("items") => {
            return ingredients(map.get("items"));
        }
        Some(Value::String(s)) => s
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect(),
        Some(other @ (Value::Object(_) | Value::Number(_) | Value::Bool(_))) => {
            vec![value_to_text(other)]
        }
        _ => Vec::new(),
    };
    IngredientsList { items }
}

fn instructions(value: Option<&Value>) -> String {
    match value {
        Some(Value::Array(steps)) => steps
            .iter()
            .enumerate()
            .map(|(i, step)| format!("{}. {}", i + 1, value_to_text(step)))
            .collect::<Vec<_>>()
            .join("\n"),
        Some(Value::String(s)) => s.clone(),
        Some(other) => value_to_text(other),
        None => String::new(),
    }
}

fn nutrition(fields: &Map<String, Value>) -> NutritionalInfo {
    let mut info = NutritionalInfo {
        text: text(fields, "nutritional_comparison"),
        ..Default::default()
    };

    let structured = ["nutritional_info", "nutrition"]
        .iter()
        .find_map(|key| fields.get(*key).and_then(Value::as_object));

    if let Some(details) = structured {
        let field = |key: &str| {
            details
                .get(key)
                .map(value_to_text)
                .filter(|s| !s.is_empty())
        };
        info.calories = details.get("calories").and_then(|v| match minutes(Some(v)) {
            0 => None,
            kcal => Some(kcal),
        });
        info.protein = field("protein");
        info.carbs = field("carbs");
        info.fat = field("fat");
        info.sugar = field("sugar");
        info.fiber = field("fiber");
        info.sodium = field("sodium");
        if info.text.is_empty() {
            info.text = field("text").unwrap_or_default();
        }
    }

    info
}

fn faq(value: Option<&Value>) -> Vec<FaqItem> {
    let Some(Value::Array(entries)) = value else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|entry| {
            let question = first_text(entry, &["question", "q"]);
            let answer = first_text(entry, &["answer", "a"]);
            (!question.is_empty() && !answer.is_empty()).then_some(FaqItem { question, answer })
        })
        .collect()
}
