use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::recipe::{FaqItem, IngredientsList, NormalizedRecord, NutritionalInfo};

/// Minutes as stored in an INTEGER column, saturating at `i32::MAX`.
fn minutes_column(minutes: u32) -> i32 {
    i32::try_from(minutes).unwrap_or(i32::MAX)
}

/// Insert a finished recipe and return its id
pub async fn insert_recipe(pool: &PgPool, record: &NormalizedRecord) -> Result<Uuid, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO recipes (
            title, brand_name, category, prep_time, cook_time, total_time, yield,
            ingredients, instructions, storage_instructions, recipe_variations,
            special_equipment, pro_tips, nutritional_info, faq, serving_suggestions,
            cost_comparison, introduction, seo_meta_description, image_url
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)
        RETURNING id
        "#,
    )
    .bind(&record.title)
    .bind(&record.brand_name)
    .bind(&record.category)
    .bind(minutes_column(record.prep_time))
    .bind(minutes_column(record.cook_time))
    .bind(minutes_column(record.total_time))
    .bind(&record.yield_amount)
    .bind(Json(&record.ingredients))
    .bind(&record.instructions)
    .bind(&record.storage_instructions)
    .bind(&record.recipe_variations)
    .bind(&record.special_equipment)
    .bind(&record.pro_tips)
    .bind(Json(&record.nutritional_info))
    .bind(Json(&record.faq))
    .bind(&record.serving_suggestions)
    .bind(&record.cost_comparison)
    .bind(&record.introduction)
    .bind(&record.seo_meta_description)
    .bind(&record.image_url)
    .fetch_one(pool)
    .await?;

    row.try_get("id")
}

/// Get a recipe by id
pub async fn get_recipe(pool: &PgPool, id: Uuid) -> Result<Option<NormalizedRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT title, brand_name, category, prep_time, cook_time, total_time, yield,
               ingredients, instructions, storage_instructions, recipe_variations,
               special_equipment, pro_tips, nutritional_info, faq, serving_suggestions,
               cost_comparison, introduction, seo_meta_description, image_url
        FROM recipes
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    let Some(r) = row else {
        return Ok(None);
    };

    let minutes = |column: &str| -> Result<u32, sqlx::Error> {
        let value: i32 = r.try_get(column)?;
        Ok(value.max(0) as u32)
    };
    let ingredients: Json<IngredientsList> = r.try_get("ingredients")?;
    let nutritional_info: Json<NutritionalInfo> = r.try_get("nutritional_info")?;
    let faq: Json<Vec<FaqItem>> = r.try_get("faq")?;

    Ok(Some(NormalizedRecord {
        title: r.try_get("title")?,
        brand_name: r.try_get("brand_name")?,
        category: r.try_get("category")?,
        prep_time: minutes("prep_time")?,
        cook_time: minutes("cook_time")?,
        total_time: minutes("total_time")?,
        yield_amount: r.try_get("yield")?,
        ingredients: ingredients.0,
        instructions: r.try_get("instructions")?,
        storage_instructions: r.try_get("storage_instructions")?,
        recipe_variations: r.try_get("recipe_variations")?,
        special_equipment: r.try_get("special_equipment")?,
        pro_tips: r.try_get("pro_tips")?,
        nutritional_info: nutritional_info.0,
        faq: faq.0,
        serving_suggestions: r.try_get("serving_suggestions")?,
        cost_comparison: r.try_get("cost_comparison")?,
        introduction: r.try_get("introduction")?,
        seo_meta_description: r.try_get("seo_meta_description")?,
        image_url: r.try_get("image_url")?,
    }))
}

/// Delete a recipe by id, returning whether a row was removed
pub async fn delete_recipe(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM recipes WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
