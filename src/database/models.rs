// Copyright 2023 Remi Bernotavicius

use chrono::NaiveDateTime;
use derive_more::Display;
use diesel::associations::Identifiable;
use diesel::deserialize::Queryable;
use diesel::expression::Selectable;
use diesel::prelude::Insertable;
use diesel_derive_newtype::DieselNewType;
use serde::{Deserialize, Serialize};

#[derive(
    DieselNewType, Display, Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize,
)]
pub struct UserId(i32);

impl UserId {
    pub fn new(raw: i32) -> Self {
        Self(raw)
    }
}

#[derive(Queryable, Selectable, Identifiable, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::database::schema::users)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::database::schema::users)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_admin: bool,
}

#[derive(
    DieselNewType, Display, Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize,
)]
pub struct TagId(i32);

impl TagId {
    pub fn new(raw: i32) -> Self {
        Self(raw)
    }
}

#[derive(Queryable, Selectable, Identifiable, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::database::schema::tags)]
pub struct Tag {
    pub id: TagId,
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::database::schema::tags)]
pub struct NewTag {
    pub name: String,
    pub color: String,
    pub slug: String,
}

#[derive(
    DieselNewType, Display, Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize,
)]
pub struct IngredientId(i32);

impl IngredientId {
    pub fn new(raw: i32) -> Self {
        Self(raw)
    }
}

#[derive(Queryable, Selectable, Identifiable, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::database::schema::ingredients)]
pub struct NewIngredient {
    pub name: String,
    pub measurement_unit: String,
}

#[derive(
    DieselNewType, Display, Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize,
)]
pub struct RecipeId(i32);

impl RecipeId {
    pub fn new(raw: i32) -> Self {
        Self(raw)
    }
}

#[derive(Queryable, Selectable, Identifiable, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct Recipe {
    pub id: RecipeId,
    pub author_id: UserId,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image_ref: String,
    pub created_at: NaiveDateTime,
}

/// Listing subset of a recipe row, also the shape of the summary returned by
/// the favorite and shopping-cart endpoints.
#[derive(Queryable, Selectable, Identifiable, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct RecipeSummary {
    pub id: RecipeId,
    pub name: String,
    pub image_ref: String,
    pub cooking_time: i32,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::database::schema::recipes)]
pub struct NewRecipe {
    pub author_id: UserId,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image_ref: String,
}

#[derive(
    DieselNewType, Display, Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize,
)]
pub struct RecipeIngredientId(i32);

#[derive(Queryable, Selectable, Identifiable, Clone, Debug, PartialEq)]
#[diesel(table_name = crate::database::schema::recipe_ingredients)]
pub struct RecipeIngredient {
    pub id: RecipeIngredientId,
    pub recipe_id: RecipeId,
    pub ingredient_id: IngredientId,
    pub amount: i32,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::database::schema::recipe_ingredients)]
pub struct NewRecipeIngredient {
    pub recipe_id: RecipeId,
    pub ingredient_id: IngredientId,
    pub amount: i32,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Clone, Debug, PartialEq)]
#[diesel(primary_key(recipe_id, tag_id))]
#[diesel(table_name = crate::database::schema::recipe_tags)]
pub struct RecipeTag {
    pub recipe_id: RecipeId,
    pub tag_id: TagId,
}

// The relation tables are written and probed through their unique pairs;
// nothing reads the rows back, so only the insert shapes exist here.
#[derive(Insertable, Debug)]
#[diesel(table_name = crate::database::schema::favorites)]
pub struct NewFavorite {
    pub user_id: UserId,
    pub recipe_id: RecipeId,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::database::schema::cart_entries)]
pub struct NewCartEntry {
    pub user_id: UserId,
    pub recipe_id: RecipeId,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = crate::database::schema::subscriptions)]
pub struct NewSubscription {
    pub user_id: UserId,
    pub author_id: UserId,
}
