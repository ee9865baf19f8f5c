//! Response shapes for the JSON surface. Rows from the store come out of
//! here with their relation flags (`is_favorited`, `is_in_shopping_cart`,
//! `is_subscribed`) resolved against the viewing user.

use crate::database;
use crate::database::models::{
    Ingredient, IngredientId, Recipe, RecipeId, RecipeSummary, Tag, TagId, User, UserId,
};
use crate::relations::{self, Relation};
use crate::{catalog, recipe_ingredients, Result};
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct TagOut {
    pub id: TagId,
    pub name: String,
    pub color: String,
    pub slug: String,
}

impl From<Tag> for TagOut {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            name: tag.name,
            color: tag.color,
            slug: tag.slug,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct IngredientOut {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
}

impl From<Ingredient> for IngredientOut {
    fn from(ingredient: Ingredient) -> Self {
        Self {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct UserOut {
    pub id: UserId,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

/// `is_subscribed` is false for anonymous viewers and for the user looking
/// at themselves.
pub fn user_out(
    conn: &mut database::Connection,
    user: User,
    viewer: Option<UserId>,
) -> Result<UserOut> {
    let is_subscribed = match viewer {
        Some(viewer) if viewer != user.id => relations::exists(
            conn,
            Relation::Subscription {
                user: viewer,
                author: user.id,
            },
        )?,
        _ => false,
    };
    Ok(UserOut {
        id: user.id,
        email: user.email,
        username: user.username,
        first_name: user.first_name,
        last_name: user.last_name,
        is_subscribed,
    })
}

/// An ingredient line inside a full recipe body.
#[derive(Serialize, Debug)]
pub struct IngredientAmountOut {
    pub id: IngredientId,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

#[derive(Serialize, Debug)]
pub struct RecipeOut {
    pub id: RecipeId,
    pub tags: Vec<TagOut>,
    pub author: UserOut,
    pub ingredients: Vec<IngredientAmountOut>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
    pub name: String,
    pub image: String,
    pub text: String,
    pub cooking_time: i32,
}

pub fn recipe_out(
    conn: &mut database::Connection,
    recipe: Recipe,
    viewer: Option<UserId>,
) -> Result<RecipeOut> {
    let tags = catalog::tags_for_recipe(conn, recipe.id)?
        .into_iter()
        .map(TagOut::from)
        .collect();
    let ingredients = recipe_ingredients::list(conn, recipe.id)?
        .into_iter()
        .map(|(line, ingredient)| IngredientAmountOut {
            id: ingredient.id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
            amount: line.amount,
        })
        .collect();
    let author = catalog::get_user(conn, recipe.author_id)?;
    let author = user_out(conn, author, viewer)?;

    let (is_favorited, is_in_shopping_cart) = match viewer {
        Some(user) => (
            relations::exists(
                conn,
                Relation::Favorite {
                    user,
                    recipe: recipe.id,
                },
            )?,
            relations::exists(
                conn,
                Relation::ShoppingCart {
                    user,
                    recipe: recipe.id,
                },
            )?,
        ),
        None => (false, false),
    };

    Ok(RecipeOut {
        id: recipe.id,
        tags,
        author,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image_ref,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

/// The short recipe body used by the toggle responses and the per-author
/// lists under subscriptions.
#[derive(Serialize, Debug)]
pub struct RecipeSummaryOut {
    pub id: RecipeId,
    pub name: String,
    pub image: String,
    pub cooking_time: i32,
}

impl From<RecipeSummary> for RecipeSummaryOut {
    fn from(summary: RecipeSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            image: summary.image_ref,
            cooking_time: summary.cooking_time,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct AuthorOut {
    #[serde(flatten)]
    pub user: UserOut,
    pub recipes: Vec<RecipeSummaryOut>,
    pub recipes_count: i64,
}

/// `recipes_limit` caps the embedded recipe list without touching the
/// count, which always reflects the author's whole catalog.
pub fn author_with_recipes(
    conn: &mut database::Connection,
    author: User,
    viewer: Option<UserId>,
    recipes_limit: Option<i64>,
) -> Result<AuthorOut> {
    let recipes = catalog::recipes_by_author(conn, author.id, recipes_limit)?
        .into_iter()
        .map(RecipeSummaryOut::from)
        .collect();
    let recipes_count = catalog::count_recipes_by_author(conn, author.id)?;
    let user = user_out(conn, author, viewer)?;
    Ok(AuthorOut {
        user,
        recipes,
        recipes_count,
    })
}

#[test]
fn author_body_is_flat() {
    let author = AuthorOut {
        user: UserOut {
            id: UserId::new(7),
            email: "vp@example.com".into(),
            username: "vpupkin".into(),
            first_name: "Vasily".into(),
            last_name: "Pupkin".into(),
            is_subscribed: true,
        },
        recipes: vec![],
        recipes_count: 0,
    };
    let value = serde_json::to_value(&author).unwrap();
    assert_eq!(value["username"], "vpupkin");
    assert_eq!(value["is_subscribed"], true);
    assert_eq!(value["recipes_count"], 0);
    assert!(value.get("user").is_none());
}
