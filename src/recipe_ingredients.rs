// Copyright 2023 Remi Bernotavicius

use crate::database;
use crate::database::models::{
    Ingredient, IngredientId, NewRecipeIngredient, RecipeId, RecipeIngredient,
};
use crate::error::{constraint_error, CatalogError};
use crate::Result;
use diesel::Connection as _;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use serde::Deserialize;
use std::collections::HashSet;

pub const MIN_AMOUNT: i32 = 1;
pub const MAX_AMOUNT: i32 = 5000;

/// One requested line of a recipe's composition: which ingredient and how
/// much of it. The wire payload spells the ingredient key `id`.
#[derive(Deserialize, Copy, Clone, Debug, PartialEq, Eq)]
pub struct IngredientAmount {
    #[serde(rename = "id")]
    pub ingredient_id: IngredientId,
    pub amount: i32,
}

fn validate(items: &[IngredientAmount]) -> Result<()> {
    if items.is_empty() {
        return Err(CatalogError::validation(
            "ingredients",
            "at least one ingredient is required",
        ));
    }

    let mut seen = HashSet::new();
    for item in items {
        if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&item.amount) {
            return Err(CatalogError::validation(
                "amount",
                format!(
                    "amount must be between {MIN_AMOUNT} and {MAX_AMOUNT}, got {}",
                    item.amount
                ),
            ));
        }
        if !seen.insert(item.ingredient_id) {
            return Err(CatalogError::validation(
                "ingredients",
                format!("ingredient {} listed more than once", item.ingredient_id),
            ));
        }
    }
    Ok(())
}

fn insert_all(
    conn: &mut database::Connection,
    recipe: RecipeId,
    items: &[IngredientAmount],
) -> Result<()> {
    use database::schema::recipe_ingredients::dsl::*;

    let rows: Vec<_> = items
        .iter()
        .map(|item| NewRecipeIngredient {
            recipe_id: recipe,
            ingredient_id: item.ingredient_id,
            amount: item.amount,
        })
        .collect();
    diesel::insert_into(recipe_ingredients)
        .values(rows)
        .execute(conn)
        .map_err(|e| constraint_error("recipe ingredient", "ingredient", e))?;
    Ok(())
}

/// Attach the given amounts to a recipe that has none yet. Validation runs
/// before anything is written, and the inserts share one transaction, so a
/// bad item leaves the recipe untouched.
pub fn create(
    conn: &mut database::Connection,
    recipe: RecipeId,
    items: &[IngredientAmount],
) -> Result<()> {
    validate(items)?;
    conn.transaction(|conn| insert_all(conn, recipe, items))
}

/// Swap a recipe's composition for a new one. The old rows are only gone if
/// every new row makes it in; any failure rolls back to the previous set.
pub fn replace(
    conn: &mut database::Connection,
    recipe: RecipeId,
    items: &[IngredientAmount],
) -> Result<()> {
    validate(items)?;
    conn.transaction(|conn| {
        {
            use database::schema::recipe_ingredients::dsl::*;

            diesel::delete(recipe_ingredients.filter(recipe_id.eq(recipe))).execute(conn)?;
        }
        insert_all(conn, recipe, items)
    })
}

/// Composition of one recipe joined with the ingredient catalog rows,
/// newest attachment first.
pub fn list(
    conn: &mut database::Connection,
    recipe: RecipeId,
) -> Result<Vec<(RecipeIngredient, Ingredient)>> {
    use database::schema::recipe_ingredients::dsl::*;

    let rows = recipe_ingredients
        .inner_join(database::schema::ingredients::table)
        .select((RecipeIngredient::as_select(), Ingredient::as_select()))
        .filter(recipe_id.eq(recipe))
        .order(id.desc())
        .load(conn)?;
    Ok(rows)
}

#[cfg(test)]
fn test_recipe(conn: &mut database::Connection) -> RecipeId {
    let author = database::test_data::user(conn, "composer");
    database::test_data::recipe(conn, author.id, "soup").id
}

#[test]
fn create_then_list() {
    let mut conn = database::test_connection();
    let recipe = test_recipe(&mut conn);
    let flour = database::test_data::ingredient(&mut conn, "flour", "g");
    let milk = database::test_data::ingredient(&mut conn, "milk", "ml");

    create(
        &mut conn,
        recipe,
        &[
            IngredientAmount {
                ingredient_id: flour.id,
                amount: 200,
            },
            IngredientAmount {
                ingredient_id: milk.id,
                amount: 300,
            },
        ],
    )
    .unwrap();

    let listed = list(&mut conn, recipe).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].1.name, "milk");
    assert_eq!(listed[0].0.amount, 300);
    assert_eq!(listed[1].1.name, "flour");
    assert_eq!(listed[1].0.amount, 200);
}

#[test]
fn create_rejects_empty() {
    let mut conn = database::test_connection();
    let recipe = test_recipe(&mut conn);

    let error = create(&mut conn, recipe, &[]).unwrap_err();
    assert!(
        matches!(&error, CatalogError::Validation { field, .. } if *field == "ingredients"),
        "{error:?}"
    );
}

#[test]
fn create_rejects_amount_out_of_range() {
    let mut conn = database::test_connection();
    let recipe = test_recipe(&mut conn);
    let flour = database::test_data::ingredient(&mut conn, "flour", "g");

    for amount in [0, -5, MAX_AMOUNT + 1] {
        let error = create(
            &mut conn,
            recipe,
            &[IngredientAmount {
                ingredient_id: flour.id,
                amount,
            }],
        )
        .unwrap_err();
        assert!(
            matches!(&error, CatalogError::Validation { field, .. } if *field == "amount"),
            "{error:?}"
        );
    }
    assert!(list(&mut conn, recipe).unwrap().is_empty());
}

#[test]
fn create_rejects_duplicate_ingredient() {
    let mut conn = database::test_connection();
    let recipe = test_recipe(&mut conn);
    let flour = database::test_data::ingredient(&mut conn, "flour", "g");

    let error = create(
        &mut conn,
        recipe,
        &[
            IngredientAmount {
                ingredient_id: flour.id,
                amount: 100,
            },
            IngredientAmount {
                ingredient_id: flour.id,
                amount: 200,
            },
        ],
    )
    .unwrap_err();
    assert!(matches!(error, CatalogError::Validation { .. }), "{error:?}");
    assert!(list(&mut conn, recipe).unwrap().is_empty());
}

#[test]
fn create_rejects_unknown_ingredient() {
    let mut conn = database::test_connection();
    let recipe = test_recipe(&mut conn);

    let error = create(
        &mut conn,
        recipe,
        &[IngredientAmount {
            ingredient_id: IngredientId::new(777),
            amount: 10,
        }],
    )
    .unwrap_err();
    assert!(
        matches!(&error, CatalogError::NotFound { what } if *what == "ingredient"),
        "{error:?}"
    );
}

#[test]
fn replace_swaps_the_whole_set() {
    let mut conn = database::test_connection();
    let recipe = test_recipe(&mut conn);
    let flour = database::test_data::ingredient(&mut conn, "flour", "g");
    let milk = database::test_data::ingredient(&mut conn, "milk", "ml");
    let salt = database::test_data::ingredient(&mut conn, "salt", "g");

    create(
        &mut conn,
        recipe,
        &[
            IngredientAmount {
                ingredient_id: flour.id,
                amount: 200,
            },
            IngredientAmount {
                ingredient_id: milk.id,
                amount: 300,
            },
        ],
    )
    .unwrap();
    replace(
        &mut conn,
        recipe,
        &[IngredientAmount {
            ingredient_id: salt.id,
            amount: 5,
        }],
    )
    .unwrap();

    let listed = list(&mut conn, recipe).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].1.name, "salt");
    assert_eq!(listed[0].0.amount, 5);
}

#[test]
fn failed_replace_keeps_old_set() {
    let mut conn = database::test_connection();
    let recipe = test_recipe(&mut conn);
    let flour = database::test_data::ingredient(&mut conn, "flour", "g");

    create(
        &mut conn,
        recipe,
        &[IngredientAmount {
            ingredient_id: flour.id,
            amount: 200,
        }],
    )
    .unwrap();
    replace(
        &mut conn,
        recipe,
        &[IngredientAmount {
            ingredient_id: IngredientId::new(777),
            amount: 10,
        }],
    )
    .unwrap_err();

    let listed = list(&mut conn, recipe).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].1.name, "flour");
    assert_eq!(listed[0].0.amount, 200);
}

#[test]
fn amounts_at_the_bounds_are_accepted() {
    let mut conn = database::test_connection();
    let recipe = test_recipe(&mut conn);
    let flour = database::test_data::ingredient(&mut conn, "flour", "g");
    let milk = database::test_data::ingredient(&mut conn, "milk", "ml");

    create(
        &mut conn,
        recipe,
        &[
            IngredientAmount {
                ingredient_id: flour.id,
                amount: MIN_AMOUNT,
            },
            IngredientAmount {
                ingredient_id: milk.id,
                amount: MAX_AMOUNT,
            },
        ],
    )
    .unwrap();
    assert_eq!(list(&mut conn, recipe).unwrap().len(), 2);
}
