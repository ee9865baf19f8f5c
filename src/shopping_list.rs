// Copyright 2023 Remi Bernotavicius

use crate::database;
use crate::database::models::{IngredientId, UserId};
use crate::Result;
use diesel::ExpressionMethods as _;
use diesel::JoinOnDsl as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// One merged line of the shopping list: the amounts for this ingredient
/// across every recipe in the cart, summed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShoppingListEntry {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

/// Flatten the user's cart into per-ingredient totals. Amounts are summed
/// in 64 bits so no realistic cart can wrap. Entries keep the order in
/// which their ingredient first appears; an empty cart is an empty list.
pub fn build_report(
    conn: &mut database::Connection,
    user: UserId,
) -> Result<Vec<ShoppingListEntry>> {
    use database::schema::{cart_entries, ingredients, recipe_ingredients};

    let rows: Vec<(IngredientId, String, String, i32)> = recipe_ingredients::table
        .inner_join(ingredients::table)
        .inner_join(
            cart_entries::table.on(cart_entries::recipe_id.eq(recipe_ingredients::recipe_id)),
        )
        .filter(cart_entries::user_id.eq(user))
        .order(recipe_ingredients::id.asc())
        .select((
            recipe_ingredients::ingredient_id,
            ingredients::name,
            ingredients::measurement_unit,
            recipe_ingredients::amount,
        ))
        .load(conn)?;

    let mut entries: Vec<ShoppingListEntry> = Vec::new();
    let mut by_ingredient: HashMap<IngredientId, usize> = HashMap::new();
    for (ingredient, name, unit, amount) in rows {
        match by_ingredient.entry(ingredient) {
            Entry::Occupied(slot) => {
                entries[*slot.get()].total += i64::from(amount);
            }
            Entry::Vacant(slot) => {
                slot.insert(entries.len());
                entries.push(ShoppingListEntry {
                    name,
                    measurement_unit: unit,
                    total: amount.into(),
                });
            }
        }
    }
    Ok(entries)
}

/// The exact text served by the download endpoint.
pub fn render_text(entries: &[ShoppingListEntry]) -> String {
    let mut out = String::from("Список покупок:");
    for (index, entry) in entries.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        out.push_str(&format!(
            "\n{} - {} {}",
            entry.name, entry.total, entry.measurement_unit
        ));
    }
    out
}

#[cfg(test)]
use crate::database::models::RecipeId;
#[cfg(test)]
use crate::recipe_ingredients::{self, IngredientAmount};
#[cfg(test)]
use crate::relations::{self, Relation};

#[cfg(test)]
fn fill_cart(conn: &mut database::Connection, user: UserId, recipes: &[RecipeId]) {
    for &recipe in recipes {
        relations::add(conn, Relation::ShoppingCart { user, recipe }).unwrap();
    }
}

#[test]
fn amounts_merge_across_recipes() {
    let mut conn = database::test_connection();
    let cook = database::test_data::user(&mut conn, "cook");
    let flour = database::test_data::ingredient(&mut conn, "flour", "g");
    let milk = database::test_data::ingredient(&mut conn, "milk", "ml");

    let pancakes = database::test_data::recipe(&mut conn, cook.id, "pancakes");
    recipe_ingredients::create(
        &mut conn,
        pancakes.id,
        &[
            IngredientAmount {
                ingredient_id: flour.id,
                amount: 10,
            },
            IngredientAmount {
                ingredient_id: milk.id,
                amount: 300,
            },
        ],
    )
    .unwrap();

    let bread = database::test_data::recipe(&mut conn, cook.id, "bread");
    recipe_ingredients::create(
        &mut conn,
        bread.id,
        &[IngredientAmount {
            ingredient_id: flour.id,
            amount: 5,
        }],
    )
    .unwrap();

    fill_cart(&mut conn, cook.id, &[pancakes.id, bread.id]);

    let report = build_report(&mut conn, cook.id).unwrap();
    assert_eq!(
        report,
        vec![
            ShoppingListEntry {
                name: "flour".into(),
                measurement_unit: "g".into(),
                total: 15,
            },
            ShoppingListEntry {
                name: "milk".into(),
                measurement_unit: "ml".into(),
                total: 300,
            },
        ]
    );
}

#[test]
fn empty_cart_is_an_empty_report() {
    let mut conn = database::test_connection();
    let cook = database::test_data::user(&mut conn, "cook");

    assert!(build_report(&mut conn, cook.id).unwrap().is_empty());
}

#[test]
fn carts_do_not_bleed_between_users() {
    let mut conn = database::test_connection();
    let cook = database::test_data::user(&mut conn, "cook");
    let other = database::test_data::user(&mut conn, "other");
    let flour = database::test_data::ingredient(&mut conn, "flour", "g");

    let bread = database::test_data::recipe(&mut conn, cook.id, "bread");
    recipe_ingredients::create(
        &mut conn,
        bread.id,
        &[IngredientAmount {
            ingredient_id: flour.id,
            amount: 5,
        }],
    )
    .unwrap();
    fill_cart(&mut conn, cook.id, &[bread.id]);

    assert_eq!(build_report(&mut conn, cook.id).unwrap().len(), 1);
    assert!(build_report(&mut conn, other.id).unwrap().is_empty());
}

#[test]
fn rendered_list_matches_the_download_format() {
    let entries = vec![
        ShoppingListEntry {
            name: "flour".into(),
            measurement_unit: "g".into(),
            total: 15,
        },
        ShoppingListEntry {
            name: "milk".into(),
            measurement_unit: "ml".into(),
            total: 300,
        },
    ];
    assert_eq!(
        render_text(&entries),
        "Список покупок:\nflour - 15 g, \nmilk - 300 ml"
    );
}

#[test]
fn rendered_empty_list_is_just_the_header() {
    assert_eq!(render_text(&[]), "Список покупок:");
}
