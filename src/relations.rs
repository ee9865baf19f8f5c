// Copyright 2023 Remi Bernotavicius

use crate::database;
use crate::database::models::{NewCartEntry, NewFavorite, NewSubscription, RecipeId, UserId};
use crate::error::{constraint_error, CatalogError};
use crate::Result;
use diesel::ExpressionMethods as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, strum::EnumIter)]
pub enum RelationKind {
    Favorite,
    ShoppingCart,
    Subscription,
}

impl RelationKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Favorite => "favorite",
            Self::ShoppingCart => "shopping cart entry",
            Self::Subscription => "subscription",
        }
    }
}

/// A user-held mark on another row. All three kinds behave the same way:
/// at most one row per pair, enforced by a unique constraint rather than a
/// read-then-write check, so two racing adds resolve to exactly one row.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Relation {
    Favorite { user: UserId, recipe: RecipeId },
    ShoppingCart { user: UserId, recipe: RecipeId },
    Subscription { user: UserId, author: UserId },
}

impl Relation {
    pub fn kind(self) -> RelationKind {
        match self {
            Self::Favorite { .. } => RelationKind::Favorite,
            Self::ShoppingCart { .. } => RelationKind::ShoppingCart,
            Self::Subscription { .. } => RelationKind::Subscription,
        }
    }
}

/// Duplicate pair comes back as `Conflict`, a missing target row as
/// `NotFound`. Subscribing to yourself is refused up front.
pub fn add(conn: &mut database::Connection, relation: Relation) -> Result<()> {
    let label = relation.kind().label();
    match relation {
        Relation::Favorite { user, recipe } => {
            use database::schema::favorites::dsl::*;

            diesel::insert_into(favorites)
                .values(NewFavorite {
                    user_id: user,
                    recipe_id: recipe,
                })
                .execute(conn)
                .map_err(|e| constraint_error(label, "recipe", e))?;
        }
        Relation::ShoppingCart { user, recipe } => {
            use database::schema::cart_entries::dsl::*;

            diesel::insert_into(cart_entries)
                .values(NewCartEntry {
                    user_id: user,
                    recipe_id: recipe,
                })
                .execute(conn)
                .map_err(|e| constraint_error(label, "recipe", e))?;
        }
        Relation::Subscription { user, author } => {
            if user == author {
                return Err(CatalogError::validation(
                    "author",
                    "subscribing to yourself is not allowed",
                ));
            }
            use database::schema::subscriptions::dsl::*;

            diesel::insert_into(subscriptions)
                .values(NewSubscription {
                    user_id: user,
                    author_id: author,
                })
                .execute(conn)
                .map_err(|e| constraint_error(label, "author", e))?;
        }
    }
    Ok(())
}

/// Removing a pair that is not there is `NotFound`; the row count from the
/// delete is the only check needed.
pub fn remove(conn: &mut database::Connection, relation: Relation) -> Result<()> {
    let deleted = match relation {
        Relation::Favorite { user, recipe } => {
            use database::schema::favorites::dsl::*;

            diesel::delete(favorites.filter(user_id.eq(user)).filter(recipe_id.eq(recipe)))
                .execute(conn)?
        }
        Relation::ShoppingCart { user, recipe } => {
            use database::schema::cart_entries::dsl::*;

            diesel::delete(cart_entries.filter(user_id.eq(user)).filter(recipe_id.eq(recipe)))
                .execute(conn)?
        }
        Relation::Subscription { user, author } => {
            use database::schema::subscriptions::dsl::*;

            diesel::delete(subscriptions.filter(user_id.eq(user)).filter(author_id.eq(author)))
                .execute(conn)?
        }
    };
    if deleted == 0 {
        return Err(CatalogError::not_found(relation.kind().label()));
    }
    Ok(())
}

pub fn exists(conn: &mut database::Connection, relation: Relation) -> Result<bool> {
    let found: bool = match relation {
        Relation::Favorite { user, recipe } => {
            use database::schema::favorites::dsl::*;

            diesel::select(diesel::dsl::exists(
                favorites.filter(user_id.eq(user)).filter(recipe_id.eq(recipe)),
            ))
            .get_result(conn)?
        }
        Relation::ShoppingCart { user, recipe } => {
            use database::schema::cart_entries::dsl::*;

            diesel::select(diesel::dsl::exists(
                cart_entries
                    .filter(user_id.eq(user))
                    .filter(recipe_id.eq(recipe)),
            ))
            .get_result(conn)?
        }
        Relation::Subscription { user, author } => {
            use database::schema::subscriptions::dsl::*;

            diesel::select(diesel::dsl::exists(
                subscriptions
                    .filter(user_id.eq(user))
                    .filter(author_id.eq(author)),
            ))
            .get_result(conn)?
        }
    };
    Ok(found)
}

#[cfg(test)]
fn test_relation(conn: &mut database::Connection, kind: RelationKind) -> Relation {
    let actor = database::test_data::user(conn, "actor");
    match kind {
        RelationKind::Favorite => {
            let recipe = database::test_data::recipe(conn, actor.id, "soup");
            Relation::Favorite {
                user: actor.id,
                recipe: recipe.id,
            }
        }
        RelationKind::ShoppingCart => {
            let recipe = database::test_data::recipe(conn, actor.id, "soup");
            Relation::ShoppingCart {
                user: actor.id,
                recipe: recipe.id,
            }
        }
        RelationKind::Subscription => {
            let author = database::test_data::user(conn, "author");
            Relation::Subscription {
                user: actor.id,
                author: author.id,
            }
        }
    }
}

#[test]
fn every_kind_toggles_exactly_once() {
    use strum::IntoEnumIterator as _;

    for kind in RelationKind::iter() {
        let mut conn = database::test_connection();
        let relation = test_relation(&mut conn, kind);

        assert!(!exists(&mut conn, relation).unwrap());
        add(&mut conn, relation).unwrap();
        assert!(exists(&mut conn, relation).unwrap());

        let error = add(&mut conn, relation).unwrap_err();
        assert!(
            matches!(&error, CatalogError::Conflict { what } if *what == kind.label()),
            "{kind:?}: {error:?}"
        );

        remove(&mut conn, relation).unwrap();
        assert!(!exists(&mut conn, relation).unwrap());

        let error = remove(&mut conn, relation).unwrap_err();
        assert!(
            matches!(&error, CatalogError::NotFound { what } if *what == kind.label()),
            "{kind:?}: {error:?}"
        );

        add(&mut conn, relation).unwrap();
        assert!(exists(&mut conn, relation).unwrap());
    }
}

#[test]
fn self_subscription_is_refused() {
    let mut conn = database::test_connection();
    let actor = database::test_data::user(&mut conn, "actor");
    let relation = Relation::Subscription {
        user: actor.id,
        author: actor.id,
    };

    let error = add(&mut conn, relation).unwrap_err();
    assert!(
        matches!(error, CatalogError::Validation { field: "author", .. }),
        "{error:?}"
    );
    assert!(!exists(&mut conn, relation).unwrap());
}

#[test]
fn favoriting_your_own_recipe_is_fine() {
    let mut conn = database::test_connection();
    let actor = database::test_data::user(&mut conn, "actor");
    let recipe = database::test_data::recipe(&mut conn, actor.id, "soup");

    add(
        &mut conn,
        Relation::Favorite {
            user: actor.id,
            recipe: recipe.id,
        },
    )
    .unwrap();
}

#[test]
fn adding_against_missing_rows_is_not_found() {
    let mut conn = database::test_connection();
    let actor = database::test_data::user(&mut conn, "actor");

    let error = add(
        &mut conn,
        Relation::ShoppingCart {
            user: actor.id,
            recipe: RecipeId::new(777),
        },
    )
    .unwrap_err();
    assert!(
        matches!(&error, CatalogError::NotFound { what } if *what == "recipe"),
        "{error:?}"
    );

    let error = add(
        &mut conn,
        Relation::Subscription {
            user: actor.id,
            author: UserId::new(777),
        },
    )
    .unwrap_err();
    assert!(
        matches!(&error, CatalogError::NotFound { what } if *what == "author"),
        "{error:?}"
    );
}

#[test]
fn kinds_are_independent() {
    let mut conn = database::test_connection();
    let actor = database::test_data::user(&mut conn, "actor");
    let recipe = database::test_data::recipe(&mut conn, actor.id, "soup");

    add(
        &mut conn,
        Relation::Favorite {
            user: actor.id,
            recipe: recipe.id,
        },
    )
    .unwrap();

    assert!(exists(
        &mut conn,
        Relation::Favorite {
            user: actor.id,
            recipe: recipe.id,
        },
    )
    .unwrap());
    assert!(!exists(
        &mut conn,
        Relation::ShoppingCart {
            user: actor.id,
            recipe: recipe.id,
        },
    )
    .unwrap());
}
