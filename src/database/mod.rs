// Copyright 2023 Remi Bernotavicius

use diesel::connection::SimpleConnection as _;
use diesel::prelude::Connection as _;
use diesel::r2d2::{ConnectionManager, CustomizeConnection, Pool};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::error::Error;
use std::path::Path;

pub mod models;
pub mod schema;

pub type Connection = diesel::sqlite::SqliteConnection;
pub type ConnectionPool = Pool<ConnectionManager<Connection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!();

/// Cascading deletes only happen with `foreign_keys` on, and concurrent
/// workers sharing the file need WAL plus a busy timeout.
const CONNECTION_PRAGMAS: &str = "\
    PRAGMA foreign_keys = ON; \
    PRAGMA journal_mode = WAL; \
    PRAGMA synchronous = NORMAL; \
    PRAGMA busy_timeout = 5000;";

#[derive(Debug, Clone, Copy)]
struct ConnectionPragmas;

impl CustomizeConnection<Connection, diesel::r2d2::Error> for ConnectionPragmas {
    fn on_acquire(&self, conn: &mut Connection) -> Result<(), diesel::r2d2::Error> {
        conn.batch_execute(CONNECTION_PRAGMAS)
            .map_err(diesel::r2d2::Error::QueryError)
    }
}

pub fn establish_connection(
    path: impl AsRef<Path>,
) -> Result<Connection, Box<dyn Error + Send + Sync + 'static>> {
    let mut connection = Connection::establish(path.as_ref().to_str().unwrap())?;
    connection.batch_execute(CONNECTION_PRAGMAS)?;
    connection.run_pending_migrations(MIGRATIONS)?;
    Ok(connection)
}

/// Pool for the HTTP workers. Migrations run once on a plain connection
/// before the pool hands anything out.
pub fn establish_pool(
    path: impl AsRef<Path>,
) -> Result<ConnectionPool, Box<dyn Error + Send + Sync + 'static>> {
    establish_connection(path.as_ref())?;
    let manager = ConnectionManager::new(path.as_ref().to_str().unwrap());
    let pool = Pool::builder()
        .connection_customizer(Box::new(ConnectionPragmas))
        .build(manager)?;
    Ok(pool)
}

#[cfg(test)]
pub(crate) fn test_connection() -> Connection {
    establish_connection(":memory:").unwrap()
}

/// Row seeding for tests that need referenced entities in place without
/// going through the store's validation.
#[cfg(test)]
pub(crate) mod test_data {
    use super::models::{
        Ingredient, NewIngredient, NewRecipe, NewUser, Recipe, User, UserId,
    };
    use super::Connection;
    use diesel::RunQueryDsl as _;
    use diesel::SelectableHelper as _;

    pub(crate) fn user(conn: &mut Connection, name: &str) -> User {
        use super::schema::users::dsl::*;

        diesel::insert_into(users)
            .values(NewUser {
                username: name.into(),
                email: format!("{name}@example.com"),
                first_name: name.into(),
                last_name: "Test".into(),
                is_admin: false,
            })
            .returning(User::as_returning())
            .get_result(conn)
            .unwrap()
    }

    pub(crate) fn recipe(conn: &mut Connection, author: UserId, recipe_name: &str) -> Recipe {
        use super::schema::recipes::dsl::*;

        diesel::insert_into(recipes)
            .values(NewRecipe {
                author_id: author,
                name: recipe_name.into(),
                text: "so tasty".into(),
                cooking_time: 30,
                image_ref: "data:image/png;base64,".into(),
            })
            .returning(Recipe::as_returning())
            .get_result(conn)
            .unwrap()
    }

    pub(crate) fn ingredient(conn: &mut Connection, ingredient_name: &str, unit: &str) -> Ingredient {
        use super::schema::ingredients::dsl::*;

        diesel::insert_into(ingredients)
            .values(NewIngredient {
                name: ingredient_name.into(),
                measurement_unit: unit.into(),
            })
            .returning(Ingredient::as_returning())
            .get_result(conn)
            .unwrap()
    }
}

#[test]
fn migrations() {
    let mut conn = Connection::establish(":memory:").unwrap();
    conn.run_pending_migrations(MIGRATIONS).unwrap();
    conn.revert_all_migrations(MIGRATIONS).unwrap();
    conn.run_pending_migrations(MIGRATIONS).unwrap();
}
