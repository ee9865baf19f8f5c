use crate::api::serialize::{self, RecipeSummaryOut};
use crate::api::{exec, removal_response, CurrentUser, Paging};
use crate::database;
use crate::database::models::{Recipe, RecipeId, TagId, UserId};
use crate::recipe_ingredients::IngredientAmount;
use crate::relations::{self, Relation, RelationKind};
use crate::{catalog, shopping_list, CatalogError, Result};
use actix_web::{delete, get, patch, post, web, HttpResponse};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct RecipePayload {
    pub ingredients: Vec<IngredientAmount>,
    #[serde(default)]
    pub tags: Vec<TagId>,
    pub image: String,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
}

impl RecipePayload {
    fn into_input(self) -> catalog::RecipeInput {
        catalog::RecipeInput {
            name: self.name,
            text: self.text,
            cooking_time: self.cooking_time,
            image_ref: self.image,
            tags: self.tags,
            ingredients: self.ingredients,
        }
    }
}

/// Only the author or an admin may change or delete a recipe.
fn authorize_author(
    conn: &mut database::Connection,
    actor: UserId,
    recipe: &Recipe,
) -> Result<()> {
    if recipe.author_id == actor {
        return Ok(());
    }
    let user = match catalog::get_user(conn, actor) {
        Ok(user) => user,
        Err(CatalogError::NotFound { .. }) => return Err(CatalogError::Forbidden),
        Err(e) => return Err(e),
    };
    if user.is_admin {
        Ok(())
    } else {
        Err(CatalogError::Forbidden)
    }
}

#[get("/recipes/")]
pub async fn list(
    pool: web::Data<database::ConnectionPool>,
    user: CurrentUser,
    paging: web::Query<Paging>,
) -> Result<HttpResponse> {
    let viewer = user.0;
    let listed = exec(&pool, move |conn| {
        let mut out = Vec::new();
        for recipe in catalog::list_recipes(conn)? {
            out.push(serialize::recipe_out(conn, recipe, viewer)?);
        }
        Ok(out)
    })
    .await?;
    Ok(HttpResponse::Ok().json(paging.slice(listed)))
}

#[post("/recipes/")]
pub async fn create(
    pool: web::Data<database::ConnectionPool>,
    user: CurrentUser,
    payload: web::Json<RecipePayload>,
) -> Result<HttpResponse> {
    let author = user.require()?;
    let input = payload.into_inner().into_input();
    let created = exec(&pool, move |conn| {
        let recipe = catalog::create_recipe(conn, author, &input)?;
        serialize::recipe_out(conn, recipe, Some(author))
    })
    .await?;
    Ok(HttpResponse::Created().json(created))
}

#[get("/recipes/{id}/")]
pub async fn retrieve(
    pool: web::Data<database::ConnectionPool>,
    user: CurrentUser,
    path: web::Path<RecipeId>,
) -> Result<HttpResponse> {
    let viewer = user.0;
    let recipe = path.into_inner();
    let out = exec(&pool, move |conn| {
        let recipe = catalog::get_recipe(conn, recipe)?;
        serialize::recipe_out(conn, recipe, viewer)
    })
    .await?;
    Ok(HttpResponse::Ok().json(out))
}

#[patch("/recipes/{id}/")]
pub async fn update(
    pool: web::Data<database::ConnectionPool>,
    user: CurrentUser,
    path: web::Path<RecipeId>,
    payload: web::Json<RecipePayload>,
) -> Result<HttpResponse> {
    let actor = user.require()?;
    let recipe = path.into_inner();
    let input = payload.into_inner().into_input();
    let updated = exec(&pool, move |conn| {
        let existing = catalog::get_recipe(conn, recipe)?;
        authorize_author(conn, actor, &existing)?;
        let updated = catalog::update_recipe(conn, recipe, &input)?;
        serialize::recipe_out(conn, updated, Some(actor))
    })
    .await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/recipes/{id}/")]
pub async fn delete(
    pool: web::Data<database::ConnectionPool>,
    user: CurrentUser,
    path: web::Path<RecipeId>,
) -> Result<HttpResponse> {
    let actor = user.require()?;
    let recipe = path.into_inner();
    exec(&pool, move |conn| {
        let existing = catalog::get_recipe(conn, recipe)?;
        authorize_author(conn, actor, &existing)?;
        catalog::delete_recipe(conn, recipe)
    })
    .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[post("/recipes/{id}/favorite/")]
pub async fn favorite_add(
    pool: web::Data<database::ConnectionPool>,
    user: CurrentUser,
    path: web::Path<RecipeId>,
) -> Result<HttpResponse> {
    let actor = user.require()?;
    let recipe = path.into_inner();
    let outcome = exec(&pool, move |conn| {
        relations::add(
            conn,
            Relation::Favorite {
                user: actor,
                recipe,
            },
        )?;
        catalog::get_recipe_summary(conn, recipe)
    })
    .await;
    match outcome {
        Ok(summary) => Ok(HttpResponse::Created().json(RecipeSummaryOut::from(summary))),
        // favoriting a missing recipe reads as a bad request on this
        // route; the cart route 404s instead
        Err(CatalogError::NotFound { what }) => Ok(HttpResponse::BadRequest()
            .json(serde_json::json!({ "errors": CatalogError::not_found(what).to_string() }))),
        Err(e) => Err(e),
    }
}

#[delete("/recipes/{id}/favorite/")]
pub async fn favorite_remove(
    pool: web::Data<database::ConnectionPool>,
    user: CurrentUser,
    path: web::Path<RecipeId>,
) -> Result<HttpResponse> {
    let actor = user.require()?;
    let recipe = path.into_inner();
    let outcome = exec(&pool, move |conn| {
        catalog::get_recipe(conn, recipe)?;
        relations::remove(
            conn,
            Relation::Favorite {
                user: actor,
                recipe,
            },
        )
    })
    .await;
    removal_response(RelationKind::Favorite, outcome)
}

#[post("/recipes/{id}/shopping_cart/")]
pub async fn cart_add(
    pool: web::Data<database::ConnectionPool>,
    user: CurrentUser,
    path: web::Path<RecipeId>,
) -> Result<HttpResponse> {
    let actor = user.require()?;
    let recipe = path.into_inner();
    let summary = exec(&pool, move |conn| {
        catalog::get_recipe(conn, recipe)?;
        relations::add(
            conn,
            Relation::ShoppingCart {
                user: actor,
                recipe,
            },
        )?;
        catalog::get_recipe_summary(conn, recipe)
    })
    .await?;
    Ok(HttpResponse::Created().json(RecipeSummaryOut::from(summary)))
}

#[delete("/recipes/{id}/shopping_cart/")]
pub async fn cart_remove(
    pool: web::Data<database::ConnectionPool>,
    user: CurrentUser,
    path: web::Path<RecipeId>,
) -> Result<HttpResponse> {
    let actor = user.require()?;
    let recipe = path.into_inner();
    let outcome = exec(&pool, move |conn| {
        catalog::get_recipe(conn, recipe)?;
        relations::remove(
            conn,
            Relation::ShoppingCart {
                user: actor,
                recipe,
            },
        )
    })
    .await;
    removal_response(RelationKind::ShoppingCart, outcome)
}

#[get("/recipes/download_shopping_cart/")]
pub async fn download_shopping_cart(
    pool: web::Data<database::ConnectionPool>,
    user: CurrentUser,
) -> Result<HttpResponse> {
    let actor = user.require()?;
    let body = exec(&pool, move |conn| {
        let report = shopping_list::build_report(conn, actor)?;
        Ok(shopping_list::render_text(&report))
    })
    .await?;
    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            "Content-Disposition",
            r#"attachment; filename="shopping_list.pdf""#,
        ))
        .body(body))
}
