use crate::api::exec;
use crate::api::serialize::IngredientOut;
use crate::database;
use crate::database::models::IngredientId;
use crate::{catalog, Result};
use actix_web::{get, web, HttpResponse};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct IngredientsQuery {
    name: Option<String>,
}

#[get("/ingredients/")]
pub async fn list(
    pool: web::Data<database::ConnectionPool>,
    query: web::Query<IngredientsQuery>,
) -> Result<HttpResponse> {
    let prefix = query.into_inner().name;
    let ingredients = exec(&pool, move |conn| {
        catalog::list_ingredients(conn, prefix.as_deref())
    })
    .await?;
    let ingredients: Vec<IngredientOut> =
        ingredients.into_iter().map(IngredientOut::from).collect();
    Ok(HttpResponse::Ok().json(ingredients))
}

#[get("/ingredients/{id}/")]
pub async fn retrieve(
    pool: web::Data<database::ConnectionPool>,
    path: web::Path<IngredientId>,
) -> Result<HttpResponse> {
    let ingredient = path.into_inner();
    let ingredient = exec(&pool, move |conn| catalog::get_ingredient(conn, ingredient)).await?;
    Ok(HttpResponse::Ok().json(IngredientOut::from(ingredient)))
}
