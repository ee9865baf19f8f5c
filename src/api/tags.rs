use crate::api::serialize::TagOut;
use crate::api::{exec, CurrentUser};
use crate::database;
use crate::database::models::TagId;
use crate::{catalog, Result};
use actix_web::{get, post, web, HttpResponse};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct TagPayload {
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub slug: Option<String>,
}

#[get("/tags/")]
pub async fn list(pool: web::Data<database::ConnectionPool>) -> Result<HttpResponse> {
    let tags = exec(&pool, catalog::list_tags).await?;
    let tags: Vec<TagOut> = tags.into_iter().map(TagOut::from).collect();
    Ok(HttpResponse::Ok().json(tags))
}

#[post("/tags/")]
pub async fn create(
    pool: web::Data<database::ConnectionPool>,
    user: CurrentUser,
    payload: web::Json<TagPayload>,
) -> Result<HttpResponse> {
    user.require()?;
    let payload = payload.into_inner();
    let tag = exec(&pool, move |conn| {
        catalog::create_tag(conn, &payload.name, &payload.color, payload.slug.as_deref())
    })
    .await?;
    Ok(HttpResponse::Created().json(TagOut::from(tag)))
}

#[get("/tags/{id}/")]
pub async fn retrieve(
    pool: web::Data<database::ConnectionPool>,
    path: web::Path<TagId>,
) -> Result<HttpResponse> {
    let tag = path.into_inner();
    let tag = exec(&pool, move |conn| catalog::get_tag(conn, tag)).await?;
    Ok(HttpResponse::Ok().json(TagOut::from(tag)))
}
