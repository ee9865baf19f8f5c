use crate::api::{exec, removal_response, serialize, CurrentUser, Paging};
use crate::database;
use crate::database::models::{NewUser, UserId};
use crate::relations::{self, Relation, RelationKind};
use crate::{catalog, Result};
use actix_web::{delete, get, post, web, HttpResponse};
use serde::Deserialize;

#[derive(Deserialize, Debug)]
pub struct UserPayload {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

#[post("/users/")]
pub async fn create(
    pool: web::Data<database::ConnectionPool>,
    payload: web::Json<UserPayload>,
) -> Result<HttpResponse> {
    let payload = payload.into_inner();
    let user = exec(&pool, move |conn| {
        catalog::create_user(
            conn,
            NewUser {
                username: payload.username,
                email: payload.email,
                first_name: payload.first_name,
                last_name: payload.last_name,
                is_admin: false,
            },
        )
    })
    .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "first_name": user.first_name,
        "last_name": user.last_name,
    })))
}

#[get("/users/")]
pub async fn list(
    pool: web::Data<database::ConnectionPool>,
    user: CurrentUser,
    paging: web::Query<Paging>,
) -> Result<HttpResponse> {
    let viewer = user.0;
    let users = exec(&pool, move |conn| {
        let mut out = Vec::new();
        for row in catalog::list_users(conn)? {
            out.push(serialize::user_out(conn, row, viewer)?);
        }
        Ok(out)
    })
    .await?;
    Ok(HttpResponse::Ok().json(paging.slice(users)))
}

#[get("/users/me/")]
pub async fn me(
    pool: web::Data<database::ConnectionPool>,
    user: CurrentUser,
) -> Result<HttpResponse> {
    let actor = user.require()?;
    let out = exec(&pool, move |conn| {
        let row = catalog::get_user(conn, actor)?;
        serialize::user_out(conn, row, Some(actor))
    })
    .await?;
    Ok(HttpResponse::Ok().json(out))
}

#[get("/users/{id}/")]
pub async fn retrieve(
    pool: web::Data<database::ConnectionPool>,
    user: CurrentUser,
    path: web::Path<UserId>,
) -> Result<HttpResponse> {
    let viewer = user.require()?;
    let wanted = path.into_inner();
    let out = exec(&pool, move |conn| {
        let row = catalog::get_user(conn, wanted)?;
        serialize::user_out(conn, row, Some(viewer))
    })
    .await?;
    Ok(HttpResponse::Ok().json(out))
}

#[post("/users/{id}/subscribe/")]
pub async fn subscribe(
    pool: web::Data<database::ConnectionPool>,
    user: CurrentUser,
    path: web::Path<UserId>,
) -> Result<HttpResponse> {
    let actor = user.require()?;
    let author = path.into_inner();
    let out = exec(&pool, move |conn| {
        let row = catalog::get_user(conn, author)?;
        relations::add(conn, Relation::Subscription { user: actor, author })?;
        serialize::author_with_recipes(conn, row, Some(actor), None)
    })
    .await?;
    Ok(HttpResponse::Created().json(out))
}

#[delete("/users/{id}/subscribe/")]
pub async fn unsubscribe(
    pool: web::Data<database::ConnectionPool>,
    user: CurrentUser,
    path: web::Path<UserId>,
) -> Result<HttpResponse> {
    let actor = user.require()?;
    let author = path.into_inner();
    let outcome = exec(&pool, move |conn| {
        catalog::get_user(conn, author)?;
        relations::remove(conn, Relation::Subscription { user: actor, author })
    })
    .await;
    removal_response(RelationKind::Subscription, outcome)
}

#[derive(Deserialize, Debug)]
pub struct SubscriptionsQuery {
    recipes_limit: Option<i64>,
    page: Option<usize>,
    limit: Option<usize>,
}

#[get("/users/subscriptions/")]
pub async fn subscriptions(
    pool: web::Data<database::ConnectionPool>,
    user: CurrentUser,
    query: web::Query<SubscriptionsQuery>,
) -> Result<HttpResponse> {
    let actor = user.require()?;
    let query = query.into_inner();
    let recipes_limit = query.recipes_limit;
    let authors = exec(&pool, move |conn| {
        let mut out = Vec::new();
        for author in catalog::list_subscribed_authors(conn, actor)? {
            out.push(serialize::author_with_recipes(
                conn,
                author,
                Some(actor),
                recipes_limit,
            )?);
        }
        Ok(out)
    })
    .await?;
    let paging = Paging {
        page: query.page,
        limit: query.limit,
    };
    Ok(HttpResponse::Ok().json(paging.slice(authors)))
}
