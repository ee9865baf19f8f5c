// Copyright 2023 Remi Bernotavicius

use crate::database;
use crate::database::models::UserId;
use crate::relations::RelationKind;
use crate::{CatalogError, Result};
use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest, HttpResponse};
use serde::Deserialize;
use std::future::{ready, Ready};

pub mod ingredients;
pub mod recipes;
pub mod serialize;
pub mod tags;
pub mod users;

pub const USER_ID_HEADER: &str = "x-user-id";

/// Identity injected by the fronting proxy. Extraction itself never fails;
/// routes that need an actor call [`CurrentUser::require`] and get a 401
/// when the header is absent or unreadable.
#[derive(Copy, Clone, Debug)]
pub struct CurrentUser(pub Option<UserId>);

impl CurrentUser {
    pub fn require(&self) -> Result<UserId> {
        self.0.ok_or(CatalogError::Unauthorized)
    }
}

impl FromRequest for CurrentUser {
    type Error = actix_web::Error;
    type Future = Ready<std::result::Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let user = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|raw| raw.trim().parse().ok())
            .map(UserId::new);
        ready(Ok(Self(user)))
    }
}

/// Runs a store operation on the blocking pool with a pooled connection.
pub(crate) async fn exec<T, F>(pool: &web::Data<database::ConnectionPool>, op: F) -> Result<T>
where
    F: FnOnce(&mut database::Connection) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let pool = database::ConnectionPool::clone(pool);
    web::block(move || {
        let mut conn = pool.get()?;
        op(&mut conn)
    })
    .await?
}

/// `page`/`limit` glue accepted by the listing routes. Responses stay plain
/// arrays; without `limit` the whole listing comes back.
#[derive(Deserialize, Debug, Default)]
pub struct Paging {
    pub(crate) page: Option<usize>,
    pub(crate) limit: Option<usize>,
}

impl Paging {
    pub(crate) fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        match self.limit {
            None => items,
            Some(limit) => {
                let page = self.page.unwrap_or(1).max(1);
                items
                    .into_iter()
                    .skip((page - 1).saturating_mul(limit))
                    .take(limit)
                    .collect()
            }
        }
    }
}

/// The toggle DELETE contract: removing a pair that was never added is a
/// 400 with an `errors` body; 404 stays reserved for the entity itself.
pub(crate) fn removal_response(kind: RelationKind, outcome: Result<()>) -> Result<HttpResponse> {
    match outcome {
        Ok(()) => Ok(HttpResponse::NoContent().finish()),
        Err(CatalogError::NotFound { what }) if what == kind.label() => {
            Ok(HttpResponse::BadRequest()
                .json(serde_json::json!({ "errors": CatalogError::not_found(what).to_string() })))
        }
        Err(e) => Err(e),
    }
}

/// Fixed-path routes are registered ahead of their `{id}` siblings so that
/// `download_shopping_cart`, `me` and `subscriptions` are not swallowed by
/// the parameterized matches.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(recipes::download_shopping_cart)
        .service(recipes::favorite_add)
        .service(recipes::favorite_remove)
        .service(recipes::cart_add)
        .service(recipes::cart_remove)
        .service(recipes::list)
        .service(recipes::create)
        .service(recipes::retrieve)
        .service(recipes::update)
        .service(recipes::delete)
        .service(users::me)
        .service(users::subscriptions)
        .service(users::subscribe)
        .service(users::unsubscribe)
        .service(users::create)
        .service(users::list)
        .service(users::retrieve)
        .service(tags::list)
        .service(tags::create)
        .service(tags::retrieve)
        .service(ingredients::list)
        .service(ingredients::retrieve);
}

#[test]
fn paging_slices() {
    let items: Vec<i32> = (1..=10).collect();

    let all = Paging::default();
    assert_eq!(all.slice(items.clone()).len(), 10);

    let second_page = Paging {
        page: Some(2),
        limit: Some(3),
    };
    assert_eq!(second_page.slice(items.clone()), vec![4, 5, 6]);

    let past_the_end = Paging {
        page: Some(5),
        limit: Some(3),
    };
    assert!(past_the_end.slice(items).is_empty());
}
