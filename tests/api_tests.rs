use actix_web::http::StatusCode;
use actix_web::{test, web, App};
use recipe_catalog::database::models::{Ingredient, NewIngredient, NewUser, Tag, User};
use recipe_catalog::{api, catalog, database};
use serde_json::{json, Value};

fn fresh_pool(stem: &str) -> database::ConnectionPool {
    let path = std::env::temp_dir().join(format!(
        "recipe_catalog_api_{stem}_{}.sqlite",
        std::process::id()
    ));
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
    database::establish_pool(&path).unwrap()
}

fn seed_user(pool: &database::ConnectionPool, name: &str, is_admin: bool) -> User {
    let mut conn = pool.get().unwrap();
    catalog::create_user(
        &mut conn,
        NewUser {
            username: name.into(),
            email: format!("{name}@example.com"),
            first_name: "Test".into(),
            last_name: "User".into(),
            is_admin,
        },
    )
    .unwrap()
}

fn seed_tag(pool: &database::ConnectionPool, name: &str) -> Tag {
    let mut conn = pool.get().unwrap();
    catalog::create_tag(&mut conn, name, "#E26C2D", None).unwrap()
}

fn seed_ingredient(pool: &database::ConnectionPool, name: &str, unit: &str) -> Ingredient {
    let mut conn = pool.get().unwrap();
    catalog::create_ingredient(
        &mut conn,
        NewIngredient {
            name: name.into(),
            measurement_unit: unit.into(),
        },
    )
    .unwrap()
}

fn as_user(req: test::TestRequest, user: &User) -> test::TestRequest {
    req.insert_header((api::USER_ID_HEADER, user.id.to_string()))
}

fn recipe_payload(name: &str, ingredients: Value, tags: Value) -> Value {
    json!({
        "name": name,
        "text": "Mix everything and fry it",
        "cooking_time": 20,
        "image": "data:image/png;base64,iVBORw0KGgo=",
        "tags": tags,
        "ingredients": ingredients,
    })
}

#[actix_web::test]
async fn registration_and_me() {
    let pool = fresh_pool("registration_and_me");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/users/")
        .set_json(json!({
            "email": "vp@example.com",
            "username": "vpupkin",
            "first_name": "Vasily",
            "last_name": "Pupkin",
            "password": "ignored",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "vpupkin");
    assert_eq!(body["email"], "vp@example.com");
    assert!(body["id"].is_number());
    assert!(body.get("password").is_none());
    assert!(body.get("is_subscribed").is_none());

    let req = test::TestRequest::get().uri("/users/me/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let user = seed_user(&pool, "alice", false);
    let req = as_user(test::TestRequest::get().uri("/users/me/"), &user).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "alice");
    assert_eq!(body["is_subscribed"], false);
}

#[actix_web::test]
async fn user_listing_is_open_but_detail_needs_auth() {
    let pool = fresh_pool("user_listing");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .configure(api::configure),
    )
    .await;

    let alice = seed_user(&pool, "alice", false);
    let bob = seed_user(&pool, "bob", false);

    let req = test::TestRequest::get().uri("/users/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["username"], "bob");
    assert_eq!(listed[1]["username"], "alice");

    let req = test::TestRequest::get()
        .uri(&format!("/users/{}/", bob.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = as_user(
        test::TestRequest::get().uri(&format!("/users/{}/", bob.id)),
        &alice,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "bob");
    assert_eq!(body["is_subscribed"], false);
}

#[actix_web::test]
async fn double_registration_is_a_bad_request() {
    let pool = fresh_pool("double_registration");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .configure(api::configure),
    )
    .await;

    let payload = json!({
        "email": "vp@example.com",
        "username": "vpupkin",
        "first_name": "Vasily",
        "last_name": "Pupkin",
    });
    let req = test::TestRequest::post()
        .uri("/users/")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::post()
        .uri("/users/")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["errors"].as_str().unwrap().contains("already exists"));

    let req = test::TestRequest::post()
        .uri("/users/")
        .set_json(json!({
            "email": "no@example.com",
            "username": "has spaces",
            "first_name": "No",
            "last_name": "Good",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["username"][0].is_string());
}

#[actix_web::test]
async fn tag_routes() {
    let pool = fresh_pool("tag_routes");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .configure(api::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/tags/")
        .set_json(json!({ "name": "Завтрак", "color": "#E26C2D" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let user = seed_user(&pool, "alice", false);
    let req = as_user(
        test::TestRequest::post()
            .uri("/tags/")
            .set_json(json!({ "name": "Завтрак", "color": "#E26C2D" })),
        &user,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["slug"], "zavtrak");
    let tag_id = body["id"].as_i64().unwrap();

    let req = test::TestRequest::get().uri("/tags/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 1);

    let req = test::TestRequest::get()
        .uri(&format!("/tags/{tag_id}/"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get().uri("/tags/999/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["detail"].as_str().unwrap().contains("not found"));
}

#[actix_web::test]
async fn ingredient_search() {
    let pool = fresh_pool("ingredient_search");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .configure(api::configure),
    )
    .await;

    seed_ingredient(&pool, "flour", "g");
    seed_ingredient(&pool, "flax seed", "g");
    let milk = seed_ingredient(&pool, "milk", "ml");

    let req = test::TestRequest::get().uri("/ingredients/").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 3);

    let req = test::TestRequest::get()
        .uri("/ingredients/?name=fl")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    let found = body.as_array().unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0]["name"], "flour");
    assert_eq!(found[1]["name"], "flax seed");

    let req = test::TestRequest::get()
        .uri(&format!("/ingredients/{}/", milk.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["measurement_unit"], "ml");
}

#[actix_web::test]
async fn recipe_create_and_retrieve() {
    let pool = fresh_pool("recipe_create");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .configure(api::configure),
    )
    .await;

    let user = seed_user(&pool, "alice", false);
    let tag = seed_tag(&pool, "Dinner");
    let flour = seed_ingredient(&pool, "flour", "g");

    let payload = recipe_payload(
        "Pancakes",
        json!([{ "id": flour.id, "amount": 100 }]),
        json!([tag.id]),
    );

    let req = test::TestRequest::post()
        .uri("/recipes/")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = as_user(
        test::TestRequest::post().uri("/recipes/").set_json(&payload),
        &user,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let recipe_id = body["id"].as_i64().unwrap();
    assert_eq!(body["name"], "Pancakes");
    assert_eq!(body["author"]["username"], "alice");
    assert_eq!(body["is_favorited"], false);
    assert_eq!(body["is_in_shopping_cart"], false);
    assert_eq!(body["tags"][0]["name"], "Dinner");
    assert_eq!(body["ingredients"][0]["amount"], 100);
    assert_eq!(body["ingredients"][0]["measurement_unit"], "g");

    let req = test::TestRequest::get()
        .uri(&format!("/recipes/{recipe_id}/"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["is_favorited"], false);
    assert_eq!(body["author"]["is_subscribed"], false);

    let req = test::TestRequest::get().uri("/recipes/").to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
}

#[actix_web::test]
async fn recipe_validation_failures() {
    let pool = fresh_pool("recipe_validation");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .configure(api::configure),
    )
    .await;

    let user = seed_user(&pool, "alice", false);
    let tag = seed_tag(&pool, "Dinner");
    let flour = seed_ingredient(&pool, "flour", "g");

    let mut bad_time = recipe_payload(
        "Pancakes",
        json!([{ "id": flour.id, "amount": 100 }]),
        json!([tag.id]),
    );
    bad_time["cooking_time"] = json!(0);
    let req = as_user(
        test::TestRequest::post().uri("/recipes/").set_json(&bad_time),
        &user,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["cooking_time"][0].is_string());

    let no_ingredients = recipe_payload("Pancakes", json!([]), json!([tag.id]));
    let req = as_user(
        test::TestRequest::post()
            .uri("/recipes/")
            .set_json(&no_ingredients),
        &user,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["ingredients"][0].is_string());

    let unknown_tag = recipe_payload(
        "Pancakes",
        json!([{ "id": flour.id, "amount": 100 }]),
        json!([999]),
    );
    let req = as_user(
        test::TestRequest::post()
            .uri("/recipes/")
            .set_json(&unknown_tag),
        &user,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn recipe_update_is_author_or_admin_only() {
    let pool = fresh_pool("recipe_update_permissions");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .configure(api::configure),
    )
    .await;

    let author = seed_user(&pool, "alice", false);
    let stranger = seed_user(&pool, "bob", false);
    let admin = seed_user(&pool, "root", true);
    let tag = seed_tag(&pool, "Dinner");
    let flour = seed_ingredient(&pool, "flour", "g");

    let ingredients = json!([{ "id": flour.id, "amount": 100 }]);
    let req = as_user(
        test::TestRequest::post()
            .uri("/recipes/")
            .set_json(recipe_payload("Pancakes", ingredients.clone(), json!([tag.id]))),
        &author,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    let recipe_id = body["id"].as_i64().unwrap();

    let new_version = recipe_payload("Crepes", ingredients.clone(), json!([tag.id]));
    let uri = format!("/recipes/{recipe_id}/");

    let req = test::TestRequest::patch()
        .uri(&uri)
        .set_json(&new_version)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = as_user(
        test::TestRequest::patch().uri(&uri).set_json(&new_version),
        &stranger,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = as_user(
        test::TestRequest::patch().uri(&uri).set_json(&new_version),
        &author,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["name"], "Crepes");

    let admin_version = recipe_payload("Blini", ingredients.clone(), json!([tag.id]));
    let req = as_user(
        test::TestRequest::patch().uri(&uri).set_json(&admin_version),
        &admin,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = as_user(
        test::TestRequest::patch()
            .uri("/recipes/999/")
            .set_json(&admin_version),
        &stranger,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn recipe_delete() {
    let pool = fresh_pool("recipe_delete");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .configure(api::configure),
    )
    .await;

    let author = seed_user(&pool, "alice", false);
    let stranger = seed_user(&pool, "bob", false);
    let tag = seed_tag(&pool, "Dinner");
    let flour = seed_ingredient(&pool, "flour", "g");

    let req = as_user(
        test::TestRequest::post().uri("/recipes/").set_json(recipe_payload(
            "Pancakes",
            json!([{ "id": flour.id, "amount": 100 }]),
            json!([tag.id]),
        )),
        &author,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    let uri = format!("/recipes/{}/", body["id"].as_i64().unwrap());

    let req = as_user(test::TestRequest::delete().uri(&uri), &stranger).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = as_user(test::TestRequest::delete().uri(&uri), &author).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = as_user(test::TestRequest::delete().uri(&uri), &author).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn favorite_toggle() {
    let pool = fresh_pool("favorite_toggle");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .configure(api::configure),
    )
    .await;

    let user = seed_user(&pool, "alice", false);
    let tag = seed_tag(&pool, "Dinner");
    let flour = seed_ingredient(&pool, "flour", "g");
    let req = as_user(
        test::TestRequest::post().uri("/recipes/").set_json(recipe_payload(
            "Pancakes",
            json!([{ "id": flour.id, "amount": 100 }]),
            json!([tag.id]),
        )),
        &user,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    let recipe_id = body["id"].as_i64().unwrap();
    let uri = format!("/recipes/{recipe_id}/favorite/");

    let req = as_user(test::TestRequest::post().uri(&uri), &user).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["name"], "Pancakes");
    assert!(body["image"].is_string());
    assert!(body.get("text").is_none());

    let req = as_user(test::TestRequest::post().uri(&uri), &user).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"], "favorite already exists");

    let req = as_user(
        test::TestRequest::get().uri(&format!("/recipes/{recipe_id}/")),
        &user,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["is_favorited"], true);

    let req = as_user(test::TestRequest::delete().uri(&uri), &user).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = as_user(test::TestRequest::delete().uri(&uri), &user).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"], "favorite not found");

    // this route answers a missing recipe with 400, the cart routes 404
    let req = as_user(test::TestRequest::post().uri("/recipes/999/favorite/"), &user).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"], "recipe not found");

    let req = as_user(
        test::TestRequest::delete().uri("/recipes/999/favorite/"),
        &user,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn shopping_cart_and_download() {
    let pool = fresh_pool("cart_and_download");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .configure(api::configure),
    )
    .await;

    let user = seed_user(&pool, "alice", false);
    let tag = seed_tag(&pool, "Dinner");
    let flour = seed_ingredient(&pool, "flour", "g");
    let milk = seed_ingredient(&pool, "milk", "ml");

    let mut recipe_ids = vec![];
    for (name, amount) in [("Pancakes", 100), ("Bread", 50)] {
        let req = as_user(
            test::TestRequest::post().uri("/recipes/").set_json(recipe_payload(
                name,
                json!([
                    { "id": flour.id, "amount": amount },
                    { "id": milk.id, "amount": 200 },
                ]),
                json!([tag.id]),
            )),
            &user,
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        recipe_ids.push(body["id"].as_i64().unwrap());
    }

    let req = as_user(
        test::TestRequest::post().uri("/recipes/999/shopping_cart/"),
        &user,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    for id in &recipe_ids {
        let req = as_user(
            test::TestRequest::post().uri(&format!("/recipes/{id}/shopping_cart/")),
            &user,
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = as_user(
        test::TestRequest::post().uri(&format!("/recipes/{}/shopping_cart/", recipe_ids[0])),
        &user,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/recipes/download_shopping_cart/")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = as_user(
        test::TestRequest::get().uri("/recipes/download_shopping_cart/"),
        &user,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        "application/pdf"
    );
    let disposition = resp
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(disposition.contains("attachment"));
    assert!(disposition.contains("shopping_list.pdf"));
    let body = test::read_body(resp).await;
    let text = std::str::from_utf8(&body).unwrap();
    assert!(text.starts_with("Список покупок:"));
    assert!(text.contains("flour - 150 g"));
    assert!(text.contains("milk - 400 ml"));

    let req = as_user(
        test::TestRequest::delete().uri(&format!("/recipes/{}/shopping_cart/", recipe_ids[0])),
        &user,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[actix_web::test]
async fn empty_cart_download_is_just_the_header() {
    let pool = fresh_pool("empty_cart_download");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .configure(api::configure),
    )
    .await;

    let user = seed_user(&pool, "alice", false);
    let req = as_user(
        test::TestRequest::get().uri("/recipes/download_shopping_cart/"),
        &user,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = test::read_body(resp).await;
    assert_eq!(std::str::from_utf8(&body).unwrap(), "Список покупок:");
}

#[actix_web::test]
async fn subscription_flow() {
    let pool = fresh_pool("subscription_flow");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .configure(api::configure),
    )
    .await;

    let alice = seed_user(&pool, "alice", false);
    let bob = seed_user(&pool, "bob", false);
    let tag = seed_tag(&pool, "Dinner");
    let flour = seed_ingredient(&pool, "flour", "g");
    for name in ["Pancakes", "Bread"] {
        let req = as_user(
            test::TestRequest::post().uri("/recipes/").set_json(recipe_payload(
                name,
                json!([{ "id": flour.id, "amount": 100 }]),
                json!([tag.id]),
            )),
            &bob,
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let uri = format!("/users/{}/subscribe/", bob.id);
    let req = as_user(test::TestRequest::post().uri(&uri), &alice).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "bob");
    assert_eq!(body["is_subscribed"], true);
    assert_eq!(body["recipes_count"], 2);
    assert_eq!(body["recipes"].as_array().unwrap().len(), 2);

    let req = as_user(
        test::TestRequest::post().uri(&format!("/users/{}/subscribe/", alice.id)),
        &alice,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["author"][0].is_string());

    let req = as_user(test::TestRequest::post().uri(&uri), &alice).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"], "subscription already exists");

    let req = as_user(test::TestRequest::post().uri("/users/999/subscribe/"), &alice).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = as_user(
        test::TestRequest::get().uri("/users/subscriptions/?recipes_limit=1"),
        &alice,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let subscribed = body.as_array().unwrap();
    assert_eq!(subscribed.len(), 1);
    assert_eq!(subscribed[0]["username"], "bob");
    assert_eq!(subscribed[0]["recipes"].as_array().unwrap().len(), 1);
    assert_eq!(subscribed[0]["recipes_count"], 2);

    let req = as_user(
        test::TestRequest::get().uri(&format!("/users/{}/", bob.id)),
        &alice,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["is_subscribed"], true);

    let req = as_user(test::TestRequest::delete().uri(&uri), &alice).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let req = as_user(test::TestRequest::delete().uri(&uri), &alice).to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["errors"], "subscription not found");
}

#[actix_web::test]
async fn recipe_listing_pages() {
    let pool = fresh_pool("recipe_listing_pages");
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .configure(api::configure),
    )
    .await;

    let user = seed_user(&pool, "alice", false);
    let tag = seed_tag(&pool, "Dinner");
    let flour = seed_ingredient(&pool, "flour", "g");
    for name in ["First", "Second", "Third"] {
        let req = as_user(
            test::TestRequest::post().uri("/recipes/").set_json(recipe_payload(
                name,
                json!([{ "id": flour.id, "amount": 100 }]),
                json!([tag.id]),
            )),
            &user,
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
    }

    let req = test::TestRequest::get().uri("/recipes/?limit=2").to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    let page = body.as_array().unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0]["name"], "Third");

    let req = test::TestRequest::get()
        .uri("/recipes/?page=2&limit=2")
        .to_request();
    let resp = test::call_service(&app, req).await;
    let body: Value = test::read_body_json(resp).await;
    let page = body.as_array().unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["name"], "First");
}
