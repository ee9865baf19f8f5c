// Copyright 2023 Remi Bernotavicius

use crate::database;
use crate::database::models::{
    Ingredient, IngredientId, NewIngredient, NewRecipe, NewTag, NewUser, Recipe, RecipeId,
    RecipeSummary, RecipeTag, Tag, TagId, User, UserId,
};
use crate::error::{constraint_error, CatalogError};
use crate::recipe_ingredients::{self, IngredientAmount};
use crate::Result;
use diesel::Connection as _;
use diesel::ExpressionMethods as _;
use diesel::JoinOnDsl as _;
use diesel::OptionalExtension as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use diesel::TextExpressionMethods as _;

pub const MIN_COOKING_TIME: i32 = 1;
pub const MAX_COOKING_TIME: i32 = 28800;

const NAME_LIMIT: usize = 256;
const USERNAME_LIMIT: usize = 150;
const EMAIL_LIMIT: usize = 254;
const SLUG_LIMIT: usize = 50;

fn cyrillic(c: char) -> Option<&'static str> {
    Some(match c {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "yo",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "shch",
        'ы' => "i",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    })
}

/// Derive a URL slug from a tag name: lowercased, Cyrillic letters
/// transliterated, whatever else is not ASCII dropped, runs of separators
/// collapsed into single hyphens, and the result capped at 50 characters.
pub fn slugify(name: &str) -> String {
    let mut ascii = String::new();
    for c in name.to_lowercase().chars() {
        if let Some(tr) = cyrillic(c) {
            ascii.push_str(tr);
        } else if c.is_ascii() {
            ascii.push(c);
        }
    }

    let mut slug = String::new();
    let mut gap = false;
    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            if gap && !slug.is_empty() {
                slug.push('-');
            }
            gap = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' {
            gap = true;
        }
    }

    // Transliteration can expand the name, so the cap applies to the result.
    let capped: String = slug
        .trim_matches(['-', '_'])
        .chars()
        .take(SLUG_LIMIT)
        .collect();
    capped.trim_end_matches(['-', '_']).to_string()
}

fn validate_name(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::validation(field, "cannot be blank"));
    }
    if value.chars().count() > NAME_LIMIT {
        return Err(CatalogError::validation(
            field,
            format!("at most {NAME_LIMIT} characters"),
        ));
    }
    Ok(())
}

fn validate_username(value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(CatalogError::validation("username", "cannot be blank"));
    }
    if value.chars().count() > USERNAME_LIMIT {
        return Err(CatalogError::validation(
            "username",
            format!("at most {USERNAME_LIMIT} characters"),
        ));
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-');
    if !value.chars().all(allowed) {
        return Err(CatalogError::validation(
            "username",
            "only letters, digits and .@+-_ are allowed",
        ));
    }
    Ok(())
}

fn validate_color(value: &str) -> Result<()> {
    let hex = value.strip_prefix('#').unwrap_or("");
    let digits_ok = (hex.len() == 3 || hex.len() == 6) && hex.chars().all(|c| c.is_ascii_hexdigit());
    if !value.starts_with('#') || !digits_ok {
        return Err(CatalogError::validation(
            "color",
            "must be a hex color like #RRGGBB or #RGB",
        ));
    }
    Ok(())
}

pub fn create_user(conn: &mut database::Connection, new: NewUser) -> Result<User> {
    use database::schema::users::dsl::*;

    validate_username(&new.username)?;
    if new.email.trim().is_empty() || !new.email.contains('@') {
        return Err(CatalogError::validation(
            "email",
            "must be a valid email address",
        ));
    }
    if new.email.chars().count() > EMAIL_LIMIT {
        return Err(CatalogError::validation(
            "email",
            format!("at most {EMAIL_LIMIT} characters"),
        ));
    }
    for (field, value) in [("first_name", &new.first_name), ("last_name", &new.last_name)] {
        if value.trim().is_empty() {
            return Err(CatalogError::validation(field, "cannot be blank"));
        }
        if value.chars().count() > USERNAME_LIMIT {
            return Err(CatalogError::validation(
                field,
                format!("at most {USERNAME_LIMIT} characters"),
            ));
        }
    }

    diesel::insert_into(users)
        .values(new)
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(|e| constraint_error("user", "user", e))
}

pub fn get_user(conn: &mut database::Connection, user: UserId) -> Result<User> {
    use database::schema::users::dsl::*;

    users
        .find(user)
        .first(conn)
        .optional()?
        .ok_or_else(|| CatalogError::not_found("user"))
}

pub fn list_users(conn: &mut database::Connection) -> Result<Vec<User>> {
    use database::schema::users::dsl::*;

    Ok(users.order(id.desc()).load(conn)?)
}

/// Authors the given user is subscribed to, newest account first.
pub fn list_subscribed_authors(
    conn: &mut database::Connection,
    follower: UserId,
) -> Result<Vec<User>> {
    use database::schema::{subscriptions, users};

    Ok(subscriptions::table
        .inner_join(users::table.on(users::id.eq(subscriptions::author_id)))
        .filter(subscriptions::user_id.eq(follower))
        .order(users::id.desc())
        .select(User::as_select())
        .load(conn)?)
}

/// A blank slug is derived from the name; an explicit one is kept as given.
pub fn create_tag(
    conn: &mut database::Connection,
    tag_name: &str,
    tag_color: &str,
    tag_slug: Option<&str>,
) -> Result<Tag> {
    use database::schema::tags::dsl::*;

    validate_name("name", tag_name)?;
    validate_color(tag_color)?;

    let final_slug = match tag_slug {
        Some(given) if !given.is_empty() => {
            if given.chars().count() > SLUG_LIMIT {
                return Err(CatalogError::validation(
                    "slug",
                    format!("at most {SLUG_LIMIT} characters"),
                ));
            }
            if !given
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
            {
                return Err(CatalogError::validation(
                    "slug",
                    "only letters, digits, hyphens and underscores are allowed",
                ));
            }
            given.to_owned()
        }
        _ => {
            let derived = slugify(tag_name);
            if derived.is_empty() {
                return Err(CatalogError::validation(
                    "name",
                    "cannot derive a slug from this name",
                ));
            }
            derived
        }
    };

    diesel::insert_into(tags)
        .values(NewTag {
            name: tag_name.to_owned(),
            color: tag_color.to_owned(),
            slug: final_slug,
        })
        .returning(Tag::as_returning())
        .get_result(conn)
        .map_err(|e| constraint_error("tag", "tag", e))
}

pub fn get_tag(conn: &mut database::Connection, tag: TagId) -> Result<Tag> {
    use database::schema::tags::dsl::*;

    tags.find(tag)
        .first(conn)
        .optional()?
        .ok_or_else(|| CatalogError::not_found("tag"))
}

pub fn list_tags(conn: &mut database::Connection) -> Result<Vec<Tag>> {
    use database::schema::tags::dsl::*;

    Ok(tags.order(id.desc()).load(conn)?)
}

pub fn create_ingredient(conn: &mut database::Connection, new: NewIngredient) -> Result<Ingredient> {
    use database::schema::ingredients::dsl::*;

    validate_name("name", &new.name)?;
    validate_name("measurement_unit", &new.measurement_unit)?;

    diesel::insert_into(ingredients)
        .values(new)
        .returning(Ingredient::as_returning())
        .get_result(conn)
        .map_err(|e| constraint_error("ingredient", "ingredient", e))
}

pub fn get_ingredient(conn: &mut database::Connection, ingredient: IngredientId) -> Result<Ingredient> {
    use database::schema::ingredients::dsl::*;

    ingredients
        .find(ingredient)
        .first(conn)
        .optional()?
        .ok_or_else(|| CatalogError::not_found("ingredient"))
}

/// Catalog order; an optional prefix narrows by name, the way the search
/// box on the recipe form expects.
pub fn list_ingredients(
    conn: &mut database::Connection,
    prefix: Option<&str>,
) -> Result<Vec<Ingredient>> {
    use database::schema::ingredients::dsl::*;

    let mut query = ingredients.order(id.asc()).into_boxed();
    if let Some(prefix) = prefix {
        query = query.filter(name.like(format!("{prefix}%")));
    }
    Ok(query.load(conn)?)
}

/// Everything needed to publish or rework a recipe in one call.
#[derive(Clone, Debug)]
pub struct RecipeInput {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image_ref: String,
    pub tags: Vec<TagId>,
    pub ingredients: Vec<IngredientAmount>,
}

fn validate_recipe_scalars(input: &RecipeInput) -> Result<()> {
    validate_name("name", &input.name)?;
    if input.text.trim().is_empty() {
        return Err(CatalogError::validation("text", "cannot be blank"));
    }
    if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&input.cooking_time) {
        return Err(CatalogError::validation(
            "cooking_time",
            format!(
                "must be between {MIN_COOKING_TIME} and {MAX_COOKING_TIME} minutes, got {}",
                input.cooking_time
            ),
        ));
    }
    if input.image_ref.trim().is_empty() {
        return Err(CatalogError::validation("image", "cannot be blank"));
    }
    Ok(())
}

fn attach_tags(conn: &mut database::Connection, recipe: RecipeId, wanted: &[TagId]) -> Result<()> {
    use database::schema::recipe_tags::dsl::*;

    // Set semantics: a tag listed twice is attached once.
    let mut unique: Vec<TagId> = Vec::new();
    for &tag in wanted {
        if !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    if unique.is_empty() {
        return Ok(());
    }

    let rows: Vec<_> = unique
        .into_iter()
        .map(|tag| RecipeTag {
            recipe_id: recipe,
            tag_id: tag,
        })
        .collect();
    diesel::insert_into(recipe_tags)
        .values(rows)
        .execute(conn)
        .map_err(|e| constraint_error("recipe tag", "tag", e))?;
    Ok(())
}

/// One transaction around the recipe row, its tag set and its ingredient
/// amounts; if any piece is rejected no recipe row remains.
pub fn create_recipe(
    conn: &mut database::Connection,
    author: UserId,
    input: &RecipeInput,
) -> Result<Recipe> {
    validate_recipe_scalars(input)?;
    conn.transaction(|conn| {
        let recipe: Recipe = {
            use database::schema::recipes::dsl::*;

            diesel::insert_into(recipes)
                .values(NewRecipe {
                    author_id: author,
                    name: input.name.clone(),
                    text: input.text.clone(),
                    cooking_time: input.cooking_time,
                    image_ref: input.image_ref.clone(),
                })
                .returning(Recipe::as_returning())
                .get_result(conn)
                .map_err(|e| constraint_error("recipe", "author", e))?
        };
        attach_tags(conn, recipe.id, &input.tags)?;
        recipe_ingredients::create(conn, recipe.id, &input.ingredients)?;
        Ok(recipe)
    })
}

/// Scalars are updated and the tag and ingredient sets replaced as one
/// transaction; a failure keeps the previous version intact.
pub fn update_recipe(
    conn: &mut database::Connection,
    recipe: RecipeId,
    input: &RecipeInput,
) -> Result<Recipe> {
    validate_recipe_scalars(input)?;
    conn.transaction(|conn| {
        let updated: Recipe = {
            use database::schema::recipes::dsl::*;

            diesel::update(recipes.find(recipe))
                .set((
                    name.eq(&input.name),
                    text.eq(&input.text),
                    cooking_time.eq(input.cooking_time),
                    image_ref.eq(&input.image_ref),
                ))
                .returning(Recipe::as_returning())
                .get_result(conn)
                .optional()?
                .ok_or_else(|| CatalogError::not_found("recipe"))?
        };
        {
            use database::schema::recipe_tags::dsl::*;

            diesel::delete(recipe_tags.filter(recipe_id.eq(recipe))).execute(conn)?;
        }
        attach_tags(conn, recipe, &input.tags)?;
        recipe_ingredients::replace(conn, recipe, &input.ingredients)?;
        Ok(updated)
    })
}

/// The foreign keys cascade, so favorites, cart entries and join rows
/// referencing the recipe go with it.
pub fn delete_recipe(conn: &mut database::Connection, recipe: RecipeId) -> Result<()> {
    use database::schema::recipes::dsl::*;

    let deleted = diesel::delete(recipes.find(recipe)).execute(conn)?;
    if deleted == 0 {
        return Err(CatalogError::not_found("recipe"));
    }
    Ok(())
}

pub fn get_recipe(conn: &mut database::Connection, recipe: RecipeId) -> Result<Recipe> {
    use database::schema::recipes::dsl::*;

    recipes
        .find(recipe)
        .first(conn)
        .optional()?
        .ok_or_else(|| CatalogError::not_found("recipe"))
}

/// The listing subset only, for responses that don't carry the whole row.
pub fn get_recipe_summary(
    conn: &mut database::Connection,
    recipe: RecipeId,
) -> Result<RecipeSummary> {
    use database::schema::recipes::dsl::*;

    recipes
        .find(recipe)
        .select(RecipeSummary::as_select())
        .first(conn)
        .optional()?
        .ok_or_else(|| CatalogError::not_found("recipe"))
}

pub fn list_recipes(conn: &mut database::Connection) -> Result<Vec<Recipe>> {
    use database::schema::recipes::dsl::*;

    Ok(recipes
        .order((created_at.desc(), id.desc()))
        .load(conn)?)
}

pub fn recipes_by_author(
    conn: &mut database::Connection,
    author: UserId,
    cap: Option<i64>,
) -> Result<Vec<RecipeSummary>> {
    use database::schema::recipes::dsl::*;

    let mut query = recipes
        .filter(author_id.eq(author))
        .order((created_at.desc(), id.desc()))
        .select(RecipeSummary::as_select())
        .into_boxed();
    if let Some(cap) = cap {
        query = query.limit(cap);
    }
    Ok(query.load(conn)?)
}

pub fn count_recipes_by_author(conn: &mut database::Connection, author: UserId) -> Result<i64> {
    use database::schema::recipes::dsl::*;

    Ok(recipes.filter(author_id.eq(author)).count().get_result(conn)?)
}

pub fn tags_for_recipe(conn: &mut database::Connection, recipe: RecipeId) -> Result<Vec<Tag>> {
    use database::schema::{recipe_tags, tags};

    Ok(recipe_tags::table
        .inner_join(tags::table)
        .filter(recipe_tags::recipe_id.eq(recipe))
        .order(tags::id.desc())
        .select(Tag::as_select())
        .load(conn)?)
}

#[cfg(test)]
use maplit::hashset;
#[cfg(test)]
use std::collections::HashSet;

#[cfg(test)]
fn test_input(ingredients: Vec<IngredientAmount>, tags: Vec<TagId>) -> RecipeInput {
    RecipeInput {
        name: "pancakes".into(),
        text: "mix and fry".into(),
        cooking_time: 20,
        image_ref: "data:image/png;base64,iVBORw0KGgo=".into(),
        tags,
        ingredients,
    }
}

#[test]
fn slugify_transliterates() {
    assert_eq!(slugify("Завтрак"), "zavtrak");
    assert_eq!(slugify("Щи да каша"), "shchi-da-kasha");
    assert_eq!(slugify("объём"), "obyom");
}

#[test]
fn slugify_collapses_separators_and_symbols() {
    assert_eq!(slugify("Hot  Dogs!"), "hot-dogs");
    assert_eq!(slugify("  spaced  out  "), "spaced-out");
    assert_eq!(slugify("___"), "");
}

#[test]
fn slugify_caps_the_result() {
    assert_eq!(slugify(&"a".repeat(60)), "a".repeat(50));

    // A 13-character name that transliterates to 52 characters.
    assert_eq!(slugify(&"щ".repeat(13)), "shch".repeat(12) + "sh");

    // The cut never leaves a trailing separator.
    let spaced = format!("{} bc", "a".repeat(49));
    assert_eq!(slugify(&spaced), "a".repeat(49));
}

#[test]
fn tag_slug_is_derived_when_blank() {
    let mut conn = database::test_connection();

    let tag = create_tag(&mut conn, "На завтрак", "#E26C2D", None).unwrap();
    assert_eq!(tag.slug, "na-zavtrak");

    let explicit = create_tag(&mut conn, "Ужин", "#333", Some("dinner")).unwrap();
    assert_eq!(explicit.slug, "dinner");
}

#[test]
fn derived_tag_slug_stays_within_the_limit() {
    let mut conn = database::test_connection();

    let tag = create_tag(&mut conn, &"щ".repeat(13), "#E26C2D", None).unwrap();
    assert_eq!(tag.slug, "shch".repeat(12) + "sh");
}

#[test]
fn tag_slug_collisions_are_conflicts() {
    let mut conn = database::test_connection();

    create_tag(&mut conn, "Завтрак", "#E26C2D", None).unwrap();
    let error = create_tag(&mut conn, "завтрак", "#49B64E", None).unwrap_err();
    assert!(
        matches!(&error, CatalogError::Conflict { what } if *what == "tag"),
        "{error:?}"
    );
}

#[test]
fn tag_color_is_checked() {
    let mut conn = database::test_connection();

    for bad in ["", "E26C2D", "#12", "#12345", "#GGGGGG", "#1234567"] {
        let error = create_tag(&mut conn, "Завтрак", bad, None).unwrap_err();
        assert!(
            matches!(error, CatalogError::Validation { field: "color", .. }),
            "{bad:?}: {error:?}"
        );
    }
    create_tag(&mut conn, "Завтрак", "#aBc123", None).unwrap();
}

#[test]
fn username_rules() {
    let mut conn = database::test_connection();

    let new = |username: &str| NewUser {
        username: username.into(),
        email: format!("{}@example.com", username.len()),
        first_name: "A".into(),
        last_name: "B".into(),
        is_admin: false,
    };

    create_user(&mut conn, new("good.name_+@-1")).unwrap();
    let too_long = "x".repeat(151);
    for bad in ["", "with space", "семён!", too_long.as_str()] {
        let error = create_user(&mut conn, new(bad)).unwrap_err();
        assert!(
            matches!(error, CatalogError::Validation { field: "username", .. }),
            "{bad:?}: {error:?}"
        );
    }
}

#[test]
fn duplicate_users_are_conflicts() {
    let mut conn = database::test_connection();

    let new = |username: &str, mail: &str| NewUser {
        username: username.into(),
        email: mail.into(),
        first_name: "A".into(),
        last_name: "B".into(),
        is_admin: false,
    };

    create_user(&mut conn, new("vasya", "vasya@example.com")).unwrap();
    for (username, mail) in [("vasya", "other@example.com"), ("petya", "vasya@example.com")] {
        let error = create_user(&mut conn, new(username, mail)).unwrap_err();
        assert!(
            matches!(&error, CatalogError::Conflict { what } if *what == "user"),
            "{error:?}"
        );
    }
}

#[test]
fn ingredient_pairs_are_unique() {
    let mut conn = database::test_connection();

    let new = |ingredient_name: &str, unit: &str| NewIngredient {
        name: ingredient_name.into(),
        measurement_unit: unit.into(),
    };

    create_ingredient(&mut conn, new("мука", "г")).unwrap();
    create_ingredient(&mut conn, new("мука", "стакан")).unwrap();

    let error = create_ingredient(&mut conn, new("мука", "г")).unwrap_err();
    assert!(
        matches!(&error, CatalogError::Conflict { what } if *what == "ingredient"),
        "{error:?}"
    );
}

#[test]
fn ingredient_prefix_search() {
    let mut conn = database::test_connection();
    database::test_data::ingredient(&mut conn, "flour", "g");
    database::test_data::ingredient(&mut conn, "flax seed", "g");
    database::test_data::ingredient(&mut conn, "milk", "ml");

    let found = list_ingredients(&mut conn, Some("fl")).unwrap();
    assert_eq!(found.len(), 2);
    assert_eq!(found[0].name, "flour");
    assert_eq!(found[1].name, "flax seed");

    assert_eq!(list_ingredients(&mut conn, None).unwrap().len(), 3);
}

#[test]
fn recipe_roundtrip_keeps_tags_and_amounts() {
    let mut conn = database::test_connection();
    let author = database::test_data::user(&mut conn, "author");
    let flour = database::test_data::ingredient(&mut conn, "flour", "g");
    let milk = database::test_data::ingredient(&mut conn, "milk", "ml");
    let breakfast = create_tag(&mut conn, "Завтрак", "#E26C2D", None).unwrap();
    let dinner = create_tag(&mut conn, "Ужин", "#49B64E", None).unwrap();

    let input = test_input(
        vec![
            IngredientAmount {
                ingredient_id: flour.id,
                amount: 2,
            },
            IngredientAmount {
                ingredient_id: milk.id,
                amount: 4,
            },
        ],
        // set semantics: the duplicate tag id collapses
        vec![breakfast.id, dinner.id, breakfast.id],
    );
    let recipe = create_recipe(&mut conn, author.id, &input).unwrap();

    let tag_ids: HashSet<_> = tags_for_recipe(&mut conn, recipe.id)
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(tag_ids, hashset![breakfast.id, dinner.id]);

    let amounts: HashSet<_> = recipe_ingredients::list(&mut conn, recipe.id)
        .unwrap()
        .into_iter()
        .map(|(row, ingredient)| (ingredient.id, row.amount))
        .collect();
    assert_eq!(amounts, hashset![(flour.id, 2), (milk.id, 4)]);
}

#[test]
fn failed_recipe_create_leaves_nothing_behind() {
    let mut conn = database::test_connection();
    let author = database::test_data::user(&mut conn, "author");

    // unknown ingredient fails after the recipe row went in
    let input = test_input(
        vec![IngredientAmount {
            ingredient_id: IngredientId::new(777),
            amount: 2,
        }],
        vec![],
    );
    create_recipe(&mut conn, author.id, &input).unwrap_err();
    assert!(list_recipes(&mut conn).unwrap().is_empty());

    // empty ingredient list rejects the recipe outright
    let input = test_input(vec![], vec![]);
    let error = create_recipe(&mut conn, author.id, &input).unwrap_err();
    assert!(matches!(error, CatalogError::Validation { .. }), "{error:?}");
    assert!(list_recipes(&mut conn).unwrap().is_empty());
}

#[test]
fn recipe_with_unknown_tag_is_not_found() {
    let mut conn = database::test_connection();
    let author = database::test_data::user(&mut conn, "author");
    let flour = database::test_data::ingredient(&mut conn, "flour", "g");

    let input = test_input(
        vec![IngredientAmount {
            ingredient_id: flour.id,
            amount: 2,
        }],
        vec![TagId::new(777)],
    );
    let error = create_recipe(&mut conn, author.id, &input).unwrap_err();
    assert!(
        matches!(&error, CatalogError::NotFound { what } if *what == "tag"),
        "{error:?}"
    );
    assert!(list_recipes(&mut conn).unwrap().is_empty());
}

#[test]
fn cooking_time_bounds() {
    let mut conn = database::test_connection();
    let author = database::test_data::user(&mut conn, "author");
    let flour = database::test_data::ingredient(&mut conn, "flour", "g");

    for bad in [0, -1, MAX_COOKING_TIME + 1] {
        let mut input = test_input(
            vec![IngredientAmount {
                ingredient_id: flour.id,
                amount: 2,
            }],
            vec![],
        );
        input.cooking_time = bad;
        let error = create_recipe(&mut conn, author.id, &input).unwrap_err();
        assert!(
            matches!(error, CatalogError::Validation { field: "cooking_time", .. }),
            "{bad}: {error:?}"
        );
    }
}

#[test]
fn update_replaces_tags_and_ingredients() {
    let mut conn = database::test_connection();
    let author = database::test_data::user(&mut conn, "author");
    let flour = database::test_data::ingredient(&mut conn, "flour", "g");
    let salt = database::test_data::ingredient(&mut conn, "salt", "g");
    let breakfast = create_tag(&mut conn, "Завтрак", "#E26C2D", None).unwrap();
    let dinner = create_tag(&mut conn, "Ужин", "#49B64E", None).unwrap();

    let recipe = create_recipe(
        &mut conn,
        author.id,
        &test_input(
            vec![IngredientAmount {
                ingredient_id: flour.id,
                amount: 2,
            }],
            vec![breakfast.id],
        ),
    )
    .unwrap();

    let mut reworked = test_input(
        vec![IngredientAmount {
            ingredient_id: salt.id,
            amount: 7,
        }],
        vec![dinner.id],
    );
    reworked.name = "better pancakes".into();
    let updated = update_recipe(&mut conn, recipe.id, &reworked).unwrap();

    assert_eq!(updated.id, recipe.id);
    assert_eq!(updated.name, "better pancakes");
    assert_eq!(updated.author_id, author.id);

    let tag_ids: Vec<_> = tags_for_recipe(&mut conn, recipe.id)
        .unwrap()
        .into_iter()
        .map(|t| t.id)
        .collect();
    assert_eq!(tag_ids, vec![dinner.id]);

    let listed = recipe_ingredients::list(&mut conn, recipe.id).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].1.name, "salt");
}

#[test]
fn failed_update_keeps_the_old_version() {
    let mut conn = database::test_connection();
    let author = database::test_data::user(&mut conn, "author");
    let flour = database::test_data::ingredient(&mut conn, "flour", "g");

    let recipe = create_recipe(
        &mut conn,
        author.id,
        &test_input(
            vec![IngredientAmount {
                ingredient_id: flour.id,
                amount: 2,
            }],
            vec![],
        ),
    )
    .unwrap();

    let mut broken = test_input(
        vec![IngredientAmount {
            ingredient_id: IngredientId::new(777),
            amount: 2,
        }],
        vec![],
    );
    broken.name = "should not stick".into();
    update_recipe(&mut conn, recipe.id, &broken).unwrap_err();

    let kept = get_recipe(&mut conn, recipe.id).unwrap();
    assert_eq!(kept.name, "pancakes");
    let listed = recipe_ingredients::list(&mut conn, recipe.id).unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].1.name, "flour");
}

#[test]
fn update_of_missing_recipe_is_not_found() {
    let mut conn = database::test_connection();
    let flour = database::test_data::ingredient(&mut conn, "flour", "g");

    let error = update_recipe(
        &mut conn,
        RecipeId::new(777),
        &test_input(
            vec![IngredientAmount {
                ingredient_id: flour.id,
                amount: 2,
            }],
            vec![],
        ),
    )
    .unwrap_err();
    assert!(
        matches!(&error, CatalogError::NotFound { what } if *what == "recipe"),
        "{error:?}"
    );
}

#[test]
fn delete_cascades_to_attachments_and_relations() {
    use crate::relations::{self, Relation};

    let mut conn = database::test_connection();
    let author = database::test_data::user(&mut conn, "author");
    let flour = database::test_data::ingredient(&mut conn, "flour", "g");

    let recipe = create_recipe(
        &mut conn,
        author.id,
        &test_input(
            vec![IngredientAmount {
                ingredient_id: flour.id,
                amount: 2,
            }],
            vec![],
        ),
    )
    .unwrap();
    let favorite = Relation::Favorite {
        user: author.id,
        recipe: recipe.id,
    };
    relations::add(&mut conn, favorite).unwrap();

    delete_recipe(&mut conn, recipe.id).unwrap();

    assert!(recipe_ingredients::list(&mut conn, recipe.id).unwrap().is_empty());
    assert!(!relations::exists(&mut conn, favorite).unwrap());

    let error = delete_recipe(&mut conn, recipe.id).unwrap_err();
    assert!(
        matches!(&error, CatalogError::NotFound { what } if *what == "recipe"),
        "{error:?}"
    );
}

#[test]
fn recipes_list_newest_first() {
    let mut conn = database::test_connection();
    let author = database::test_data::user(&mut conn, "author");
    let flour = database::test_data::ingredient(&mut conn, "flour", "g");

    let mut ids = vec![];
    for recipe_name in ["first", "second", "third"] {
        let mut input = test_input(
            vec![IngredientAmount {
                ingredient_id: flour.id,
                amount: 2,
            }],
            vec![],
        );
        input.name = recipe_name.into();
        ids.push(create_recipe(&mut conn, author.id, &input).unwrap().id);
    }
    ids.reverse();

    let listed: Vec<_> = list_recipes(&mut conn).unwrap().into_iter().map(|r| r.id).collect();
    assert_eq!(listed, ids);
}

#[test]
fn author_listing_respects_the_cap() {
    let mut conn = database::test_connection();
    let author = database::test_data::user(&mut conn, "author");
    let other = database::test_data::user(&mut conn, "other");
    let flour = database::test_data::ingredient(&mut conn, "flour", "g");

    for recipe_name in ["first", "second", "third"] {
        let mut input = test_input(
            vec![IngredientAmount {
                ingredient_id: flour.id,
                amount: 2,
            }],
            vec![],
        );
        input.name = recipe_name.into();
        create_recipe(&mut conn, author.id, &input).unwrap();
    }

    let all = recipes_by_author(&mut conn, author.id, None).unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].name, "third");

    let capped = recipes_by_author(&mut conn, author.id, Some(2)).unwrap();
    assert_eq!(capped.len(), 2);
    assert_eq!(capped[0].name, "third");
    assert_eq!(capped[1].name, "second");

    assert_eq!(count_recipes_by_author(&mut conn, author.id).unwrap(), 3);
    assert_eq!(count_recipes_by_author(&mut conn, other.id).unwrap(), 0);
}

#[test]
fn subscribed_authors_listing() {
    use crate::relations::{self, Relation};

    let mut conn = database::test_connection();
    let reader = database::test_data::user(&mut conn, "reader");
    let first = database::test_data::user(&mut conn, "first");
    let second = database::test_data::user(&mut conn, "second");
    let _stranger = database::test_data::user(&mut conn, "stranger");

    for author in [first.id, second.id] {
        relations::add(
            &mut conn,
            Relation::Subscription {
                user: reader.id,
                author,
            },
        )
        .unwrap();
    }

    let authors: Vec<_> = list_subscribed_authors(&mut conn, reader.id)
        .unwrap()
        .into_iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(authors, vec![second.id, first.id]);
}
