// Copyright 2023 Remi Bernotavicius

pub mod api;
pub mod catalog;
pub mod config;
pub mod database;
pub mod import;
pub mod recipe_ingredients;
pub mod relations;
pub mod shopping_list;

mod error;

pub use error::{CatalogError, Result};
