// Copyright 2023 Remi Bernotavicius

use crate::database;
use crate::database::models::{Ingredient, NewIngredient};
use crate::Result;
use diesel::Connection as _;
use diesel::ExpressionMethods as _;
use diesel::OptionalExtension as _;
use diesel::QueryDsl as _;
use diesel::RunQueryDsl as _;
use diesel::SelectableHelper as _;
use serde::Deserialize;
use std::fs::File;
use std::path::Path;

#[derive(Deserialize, Debug)]
struct IngredientRecord {
    name: String,
    measurement_unit: String,
}

/// Returns whether a row was actually written; a (name, unit) pair already
/// in the catalog is left alone.
fn import_record(conn: &mut database::Connection, record: IngredientRecord) -> Result<bool> {
    use database::schema::ingredients::dsl::*;

    let existing = ingredients
        .select(Ingredient::as_select())
        .filter(name.eq(&record.name))
        .filter(measurement_unit.eq(&record.measurement_unit))
        .get_result(conn)
        .optional()?;
    if existing.is_some() {
        return Ok(false);
    }

    diesel::insert_into(ingredients)
        .values(NewIngredient {
            name: record.name,
            measurement_unit: record.measurement_unit,
        })
        .execute(conn)?;
    Ok(true)
}

/// Loads the ingredient catalog from a JSON array of
/// `{"name": ..., "measurement_unit": ...}` records.
pub struct IngredientImporter {
    pending: Vec<IngredientRecord>,

    num_imported: usize,
    total: usize,
}

impl IngredientImporter {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let pending: Vec<IngredientRecord> = serde_json::from_reader(file)?;
        let total = pending.len();

        Ok(Self {
            pending,
            num_imported: 0,
            total,
        })
    }

    pub fn done(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn num_imported(&self) -> usize {
        self.num_imported
    }

    pub fn percent_done(&self) -> f32 {
        (self.total - self.pending.len()) as f32 / self.total as f32
    }

    pub fn import_one(&mut self, conn: &mut database::Connection) -> Result<()> {
        assert!(!self.done());

        const BATCH_SIZE: usize = 50;
        let count = self.pending.len().min(BATCH_SIZE);
        let batch: Vec<_> = self.pending.drain(..count).collect();

        conn.transaction(|conn| {
            for record in batch {
                if import_record(conn, record)? {
                    self.num_imported += 1;
                }
            }
            Ok(())
        })
    }
}

pub fn import_ingredients(mut conn: database::Connection, path: impl AsRef<Path>) -> Result<()> {
    let mut importer = IngredientImporter::new(path)?;

    while !importer.done() {
        importer.import_one(&mut conn)?;
        println!("imported {}%", importer.percent_done() * 100.0);
    }
    println!("{} new ingredients", importer.num_imported());

    Ok(())
}

#[cfg(test)]
use crate::CatalogError;

#[cfg(test)]
fn write_import_file(stem: &str, body: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("{stem}-{}.json", std::process::id()));
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn import_skips_pairs_already_present() {
    let mut conn = database::test_connection();
    database::test_data::ingredient(&mut conn, "мука", "г");

    let path = write_import_file(
        "catalog-import-skip",
        r#"[
            {"name": "мука", "measurement_unit": "г"},
            {"name": "мука", "measurement_unit": "стакан"},
            {"name": "молоко", "measurement_unit": "мл"},
            {"name": "молоко", "measurement_unit": "мл"}
        ]"#,
    );

    let mut importer = IngredientImporter::new(&path).unwrap();
    assert!(!importer.done());
    while !importer.done() {
        importer.import_one(&mut conn).unwrap();
    }
    assert_eq!(importer.percent_done(), 1.0);
    assert_eq!(importer.num_imported(), 2);

    let catalog = crate::catalog::list_ingredients(&mut conn, None).unwrap();
    let pairs: Vec<_> = catalog
        .iter()
        .map(|i| (i.name.as_str(), i.measurement_unit.as_str()))
        .collect();
    assert_eq!(
        pairs,
        vec![("мука", "г"), ("мука", "стакан"), ("молоко", "мл")]
    );

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn import_is_rerunnable() {
    let mut conn = database::test_connection();
    let path = write_import_file(
        "catalog-import-rerun",
        r#"[{"name": "соль", "measurement_unit": "г"}]"#,
    );

    let mut importer = IngredientImporter::new(&path).unwrap();
    while !importer.done() {
        importer.import_one(&mut conn).unwrap();
    }
    assert_eq!(importer.num_imported(), 1);

    let mut importer = IngredientImporter::new(&path).unwrap();
    while !importer.done() {
        importer.import_one(&mut conn).unwrap();
    }
    assert_eq!(importer.num_imported(), 0);
    assert_eq!(crate::catalog::list_ingredients(&mut conn, None).unwrap().len(), 1);

    std::fs::remove_file(&path).unwrap();
}

#[test]
fn malformed_import_file_is_rejected() {
    let path = write_import_file("catalog-import-bad", "not json at all");
    let error = IngredientImporter::new(&path).err().unwrap();
    assert!(matches!(error, CatalogError::Import(_)), "{error:?}");
    std::fs::remove_file(&path).unwrap();
}
