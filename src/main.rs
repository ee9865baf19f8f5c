// Copyright 2023 Remi Bernotavicius

use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use clap::Subcommand;
use recipe_catalog::{api, config, database, import};
use std::path::PathBuf;

type Error = Box<dyn std::error::Error + Send + Sync + 'static>;
type Result<T> = std::result::Result<T, Error>;

#[derive(Parser, Debug)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    ImportIngredients { path: PathBuf },
    Serve,
}

async fn serve(config: config::Config) -> Result<()> {
    let pool = database::establish_pool(&config.database_path)?;
    let data = web::Data::new(pool);

    log::info!("listening on {}:{}", config.bind_address, config.port);
    HttpServer::new(move || {
        App::new()
            .wrap(actix_cors::Cors::permissive())
            .wrap(Logger::default())
            .app_data(data.clone())
            .configure(api::configure)
    })
    .bind((config.bind_address.as_str(), config.port))?
    .run()
    .await?;
    Ok(())
}

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    let args = Args::parse();
    let config = config::Config::load()?;
    match args.commands {
        Commands::ImportIngredients { path } => {
            let conn = database::establish_connection(&config.database_path)?;
            import::import_ingredients(conn, path)?;
        }
        Commands::Serve => serve(config).await?,
    }
    Ok(())
}
