use anyhow::{Context, Result};
use log::info;

mod api;
mod config;
mod db;
mod schema;
mod web;

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config::Config::from_env()?;
    let db = db::Db::connect(&config.database_url)
        .with_context(|| format!("opening database {}", config.database_url))?;

    info!(
        "store listening on {}:{} (origin {}, watch <= {:?})",
        config.bind_host, config.port, config.allowed_origin, config.max_watch
    );

    let state = web::AppState::new(db, config.max_watch);
    web::new_http_server(state, &config).await?;
    Ok(())
}
