//! The items API server.

use items_api::{
    app,
    infra::{config, database, logging},
};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    dotenvy::dotenv().ok();
    color_eyre::install()?;
    let config = config::load_config()?;
    let _guard = logging::init_logging(&config.logging);

    let db = database::init_db(&config.database)?;
    database::ensure_schema(&db).await?;

    let address = (config.server.address.as_str(), config.server.http_port);
    let listener = TcpListener::bind(address).await?;
    app::run_app(listener, db, config).await?;

    Ok(())
}
