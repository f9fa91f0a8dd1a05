use anyhow::Result;
use tracing::{debug, error, info, trace};

use super::initdb::apply_migrations;
use super::serve::run_server;
use crate::config::{Settings, initialize_app_state_with_url};
use crate::router::create_router;

pub async fn migrate_and_serve(database_url: &str, bind_address: &str, settings: &Settings) -> Result<()> {
    trace!("Entering migrate_and_serve function");
    info!("Applying database migrations and starting server");
    debug!("Database URL: {}", database_url);
    debug!("Bind address: {}", bind_address);

    let state = match initialize_app_state_with_url(database_url, settings).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application state: {}", e);
            return Err(e);
        }
    };

    apply_migrations(&state.db).await?;

    run_server(create_router(state), bind_address).await
}
