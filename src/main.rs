mod config;
mod db;
mod records;
mod routes;
mod services;
mod state;
mod store;

use std::sync::Arc;

use crate::services::auth::{AuthProvider, GoTrueClient};
use crate::services::media::MediaStore;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = config::AppConfig::from_env();
    let backend = db::connect(config.database.as_ref()).await;

    // Auth and media are optional: admin login or uploads are disabled without them.
    let auth: Option<Arc<dyn AuthProvider>> = match config.auth.as_ref().map(GoTrueClient::new) {
        Some(Ok(client)) => {
            tracing::info!("auth provider configured");
            Some(Arc::new(client))
        }
        Some(Err(e)) => {
            tracing::error!(error = %e, "auth client init failed; admin login disabled");
            None
        }
        None => {
            tracing::warn!("AUTH_URL/AUTH_PUBLIC_KEY not set; admin login disabled");
            None
        }
    };

    let media = match config.media.as_ref().map(MediaStore::from_config) {
        Some(Ok(store)) => Some(Arc::new(store)),
        Some(Err(e)) => {
            tracing::error!(error = %e, "media store init failed; gallery uploads disabled");
            None
        }
        None => {
            tracing::warn!("MEDIA_S3_* not set; gallery uploads disabled");
            None
        }
    };

    let state = state::AppState::new(backend, auth, media)
        .with_reorder_retry(config.reorder_retry)
        .with_cookie_secure(config.cookie_secure);

    let dirs = routes::StaticDirs { website: config.website_dir, admin: config.admin_dir };
    let app = routes::app(state, &dirs);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .expect("failed to bind");

    tracing::info!(port = config.port, "aurenix listening");
    axum::serve(listener, app).await.expect("server failed");
}
