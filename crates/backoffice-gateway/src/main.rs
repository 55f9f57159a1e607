use std::{net::SocketAddr, sync::Arc};

use anyhow::Result as AnyResult;
use backoffice_core::{ClientStore, DocumentStore};
use backoffice_delivery::{DisabledMailer, HttpMailer, Mailer};
use backoffice_gateway::{AppState, router};
use backoffice_platform::{
    PgClientStore, PgDocumentStore, RedisBus, ServiceConfig, connect_database, run_migrations,
};
use backoffice_store::{InMemoryClientStore, InMemoryDocumentStore};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> AnyResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "backoffice_gateway=info,tower_http=info".to_string()),
        )
        .init();

    let config = ServiceConfig::from_env("0.0.0.0:8080")?;
    let defaults = config.load_document_defaults()?;

    let (documents, clients): (Arc<dyn DocumentStore>, Arc<dyn ClientStore>) =
        match &config.database_url {
            Some(database_url) => {
                let pool = connect_database(database_url).await?;
                run_migrations(&pool).await?;
                (
                    Arc::new(PgDocumentStore::new(pool.clone())),
                    Arc::new(PgClientStore::new(pool)),
                )
            }
            None => {
                warn!("DATABASE_URL not set; documents are kept in memory and lost on restart");
                (
                    Arc::new(InMemoryDocumentStore::new()),
                    Arc::new(InMemoryClientStore::new()),
                )
            }
        };

    let mailer: Arc<dyn Mailer> = match &config.email.api_key {
        Some(api_key) => Arc::new(HttpMailer::new(
            config.email.api_url.clone(),
            api_key.clone(),
            config.email.from.clone(),
        )?),
        None => {
            warn!("EMAIL_API_KEY not set; sending documents by email is disabled");
            Arc::new(DisabledMailer)
        }
    };

    let redis = config
        .redis_url
        .as_deref()
        .map(RedisBus::connect)
        .transpose()?;

    let state = AppState::new(
        documents,
        clients,
        mailer,
        Arc::new(defaults),
        config.public_origin.clone(),
        redis,
    );

    let addr: SocketAddr = config.http_addr.parse()?;
    info!("gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
