pub mod config;
pub mod contracts;
pub mod db;
pub mod pg_store;
pub mod redis_bus;

pub use config::{EmailConfig, ServiceConfig};
pub use contracts::{
    ErrorBody, ListDocumentsQuery, ListDocumentsResponse, MailtoResponse, NewDocumentQuery,
    PreviewRequest, PreviewResponse, SendRequest, SendResponse, ShareRequest, ShareResponse,
};
pub use db::{connect_database, run_migrations};
pub use pg_store::{PgClientStore, PgDocumentStore};
pub use redis_bus::RedisBus;
