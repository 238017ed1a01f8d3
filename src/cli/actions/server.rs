use crate::{
    api,
    cli::telemetry,
    session::{SessionConfig, SessionProtocol, TokenIssuer},
    store::{CredentialStore, MemoryCredentialStore, PgCredentialStore},
};
use anyhow::{Context, Result, anyhow};
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

const MEMORY_SCHEME: &str = "memory";

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub access_token_secret: SecretString,
    pub refresh_token_secret: SecretString,
    pub access_token_ttl_seconds: u64,
    pub refreshed_access_token_ttl_seconds: u64,
    pub refresh_token_ttl_seconds: u64,
    pub insecure_cookie: bool,
    pub cors_origins: Vec<String>,
}

impl Args {
    fn session_config(&self) -> SessionConfig {
        SessionConfig::new()
            .with_access_token_ttl_seconds(self.access_token_ttl_seconds)
            .with_refreshed_access_token_ttl_seconds(self.refreshed_access_token_ttl_seconds)
            .with_refresh_token_ttl_seconds(self.refresh_token_ttl_seconds)
            .with_cookie_secure(!self.insecure_cookie)
    }
}

enum Backend {
    Memory(Arc<MemoryCredentialStore>),
    Postgres(Arc<PgCredentialStore>),
}

impl Backend {
    async fn open(dsn: &str) -> Result<Self> {
        let url = Url::parse(dsn).context("Invalid DSN")?;
        match url.scheme() {
            MEMORY_SCHEME => {
                warn!("Using the in-memory credential store, accounts are lost on restart");
                Ok(Self::Memory(Arc::new(MemoryCredentialStore::new())))
            }
            "postgres" | "postgresql" => {
                let store = PgCredentialStore::connect(dsn)
                    .await
                    .context("Failed to connect to database")?;
                store
                    .ensure_schema()
                    .await
                    .context("Failed to prepare database schema")?;
                Ok(Self::Postgres(Arc::new(store)))
            }
            scheme => Err(anyhow!("Unsupported DSN scheme: {scheme}")),
        }
    }

    fn store(&self) -> Arc<dyn CredentialStore> {
        match self {
            Self::Memory(store) => Arc::clone(store) as Arc<dyn CredentialStore>,
            Self::Postgres(store) => Arc::clone(store) as Arc<dyn CredentialStore>,
        }
    }

    async fn close(&self) {
        if let Self::Postgres(store) = self {
            store.close().await;
        }
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the store cannot be opened, the secrets are unusable,
/// or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let config = args.session_config();
    let tokens = TokenIssuer::new(&args.access_token_secret, &args.refresh_token_secret)
        .context("Invalid token secrets")?;
    let cors = api::cors_layer(&args.cors_origins)?;

    let backend = Backend::open(&args.dsn).await?;
    let protocol = Arc::new(SessionProtocol::new(backend.store(), tokens, config));

    info!(
        port = args.port,
        access_ttl = args.access_token_ttl_seconds,
        refresh_ttl = args.refresh_token_ttl_seconds,
        secure_cookie = !args.insecure_cookie,
        "Starting sesi"
    );

    let result = api::serve(args.port, api::app(protocol, cors), shutdown_signal()).await;

    backend.close().await;
    telemetry::shutdown_tracer();

    result
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
