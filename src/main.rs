use std::{process, sync::Arc};

use ritrovo::{
    application::{
        accounts::AccountService,
        compose::ComposeService,
        error::AppError,
        feed::FeedService,
        repos::{GroupsRepo, PostsRepo, PostsWriteRepo, SessionsRepo, UsersRepo},
    },
    config,
    infra::{
        db::PostgresRepositories,
        error::InfraError,
        http::{self, HttpState},
        telemetry,
    },
};
use time::Duration as SessionTtl;
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt().with_max_level(Level::ERROR).finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Migrate(_) => run_migrate(settings).await,
    }
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let repositories = init_repositories(&settings).await?;
    let state = build_http_state(repositories, &settings);

    // Stale sessions accumulate between restarts; sweep them once at boot.
    match state.accounts.purge_expired_sessions().await {
        Ok(0) => {}
        Ok(purged) => info!(target = "ritrovo::startup", purged, "purged expired sessions"),
        Err(err) => warn!(
            target = "ritrovo::startup",
            error = %err,
            "failed to purge expired sessions"
        ),
    }

    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    info!(
        target = "ritrovo::startup",
        addr = %settings.server.addr,
        "listening"
    );

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    Ok(())
}

async fn run_migrate(settings: config::Settings) -> Result<(), AppError> {
    let database_url = require_database_url(&settings)?;

    let pool = PostgresRepositories::connect(database_url, 1)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    info!(target = "ritrovo::migrate", "migrations applied");
    Ok(())
}

fn require_database_url(settings: &config::Settings) -> Result<&str, AppError> {
    settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| AppError::from(InfraError::configuration("database url is not configured")))
}

async fn init_repositories(
    settings: &config::Settings,
) -> Result<Arc<PostgresRepositories>, AppError> {
    let database_url = require_database_url(settings)?;

    let pool = PostgresRepositories::connect(database_url, settings.database.max_connections.get())
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| AppError::from(InfraError::database(err.to_string())))?;

    Ok(Arc::new(PostgresRepositories::new(pool)))
}

fn build_http_state(
    repositories: Arc<PostgresRepositories>,
    settings: &config::Settings,
) -> HttpState {
    let posts_repo: Arc<dyn PostsRepo> = repositories.clone();
    let posts_write_repo: Arc<dyn PostsWriteRepo> = repositories.clone();
    let groups_repo: Arc<dyn GroupsRepo> = repositories.clone();
    let users_repo: Arc<dyn UsersRepo> = repositories.clone();
    let sessions_repo: Arc<dyn SessionsRepo> = repositories.clone();

    let feed = Arc::new(FeedService::new(
        posts_repo.clone(),
        groups_repo.clone(),
        users_repo.clone(),
        settings.pagination.page_size.get(),
    ));
    let compose = Arc::new(ComposeService::new(
        posts_repo,
        posts_write_repo,
        groups_repo,
    ));
    let accounts = Arc::new(AccountService::new(
        users_repo,
        sessions_repo,
        SessionTtl::seconds(settings.auth.session_ttl.as_secs() as i64),
    ));

    HttpState {
        feed,
        compose,
        accounts,
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "failed to install shutdown signal handler");
    }
}
