use userdesk::{app, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "userdesk=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init()?;
    tracing::info!(
        environment = ?app_state.config.environment,
        table = %app_state.store.table(),
        password_scheme = ?app_state.config.password_scheme,
        "configuration loaded"
    );

    let host = app_state.config.app_host.clone();
    let port = app_state.config.app_port;
    app::serve(app::build_app(app_state), &host, port).await
}
