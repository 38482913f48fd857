use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    let http_port = std::env::var("GURUKUL_HTTP_PORT").unwrap_or_else(|_| "7878".to_string());
    let data_root = std::env::var("GURUKUL_DATA_FOLDER").unwrap_or_else(|_| "data".to_string());
    let force_demo = std::env::var("GURUKUL_FORCE_DEMO").unwrap_or_else(|_| "false".to_string());
    let demo_role = std::env::var("GURUKUL_DEMO_ROLE").unwrap_or_else(|_| "admin".to_string());
    let demo_rebind = std::env::var("GURUKUL_DEMO_REBIND").unwrap_or_else(|_| "true".to_string());
    info!(
        target: "gurukul",
        "Gurukul starting: RUST_LOG='{}', http_port={}, data_root='{}', force_demo={}, demo_role={}, demo_rebind={}",
        rust_log, http_port, data_root, force_demo, demo_role, demo_rebind
    );

    gurukul::server::run().await
}
