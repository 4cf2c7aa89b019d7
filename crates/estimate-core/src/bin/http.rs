#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use std::net::SocketAddr;

    use estimate_tool::{Estimate, http_api, load_estimate_from_json};
    use tracing_subscriber::EnvFilter;

    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let addr: SocketAddr = std::env::var("ESTIMATE_TOOL_HTTP_ADDR")
        .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
        .parse()?;

    let estimate = match std::env::var("ESTIMATE_TOOL_ESTIMATE_PATH") {
        Ok(path) => {
            tracing::info!(%path, "loading estimate snapshot");
            load_estimate_from_json(path)?
        }
        Err(_) => Estimate::new(),
    };

    http_api::serve(addr, estimate).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
