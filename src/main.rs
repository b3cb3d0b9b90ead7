use ecfr_ingest::config::IngestConfig;
use ecfr_ingest::ingest::{run_catalog_build, run_legislation_download, run_regulation_crawl};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = IngestConfig::from_env();
    let mode = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "regulations".to_string());

    let result = match mode.as_str() {
        "catalog" => run_catalog_build(&config).await,
        "regulations" => run_regulation_crawl(&config).await,
        "legislation" => run_legislation_download(&config).await,
        other => Err(format!(
            "Unknown mode `{other}` (expected catalog, regulations, or legislation)"
        )),
    };

    match result {
        Ok(path) => tracing::info!("Wrote {}", path.display()),
        Err(err) => {
            tracing::error!("Ingest failed: {err}");
            std::process::exit(1);
        }
    }
}
