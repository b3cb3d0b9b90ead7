use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Fixed, versioned full-text endpoint; one section per request via the
/// `section` query parameter.
pub const VERSIONER_FULL_URL: &str =
    "https://www.ecfr.gov/api/versioner/v1/full/2025-04-10/title-8.xml";

/// First page of the regulations reading view; every later page is reached
/// through its next-content link.
pub const REGULATIONS_SEED_URL: &str =
    "https://www.ecfr.gov/current/title-8/chapter-I/subchapter-A/part-1/section-1.1";

pub const LEGISLATION_LISTING_URL: &str =
    "https://www.uscis.gov/laws-and-policy/legislation/immigration-and-nationality-act";

pub const ALLOWED_CRAWL_DOMAINS: &[&str] = &["www.ecfr.gov", "ecfr.gov"];

pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.3.1 Safari/605.1.15";

pub const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";

const DEFAULT_OUTPUT_DIR: &str = "documents";
const DEFAULT_CATALOG_PATH: &str = "documents/legislation/title-8.json";
const DEFAULT_FETCH_WIDTH: usize = 8;
const DEFAULT_CRAWL_DELAY_MS: u64 = 5_000;
const DEFAULT_DOWNLOAD_RETRIES: u32 = 4;

#[derive(Debug, Clone)]
pub struct IngestConfig {
    pub output_dir: PathBuf,
    pub catalog_path: PathBuf,
    /// Upper bound on simultaneous in-flight section fetches.
    pub fetch_width: usize,
    /// Minimum pause before each page visit of the paginated crawl.
    pub crawl_delay: Duration,
    pub download_retries: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            fetch_width: DEFAULT_FETCH_WIDTH,
            crawl_delay: Duration::from_millis(DEFAULT_CRAWL_DELAY_MS),
            download_retries: DEFAULT_DOWNLOAD_RETRIES,
        }
    }
}

impl IngestConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            output_dir: env::var("ECFR_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            catalog_path: env::var("ECFR_CATALOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.catalog_path),
            fetch_width: parse_env("ECFR_FETCH_WIDTH", defaults.fetch_width).max(1),
            crawl_delay: Duration::from_millis(parse_env(
                "ECFR_CRAWL_DELAY_MS",
                defaults.crawl_delay.as_millis() as u64,
            )),
            download_retries: parse_env("ECFR_DOWNLOAD_RETRIES", defaults.download_retries),
        }
    }
}

fn parse_env<T: std::str::FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or(default),
        Err(_) => default,
    }
}
