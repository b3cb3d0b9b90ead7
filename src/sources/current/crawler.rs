use crate::runtime::fetcher::Fetcher;
use crate::sources::current::parser::{
    hierarchy_path_from_url, parse_content_page, CrawledSection, HierarchyPath,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Regulations nested the way the reading view nests them: chapter →
/// subchapter → part → sections, with optional subparts inside a part.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulationTree {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub chapters: BTreeMap<String, RegChapter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegChapter {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sub_chapters: BTreeMap<String, RegSubChapter>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegSubChapter {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parts: BTreeMap<String, RegPart>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegPart {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sections: BTreeMap<String, CrawledSection>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sub_parts: BTreeMap<String, RegPart>,
}

/// Sole owner of the shared tree. Page callbacks may run concurrently, so
/// every read-create-write of the nested maps happens inside one lock.
#[derive(Debug, Default)]
pub struct SectionAccumulator {
    tree: Mutex<RegulationTree>,
}

impl SectionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn merge(&self, path: &HierarchyPath, section: CrawledSection) -> Result<(), String> {
        let mut tree = self
            .tree
            .lock()
            .map_err(|e| format!("Accumulator lock poisoned: {e}"))?;

        let part = tree
            .chapters
            .entry(path.chapter.clone())
            .or_default()
            .sub_chapters
            .entry(path.subchapter.clone())
            .or_default()
            .parts
            .entry(path.part.clone())
            .or_default();
        let slot = match &path.subpart {
            Some(subpart) => part.sub_parts.entry(subpart.clone()).or_default(),
            None => part,
        };
        slot.sections.insert(section.id.clone(), section);
        Ok(())
    }

    pub fn into_tree(self) -> Result<RegulationTree, String> {
        self.tree
            .into_inner()
            .map_err(|e| format!("Accumulator lock poisoned: {e}"))
    }
}

#[derive(Debug, Clone)]
pub struct CrawlLimits {
    /// Pause before every page request.
    pub min_delay: Duration,
    pub allowed_domains: Vec<String>,
}

impl CrawlLimits {
    pub fn new(min_delay: Duration, allowed_domains: &[&str]) -> Self {
        Self {
            min_delay,
            allowed_domains: allowed_domains.iter().map(|d| d.to_string()).collect(),
        }
    }

    fn allows(&self, url: &reqwest::Url) -> bool {
        url.host_str()
            .map(|host| self.allowed_domains.iter().any(|domain| domain == host))
            .unwrap_or(false)
    }
}

/// Sequential, rate-limited traversal of the reading view's next-link
/// chain. A page that fails to fetch or parse ends the chain (its next
/// link is unreachable); whatever accumulated is still flushed by the
/// caller.
pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    limits: CrawlLimits,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn Fetcher>, limits: CrawlLimits) -> Self {
        Self { fetcher, limits }
    }

    pub async fn crawl(&self, seed_url: &str) -> Result<RegulationTree, String> {
        let accumulator = SectionAccumulator::new();
        let mut next_url =
            Some(reqwest::Url::parse(seed_url).map_err(|e| format!("Invalid seed URL {seed_url}: {e}"))?);
        let mut pages_visited = 0usize;

        while let Some(url) = next_url.take() {
            if !self.limits.allows(&url) {
                tracing::warn!("Refusing off-domain page {url}");
                break;
            }

            tokio::time::sleep(self.limits.min_delay).await;

            let html = match self.fetcher.fetch(url.as_str()).await {
                Ok(html) => html,
                Err(err) => {
                    tracing::warn!("Skipping page {url}: {err}");
                    break;
                }
            };
            let extract = match parse_content_page(&html) {
                Ok(extract) => extract,
                Err(err) => {
                    tracing::warn!("Skipping undecodable page {url}: {err}");
                    break;
                }
            };

            let path = hierarchy_path_from_url(url.path());
            for section in extract.sections {
                accumulator.merge(&path, section)?;
            }
            pages_visited += 1;

            next_url = match extract.next {
                Some(link) => {
                    tracing::info!(
                        "Next: {} ({})",
                        link.title.as_deref().unwrap_or("untitled"),
                        link.href
                    );
                    match url.join(&link.href) {
                        Ok(resolved) => Some(resolved),
                        Err(err) => {
                            tracing::warn!("Dropping unresolvable next link {}: {err}", link.href);
                            None
                        }
                    }
                }
                None => None,
            };
        }

        tracing::info!("Crawl finished after {pages_visited} pages");
        accumulator.into_tree()
    }
}
