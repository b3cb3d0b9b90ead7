use crate::runtime::fetcher::download_with_retry;
use crate::runtime::store;
use crate::sources::current::parser::normalize_text;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One row of the act listing table: act name, statute code, description,
/// and the absolute link to the act's full text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegislationEntry {
    pub act: String,
    pub code: String,
    pub description: String,
    pub link: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accessed_at: Option<String>,
}

pub fn parse_listing(html: &str, base_url: &str) -> Result<Vec<LegislationEntry>, String> {
    let dom = tl::parse(html, tl::ParserOptions::default())
        .map_err(|e| format!("Failed to parse listing HTML: {e}"))?;
    let parser = dom.parser();
    let base = reqwest::Url::parse(base_url)
        .map_err(|e| format!("Invalid listing base URL {base_url}: {e}"))?;

    let mut entries = Vec::new();
    for node in dom.nodes().iter() {
        let Some(tag) = node.as_tag() else {
            continue;
        };
        if tag.name().as_utf8_str().as_ref() != "tr" {
            continue;
        }

        let mut cells = Vec::new();
        let mut href = None;
        for child in tag.children().all(parser).iter() {
            let Some(child_tag) = child.as_tag() else {
                continue;
            };
            match child_tag.name().as_utf8_str().as_ref() {
                "td" => cells.push(normalize_text(&child_tag.inner_text(parser))),
                "a" if href.is_none() => {
                    href = child_tag
                        .attributes()
                        .get("href")
                        .flatten()
                        .map(|value| value.as_utf8_str().to_string());
                }
                _ => {}
            }
        }

        if cells.len() < 3 {
            continue;
        }
        let Some(href) = href.filter(|href| !href.is_empty()) else {
            continue;
        };
        let link = base
            .join(&href)
            .map_err(|e| format!("Failed to resolve act link {href}: {e}"))?
            .to_string();

        entries.push(LegislationEntry {
            act: cells[0].clone(),
            code: cells[1].clone(),
            description: cells[2].clone(),
            link,
            accessed_at: None,
        });
    }

    Ok(entries)
}

/// Fetch every act body with the bounded retry budget, writing one metadata
/// file and one xhtml body per act. Per-act failures are logged and skipped.
pub async fn download_acts(
    client: &reqwest::Client,
    entries: &[LegislationEntry],
    dir: &Path,
    retries: u32,
) -> usize {
    let mut downloaded = 0;

    for entry in entries {
        let act_dir = dir.join(&entry.act);
        let mut stamped = entry.clone();
        stamped.accessed_at = Some(chrono::Utc::now().to_rfc3339());
        if let Err(err) = store::write_json(&act_dir, "metadata.json", &stamped) {
            tracing::error!("Skipping act {}: {err}", entry.act);
            continue;
        }

        tracing::info!("Downloading legislation {} - {}", entry.act, entry.link);
        match download_with_retry(client, &entry.link, retries).await {
            Ok(body) => {
                let name = format!("{}-{}.xhtml", entry.act, entry.code);
                match store::write_bytes(&act_dir, &name, &body) {
                    Ok(_) => downloaded += 1,
                    Err(err) => tracing::error!("Failed to store act {}: {err}", entry.act),
                }
            }
            Err(err) => tracing::warn!("Skipping act {}: {err}", entry.act),
        }
    }

    downloaded
}
