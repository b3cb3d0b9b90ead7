use crate::runtime::fetcher::Fetcher;
use crate::sources::versioner::parser::{decode_fragments, populate_section, Fragment};
use crate::types::{ContainerUnit, LegalUnit, MetaNode, SectionUnit, UnitKind, UnitLabel};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Retrieves one section's full text from the versioned endpoint. A failed
/// fetch is a per-section data gap: surfaced to the caller, never retried.
pub struct SectionFetcher {
    fetcher: Arc<dyn Fetcher>,
    endpoint: String,
}

impl SectionFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher>, endpoint: String) -> Self {
        Self { fetcher, endpoint }
    }

    pub fn section_url(&self, section_id: &str) -> String {
        format!(
            "{}?section={}",
            self.endpoint,
            urlencoding::encode(section_id)
        )
    }

    pub async fn fetch(&self, section_id: &str) -> Result<Vec<Fragment>, String> {
        let body = self.fetcher.fetch(&self.section_url(section_id)).await?;
        decode_fragments(&body)
    }
}

/// Walks a catalog tree top-down, fanning section fetches out as bounded
/// concurrent tasks and joining them before each container completes.
pub struct TreeBuilder {
    sections: Arc<SectionFetcher>,
    permits: Arc<Semaphore>,
}

impl TreeBuilder {
    pub fn new(fetcher: Arc<dyn Fetcher>, endpoint: &str, fetch_width: usize) -> Self {
        Self {
            sections: Arc::new(SectionFetcher::new(fetcher, endpoint.to_string())),
            permits: Arc::new(Semaphore::new(fetch_width.max(1))),
        }
    }

    pub async fn build(&self, meta: &MetaNode) -> LegalUnit {
        match meta.kind {
            UnitKind::Section => LegalUnit::Section(build_section(&self.sections, meta).await),
            kind => LegalUnit::container(kind, self.build_container(kind, meta).await),
        }
    }

    fn build_child<'a>(
        &'a self,
        meta: &'a MetaNode,
    ) -> Pin<Box<dyn Future<Output = LegalUnit> + Send + 'a>> {
        Box::pin(self.build(meta))
    }

    async fn build_container(&self, kind: UnitKind, meta: &MetaNode) -> ContainerUnit {
        let mut body = ContainerUnit::new(meta.identifier.clone(), UnitLabel::from(meta));
        let mut tasks: JoinSet<SectionUnit> = JoinSet::new();

        for child in &meta.children {
            if child.reserved {
                continue;
            }
            if !kind.allowed_children().contains(&child.kind) {
                tracing::warn!(
                    "Unexpected {} under {} {}",
                    child.kind.as_str(),
                    kind.as_str(),
                    meta.identifier
                );
                continue;
            }

            if child.kind == UnitKind::Section {
                let sections = self.sections.clone();
                let permits = self.permits.clone();
                let child = child.clone();
                tasks.spawn(async move {
                    let _permit = permits
                        .acquire_owned()
                        .await
                        .expect("section fetch semaphore is never closed");
                    build_section(&sections, &child).await
                });
            } else {
                let unit = self.build_child(child).await;
                body.children.insert(child.identifier.clone(), unit);
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(section) => {
                    body.children
                        .insert(section.id.clone(), LegalUnit::Section(section));
                }
                Err(e) => {
                    tracing::error!("Section build task failed under {}: {e}", meta.identifier)
                }
            }
        }

        body
    }
}

async fn build_section(sections: &SectionFetcher, meta: &MetaNode) -> SectionUnit {
    let mut section = SectionUnit::new(meta.identifier.clone(), UnitLabel::from(meta));
    match sections.fetch(&meta.identifier).await {
        Ok(fragments) => {
            populate_section(&mut section, &fragments);
            tracing::info!(
                "Parsed section {} ({} paragraphs)",
                section.id,
                fragments.len()
            );
        }
        Err(err) => tracing::warn!("Leaving section {} empty: {err}", section.id),
    }
    section
}
