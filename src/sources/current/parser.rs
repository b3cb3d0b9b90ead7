use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use tl::{HTMLTag, Node, Parser};

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("WHITESPACE_RE should compile"));
static CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""citation":"([^"]*)""#).expect("CITATION_RE should compile"));

/// One paragraph of a reading-view section; `id` is the page's own
/// paragraph designator (`data-title`), e.g. "103.1(a)".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawledParagraph {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawledSection {
    pub id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub citation: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub paragraphs: Vec<CrawledParagraph>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextLink {
    pub href: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageExtract {
    pub sections: Vec<CrawledSection>,
    pub next: Option<NextLink>,
}

/// Where a page's sections belong, read off dash-separated URL segments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HierarchyPath {
    pub chapter: String,
    pub subchapter: String,
    pub part: String,
    pub subpart: Option<String>,
}

pub fn hierarchy_path_from_url(path: &str) -> HierarchyPath {
    let mut hierarchy = HierarchyPath::default();
    for segment in path.split('/') {
        let Some((prefix, rest)) = segment.split_once('-') else {
            continue;
        };
        match prefix {
            "chapter" => hierarchy.chapter = rest.to_string(),
            "subchapter" => hierarchy.subchapter = rest.to_string(),
            "part" => hierarchy.part = rest.to_string(),
            "subpart" => hierarchy.subpart = Some(rest.to_string()),
            _ => {}
        }
    }
    hierarchy
}

/// Pull every section container and the next-page link out of one
/// reading-view page.
pub fn parse_content_page(html: &str) -> Result<PageExtract, String> {
    let dom = tl::parse(html, tl::ParserOptions::default())
        .map_err(|e| format!("Failed to parse page HTML: {e}"))?;
    let parser = dom.parser();
    let mut extract = PageExtract::default();

    for node in dom.nodes().iter() {
        let Some(tag) = node.as_tag() else {
            continue;
        };
        match tag.name().as_utf8_str().as_ref() {
            "div" if has_class(tag, "section") => {
                if let Some(section) = extract_section(tag, parser) {
                    extract.sections.push(section);
                }
            }
            "a" if attr(tag, "id").as_deref() == Some("next-content-link") => {
                if let Some(href) = attr(tag, "href").filter(|href| !href.is_empty()) {
                    extract.next = Some(NextLink {
                        href,
                        title: attr(tag, "data-title").filter(|title| !title.is_empty()),
                    });
                }
            }
            _ => {}
        }
    }

    Ok(extract)
}

fn extract_section(tag: &HTMLTag, parser: &Parser) -> Option<CrawledSection> {
    let id = attr(tag, "id").filter(|id| !id.is_empty())?;
    let mut section = CrawledSection {
        id,
        ..CrawledSection::default()
    };

    for child in tag.children().all(parser).iter() {
        let Some(child_tag) = child.as_tag() else {
            continue;
        };
        match child_tag.name().as_utf8_str().as_ref() {
            "h4" => {
                section.title = normalize_text(&child_tag.inner_text(parser));
                if let Some(metadata) = attr(child_tag, "data-hierarchy-metadata") {
                    if let Some(citation) = extract_citation(&metadata) {
                        section.citation = citation;
                    }
                }
            }
            "p" => {
                let (heading, raw_text) = paragraph_parts(child_tag, parser);
                let text = normalize_text(&raw_text);
                match attr(child_tag, "data-title").filter(|id| !id.is_empty()) {
                    Some(paragraph_id) => section.paragraphs.push(CrawledParagraph {
                        id: paragraph_id,
                        title: heading,
                        text,
                    }),
                    None => {
                        if !text.is_empty() {
                            if !section.text.is_empty() {
                                section.text.push('\n');
                            }
                            section.text.push_str(&text);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    Some(section)
}

/// Text of one paragraph with its heading `<em>` lifted out.
fn paragraph_parts(tag: &HTMLTag, parser: &Parser) -> (Option<String>, String) {
    let mut heading = None;
    let mut text = String::new();
    for handle in tag.children().top().iter() {
        if let Some(node) = handle.get(parser) {
            collect_paragraph(node, parser, &mut heading, &mut text);
        }
    }
    (heading, text)
}

fn collect_paragraph(
    node: &Node,
    parser: &Parser,
    heading: &mut Option<String>,
    text: &mut String,
) {
    if let Some(tag) = node.as_tag() {
        if tag.name().as_utf8_str().as_ref() == "em" && has_class(tag, "paragraph-heading") {
            let value = normalize_text(&tag.inner_text(parser));
            if heading.is_none() && !value.is_empty() {
                *heading = Some(value);
            }
            return;
        }
        for handle in tag.children().top().iter() {
            if let Some(child) = handle.get(parser) {
                collect_paragraph(child, parser, heading, text);
            }
        }
    } else if let Some(raw) = node.as_raw() {
        text.push_str(raw.as_utf8_str().as_ref());
    }
}

fn extract_citation(metadata: &str) -> Option<String> {
    CITATION_RE
        .captures(&unescape_entities(metadata))
        .map(|captures| captures[1].to_string())
        .filter(|citation| !citation.is_empty())
}

fn attr(tag: &HTMLTag, name: &str) -> Option<String> {
    tag.attributes()
        .get(name)
        .flatten()
        .map(|value| value.as_utf8_str().to_string())
}

fn has_class(tag: &HTMLTag, class: &str) -> bool {
    attr(tag, "class")
        .map(|classes| classes.split_whitespace().any(|candidate| candidate == class))
        .unwrap_or(false)
}

pub fn normalize_text(input: &str) -> String {
    let unescaped = unescape_entities(input);
    WHITESPACE_RE.replace_all(unescaped.trim(), " ").to_string()
}

fn unescape_entities(input: &str) -> String {
    input
        .replace("&nbsp;", " ")
        .replace('\u{00A0}', " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_path_reads_dash_separated_segments() {
        let path = hierarchy_path_from_url(
            "/current/title-8/chapter-I/subchapter-B/part-103/subpart-A/section-103.1",
        );
        assert_eq!(path.chapter, "I");
        assert_eq!(path.subchapter, "B");
        assert_eq!(path.part, "103");
        assert_eq!(path.subpart.as_deref(), Some("A"));
    }

    #[test]
    fn hierarchy_path_without_subpart_is_partial() {
        let path = hierarchy_path_from_url("/current/title-8/chapter-I/subchapter-C/part-343b");
        assert_eq!(path.chapter, "I");
        assert_eq!(path.subchapter, "C");
        assert_eq!(path.part, "343b");
        assert_eq!(path.subpart, None);
    }

    #[test]
    fn citation_survives_html_escaped_metadata() {
        let metadata = "{&quot;path&quot;:&quot;/current/title-8/section-103.1&quot;,\
&quot;citation&quot;:&quot;8 CFR 103.1&quot;}";
        assert_eq!(extract_citation(metadata).as_deref(), Some("8 CFR 103.1"));
        assert_eq!(extract_citation("{}"), None);
    }

    #[test]
    fn section_paragraphs_and_free_text_are_separated() {
        let html = r#"<div class="section" id="103.1">
            <h4 data-hierarchy-metadata="{&quot;citation&quot;:&quot;8 CFR 103.1&quot;}">§ 103.1 Delegations of authority.</h4>
            <p data-title="103.1(a)"><em class="paragraph-heading">Authority.</em> Text of paragraph a.</p>
            <p>Closing free text.</p>
        </div>"#;
        let extract = parse_content_page(html).expect("page should parse");

        assert_eq!(extract.sections.len(), 1);
        let section = &extract.sections[0];
        assert_eq!(section.id, "103.1");
        assert_eq!(section.citation, "8 CFR 103.1");
        assert_eq!(section.title, "§ 103.1 Delegations of authority.");
        assert_eq!(section.text, "Closing free text.");
        assert_eq!(section.paragraphs.len(), 1);
        assert_eq!(section.paragraphs[0].id, "103.1(a)");
        assert_eq!(section.paragraphs[0].title.as_deref(), Some("Authority."));
        assert_eq!(section.paragraphs[0].text, "Text of paragraph a.");
    }

    #[test]
    fn next_link_is_optional() {
        let with_next = parse_content_page(
            r#"<a id="next-content-link" data-title="§ 103.2" href="/current/title-8/section-103.2">Next</a>"#,
        )
        .expect("page should parse");
        let next = with_next.next.expect("next link should be found");
        assert_eq!(next.href, "/current/title-8/section-103.2");
        assert_eq!(next.title.as_deref(), Some("§ 103.2"));

        let last_page = parse_content_page("<div>done</div>").expect("page should parse");
        assert_eq!(last_page.next, None);
    }
}
