use crate::types::{SectionUnit, Subsection};
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(([A-Za-z0-9]+)\)").expect("LABEL_RE should compile"));
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<I>(.*?)</I>").expect("HEADING_RE should compile"));
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("TAG_RE should compile"));
static TOP_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\([a-zA-Z]\)$").expect("TOP_LABEL_RE should compile"));
static NESTED_LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\(\d+\)$").expect("NESTED_LABEL_RE should compile"));

/// One raw paragraph of a section's source text: the inner markup of a
/// single `<P>` element, untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub raw: String,
}

/// Pull the ordered paragraph fragments out of one versioner XML payload.
pub fn decode_fragments(xml: &str) -> Result<Vec<Fragment>, String> {
    let mut reader = Reader::from_str(xml);
    let mut fragments = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) if start.local_name().as_ref() == b"P" => {
                let raw = reader
                    .read_text(start.name())
                    .map_err(|e| format!("Malformed paragraph element: {e}"))?;
                fragments.push(Fragment {
                    raw: raw.into_owned(),
                });
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(format!("Malformed section XML: {e}")),
        }
    }

    Ok(fragments)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedFragment {
    /// Bracketed structural label, e.g. "(a)" or "(12)"; empty when the
    /// fragment has no leading label.
    pub label: String,
    pub heading: Option<String>,
    pub text: String,
}

/// Split one fragment into structural label, italic heading, and visible
/// text. Pure; markup that is neither label nor heading is stripped.
pub fn parse_fragment(fragment: &Fragment) -> ParsedFragment {
    let trimmed = fragment.raw.trim();

    let (label, rest) = match LABEL_RE.captures(trimmed) {
        Some(captures) => (
            format!("({})", &captures[1]),
            trimmed[captures[0].len()..].trim(),
        ),
        None => (String::new(), trimmed),
    };

    let heading_match = HEADING_RE
        .captures(rest)
        .map(|captures| captures[1].trim().to_string());
    let remainder = match heading_match {
        Some(_) => HEADING_RE.replace_all(rest, "").into_owned(),
        None => rest.to_string(),
    };
    let heading = heading_match.filter(|value| !value.is_empty());

    let text = TAG_RE.replace_all(&remainder, "").trim().to_string();

    ParsedFragment {
        label,
        heading,
        text,
    }
}

/// What a parsed label means relative to the currently open subsection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelRole {
    /// Single letter in parentheses: starts a new top-level subsection.
    Opens,
    /// Digits in parentheses while a subsection is open: nests under it.
    Nests,
    /// Everything else: running text of the section itself.
    Continues,
}

pub fn classify_label(label: &str, has_open_subsection: bool) -> LabelRole {
    if TOP_LABEL_RE.is_match(label) {
        LabelRole::Opens
    } else if NESTED_LABEL_RE.is_match(label) && has_open_subsection {
        LabelRole::Nests
    } else {
        LabelRole::Continues
    }
}

/// Run the fragments through the structural grammar in order, filling the
/// section's free text and subsection map.
pub fn populate_section(section: &mut SectionUnit, fragments: &[Fragment]) {
    let mut current: Option<String> = None;

    for fragment in fragments {
        let parsed = parse_fragment(fragment);
        match classify_label(&parsed.label, current.is_some()) {
            LabelRole::Opens => {
                current = Some(parsed.label.clone());
                section.subsections.insert(
                    parsed.label.clone(),
                    Subsection {
                        id: parsed.label,
                        heading: parsed.heading,
                        text: parsed.text,
                        sub_subsections: BTreeMap::new(),
                    },
                );
            }
            LabelRole::Nests => {
                if let Some(open) = current
                    .as_deref()
                    .and_then(|key| section.subsections.get_mut(key))
                {
                    open.sub_subsections.insert(
                        parsed.label.clone(),
                        Subsection {
                            id: parsed.label,
                            heading: parsed.heading,
                            text: parsed.text,
                            sub_subsections: BTreeMap::new(),
                        },
                    );
                }
            }
            LabelRole::Continues => append_text(&mut section.text, &parsed.text),
        }
    }
}

fn append_text(running: &mut String, addition: &str) {
    if addition.is_empty() {
        return;
    }
    if !running.is_empty() {
        running.push('\n');
    }
    running.push_str(addition);
}
