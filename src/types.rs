use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// One entry of the externally supplied document catalog. Read-only input;
/// the builder copies what it needs and never mutates the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaNode {
    pub identifier: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub label_level: String,
    #[serde(default)]
    pub label_description: String,
    #[serde(default)]
    pub reserved: bool,
    #[serde(rename = "type")]
    pub kind: UnitKind,
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub children: Vec<MetaNode>,
}

impl MetaNode {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read catalog {}: {e}", path.display()))?;
        serde_json::from_str(&content)
            .map_err(|e| format!("Failed to parse catalog {}: {e}", path.display()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    Title,
    Subtitle,
    Chapter,
    Subchapter,
    Part,
    Subpart,
    SubjectGroup,
    Section,
}

impl UnitKind {
    pub fn as_str(self) -> &'static str {
        match self {
            UnitKind::Title => "title",
            UnitKind::Subtitle => "subtitle",
            UnitKind::Chapter => "chapter",
            UnitKind::Subchapter => "subchapter",
            UnitKind::Part => "part",
            UnitKind::Subpart => "subpart",
            UnitKind::SubjectGroup => "subject_group",
            UnitKind::Section => "section",
        }
    }

    /// Child kinds a container of this kind may hold. Anything else in the
    /// catalog is a data-quality signal: warned about and skipped.
    pub fn allowed_children(self) -> &'static [UnitKind] {
        match self {
            UnitKind::Title => &[UnitKind::Chapter, UnitKind::Subtitle, UnitKind::Part],
            UnitKind::Subtitle => &[UnitKind::Chapter, UnitKind::Part],
            UnitKind::Chapter => &[UnitKind::Subchapter, UnitKind::Part],
            UnitKind::Subchapter => &[UnitKind::Subchapter, UnitKind::Part],
            UnitKind::Part => &[UnitKind::Subpart, UnitKind::Section, UnitKind::SubjectGroup],
            UnitKind::Subpart => &[UnitKind::Section],
            UnitKind::SubjectGroup => &[UnitKind::Section],
            UnitKind::Section => &[],
        }
    }
}

/// Descriptive label copied off a catalog node at build time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitLabel {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub level: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl From<&MetaNode> for UnitLabel {
    fn from(meta: &MetaNode) -> Self {
        Self {
            level: meta.label_level.clone(),
            description: meta.label_description.clone(),
        }
    }
}

/// A built, text-bearing node of the hierarchical tree. The seven container
/// kinds share one body; only the tag differs on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LegalUnit {
    Title(ContainerUnit),
    Subtitle(ContainerUnit),
    Chapter(ContainerUnit),
    Subchapter(ContainerUnit),
    Part(ContainerUnit),
    Subpart(ContainerUnit),
    SubjectGroup(ContainerUnit),
    Section(SectionUnit),
}

impl LegalUnit {
    pub fn container(kind: UnitKind, body: ContainerUnit) -> Self {
        match kind {
            UnitKind::Title => LegalUnit::Title(body),
            UnitKind::Subtitle => LegalUnit::Subtitle(body),
            UnitKind::Chapter => LegalUnit::Chapter(body),
            UnitKind::Subchapter => LegalUnit::Subchapter(body),
            UnitKind::Part => LegalUnit::Part(body),
            UnitKind::Subpart => LegalUnit::Subpart(body),
            UnitKind::SubjectGroup => LegalUnit::SubjectGroup(body),
            UnitKind::Section => unreachable!("section is not a container kind"),
        }
    }

    pub fn kind(&self) -> UnitKind {
        match self {
            LegalUnit::Title(_) => UnitKind::Title,
            LegalUnit::Subtitle(_) => UnitKind::Subtitle,
            LegalUnit::Chapter(_) => UnitKind::Chapter,
            LegalUnit::Subchapter(_) => UnitKind::Subchapter,
            LegalUnit::Part(_) => UnitKind::Part,
            LegalUnit::Subpart(_) => UnitKind::Subpart,
            LegalUnit::SubjectGroup(_) => UnitKind::SubjectGroup,
            LegalUnit::Section(_) => UnitKind::Section,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            LegalUnit::Title(body)
            | LegalUnit::Subtitle(body)
            | LegalUnit::Chapter(body)
            | LegalUnit::Subchapter(body)
            | LegalUnit::Part(body)
            | LegalUnit::Subpart(body)
            | LegalUnit::SubjectGroup(body) => &body.id,
            LegalUnit::Section(section) => &section.id,
        }
    }

    pub fn as_container(&self) -> Option<&ContainerUnit> {
        match self {
            LegalUnit::Title(body)
            | LegalUnit::Subtitle(body)
            | LegalUnit::Chapter(body)
            | LegalUnit::Subchapter(body)
            | LegalUnit::Part(body)
            | LegalUnit::Subpart(body)
            | LegalUnit::SubjectGroup(body) => Some(body),
            LegalUnit::Section(_) => None,
        }
    }

    pub fn as_section(&self) -> Option<&SectionUnit> {
        match self {
            LegalUnit::Section(section) => Some(section),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerUnit {
    pub id: String,
    #[serde(default)]
    pub label: UnitLabel,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub children: BTreeMap<String, LegalUnit>,
}

impl ContainerUnit {
    pub fn new(id: String, label: UnitLabel) -> Self {
        Self {
            id,
            label,
            children: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectionUnit {
    pub id: String,
    #[serde(default)]
    pub label: UnitLabel,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subsections: BTreeMap<String, Subsection>,
}

impl SectionUnit {
    pub fn new(id: String, label: UnitLabel) -> Self {
        Self {
            id,
            label,
            text: String::new(),
            subsections: BTreeMap::new(),
        }
    }
}

/// One lettered subsection, or one numbered sub-subsection below it. The
/// grammar stops at two levels; deeper drafting labels stay in running text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subsection {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sub_subsections: BTreeMap<String, Subsection>,
}
