mod common;

use common::{load_fixture, MockFetcher};
use ecfr_ingest::sources::versioner::builder::TreeBuilder;
use ecfr_ingest::types::{LegalUnit, MetaNode, UnitKind};
use std::sync::Arc;

const ENDPOINT: &str = "https://mock.ecfr.test/api/versioner/v1/full/2025-04-10/title-8.xml";

fn catalog() -> MetaNode {
    serde_json::from_str(&load_fixture("title8_catalog.json")).expect("catalog fixture should parse")
}

fn seeded_fetcher() -> MockFetcher {
    let mut fetcher = MockFetcher::new();
    for section_id in ["1.1", "1.3", "1.4"] {
        let fixture = format!("versioner_section_{}.xml", section_id.replace('.', "-"));
        fetcher.add_fixture(
            &format!("{ENDPOINT}?section={section_id}"),
            &load_fixture(&fixture),
        );
    }
    fetcher
}

fn collect_sections<'a>(unit: &'a LegalUnit, into: &mut Vec<&'a str>) {
    match unit {
        LegalUnit::Section(section) => into.push(&section.id),
        _ => {
            for child in unit
                .as_container()
                .expect("non-section units are containers")
                .children
                .values()
            {
                collect_sections(child, into);
            }
        }
    }
}

#[tokio::test]
async fn catalog_build_yields_one_section_per_live_leaf() {
    let builder = TreeBuilder::new(Arc::new(seeded_fetcher()), ENDPOINT, 4);
    let tree = builder.build(&catalog()).await;

    let mut section_ids = Vec::new();
    collect_sections(&tree, &mut section_ids);
    section_ids.sort_unstable();
    // 1.2 is reserved and the misfiled chapter is skipped; neither may appear.
    assert_eq!(section_ids, vec!["1.1", "1.3", "1.4"]);

    assert_eq!(tree.kind(), UnitKind::Title);
    let chapter = tree.as_container().unwrap().children.get("I").unwrap();
    assert_eq!(chapter.kind(), UnitKind::Chapter);
    let subchapter = chapter.as_container().unwrap().children.get("A").unwrap();
    let part = subchapter.as_container().unwrap().children.get("1").unwrap();
    let part_children = &part.as_container().unwrap().children;
    assert!(part_children.get("stray").is_none());
    assert!(part_children.get("1.2").is_none());
    assert_eq!(part_children.get("B").unwrap().kind(), UnitKind::Subpart);
    assert_eq!(
        part_children.get("ECFR-SG1").unwrap().kind(),
        UnitKind::SubjectGroup
    );
}

#[tokio::test]
async fn fetched_sections_are_classified_into_subsections() {
    let builder = TreeBuilder::new(Arc::new(seeded_fetcher()), ENDPOINT, 4);
    let tree = builder.build(&catalog()).await;

    let section = tree
        .as_container()
        .and_then(|t| t.children.get("I"))
        .and_then(|c| c.as_container())
        .and_then(|c| c.children.get("A"))
        .and_then(|s| s.as_container())
        .and_then(|s| s.children.get("1"))
        .and_then(|p| p.as_container())
        .and_then(|p| p.children.get("1.1"))
        .and_then(|u| u.as_section())
        .expect("section 1.1 should be built");

    assert_eq!(section.text, "Lead-in.");
    let a = &section.subsections["(a)"];
    assert_eq!(a.heading.as_deref(), Some("Heading"));
    assert_eq!(a.text, "Body A.");
    assert_eq!(a.sub_subsections["(1)"].text, "Sub body.");
    let b = &section.subsections["(b)"];
    assert_eq!(b.text, "Body B.");
    assert!(b.sub_subsections.is_empty());
}

#[tokio::test]
async fn result_set_is_independent_of_fan_out_width() {
    let narrow = TreeBuilder::new(Arc::new(seeded_fetcher()), ENDPOINT, 1)
        .build(&catalog())
        .await;
    let wide = TreeBuilder::new(Arc::new(seeded_fetcher()), ENDPOINT, 8)
        .build(&catalog())
        .await;

    assert_eq!(
        serde_json::to_value(&narrow).expect("narrow tree should serialize"),
        serde_json::to_value(&wide).expect("wide tree should serialize")
    );
}

#[tokio::test]
async fn unfetchable_section_is_a_data_gap_not_a_failure() {
    let meta: MetaNode = serde_json::from_str(
        r#"{
            "identifier": "9",
            "type": "part",
            "label": "Part 9",
            "children": [
                {"identifier": "9.9", "type": "section", "label": "§ 9.9"}
            ]
        }"#,
    )
    .expect("inline catalog should parse");

    let builder = TreeBuilder::new(Arc::new(MockFetcher::new()), ENDPOINT, 2);
    let tree = builder.build(&meta).await;

    let section = tree
        .as_container()
        .and_then(|p| p.children.get("9.9"))
        .and_then(|u| u.as_section())
        .expect("section should exist despite the failed fetch");
    assert!(section.text.is_empty());
    assert!(section.subsections.is_empty());
}

#[tokio::test]
async fn built_tree_round_trips_through_json() {
    let builder = TreeBuilder::new(Arc::new(seeded_fetcher()), ENDPOINT, 4);
    let tree = builder.build(&catalog()).await;

    let json = serde_json::to_string_pretty(&tree).expect("tree should serialize");
    let reparsed: LegalUnit = serde_json::from_str(&json).expect("tree should deserialize");
    assert_eq!(reparsed, tree);

    let mut original_ids = Vec::new();
    let mut reparsed_ids = Vec::new();
    collect_sections(&tree, &mut original_ids);
    collect_sections(&reparsed, &mut reparsed_ids);
    assert_eq!(original_ids, reparsed_ids);
}
