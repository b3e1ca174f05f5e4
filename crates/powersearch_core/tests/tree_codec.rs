use powersearch_core::codec::{dump, dump_forest, from_json, parse, parse_forest, to_json, CodecError};
use powersearch_core::decoration::DecorationStyle;
use powersearch_core::model::forest::InsertPosition;
use powersearch_core::model::location::{Location, TextRange};
use powersearch_core::{ContainerDraft, NodeDraft, ParentRef, RecordingSurface, TagForest, TreeNode};

fn reference(uri: &str, line: u32) -> NodeDraft {
    NodeDraft::reference(Location::new(uri, TextRange::from_coords(line, 1, line, 8)))
}

fn sample_forest() -> TagForest {
    let mut forest = TagForest::new();
    forest
        .insert(
            ContainerDraft::new("Bugs")
                .with_color("#ff0000")
                .with_anchor(Location::new("file:///a.rs", TextRange::from_coords(0, 4, 0, 9)))
                .with_child(reference("file:///a.rs", 3))
                .with_child(
                    ContainerDraft::new("Nested")
                        .with_hidden(true)
                        .with_child(reference("file:///b.rs", 7)),
                )
                .with_child(reference("file:///b.rs", 9))
                .into(),
            ParentRef::Root,
            InsertPosition::Back,
        )
        .unwrap();
    forest
        .insert(NodeDraft::container("Empty"), ParentRef::Root, InsertPosition::Back)
        .unwrap();
    forest
}

#[test]
fn round_trip_preserves_structure_and_order() {
    let forest = sample_forest();
    let records = dump_forest(&forest).unwrap();

    let mut rebuilt = TagForest::new();
    let mut surface = RecordingSurface::new();
    parse_forest(&records, &mut rebuilt, &mut surface).unwrap();

    assert_eq!(dump_forest(&rebuilt).unwrap(), records);
    assert_eq!(rebuilt.len(), forest.len());

    let bugs = rebuilt.container(rebuilt.top_level()[0]).unwrap();
    assert_eq!(bugs.name(), "Bugs");
    assert_eq!(bugs.children().len(), 3);
    let nested = rebuilt.container(bugs.children()[1]).unwrap();
    assert!(nested.is_hidden());
    assert_eq!(nested.parent(), ParentRef::Container(bugs.id()));
}

#[test]
fn round_trip_through_json_text() {
    let records = dump_forest(&sample_forest()).unwrap();
    let text = to_json(&records).unwrap();
    assert_eq!(from_json(&text).unwrap(), records);
}

#[test]
fn dump_omits_handles_and_parent_links() {
    let mut forest = sample_forest();
    let mut surface = RecordingSurface::new();
    let records = dump_forest(&forest).unwrap();
    parse_forest(&records, &mut forest, &mut surface).unwrap();

    let text = to_json(&dump_forest(&forest).unwrap()).unwrap();
    assert!(!text.contains("decoration"));
    assert!(!text.contains("parent"));
    assert!(text.contains(r#""type":"container""#));
    assert!(text.contains(r#""type":"ref""#));
}

#[test]
fn parse_creates_one_handle_per_colored_container() {
    let records = dump_forest(&sample_forest()).unwrap();
    let mut forest = TagForest::new();
    let mut surface = RecordingSurface::new();

    let ids = parse_forest(&records, &mut forest, &mut surface).unwrap();

    assert_eq!(surface.created_count(), 1);
    let handle = forest.container(ids[0]).unwrap().decoration().unwrap();
    assert_eq!(
        surface.style(handle),
        Some(&DecorationStyle::highlight("#ff0000"))
    );
    assert!(forest.container(ids[1]).unwrap().decoration().is_none());
}

#[test]
fn parse_appends_under_given_parent() {
    let source = sample_forest();
    let record = dump(&source, source.top_level()[1]).unwrap();
    let mut forest = TagForest::new();
    let mut surface = RecordingSurface::new();
    let host = forest
        .insert(NodeDraft::container("Host"), ParentRef::Root, InsertPosition::Back)
        .unwrap();
    forest
        .insert(reference("file:///c.rs", 1), ParentRef::Container(host), InsertPosition::Back)
        .unwrap();

    let id = parse(&record, ParentRef::Container(host), &mut forest, &mut surface).unwrap();

    let children = forest.container(host).unwrap().children();
    assert_eq!(children.last(), Some(&id));
    assert!(matches!(forest.get(id), Some(TreeNode::Container(c)) if c.name() == "Empty"));
}

#[test]
fn malformed_record_links_nothing() {
    let records = from_json(
        r##"[{"type":"container","name":"Ok","children":[]},{"type":"container","children":[]}]"##,
    )
    .unwrap();
    let mut forest = TagForest::new();
    let mut surface = RecordingSurface::new();

    let err = parse_forest(&records, &mut forest, &mut surface).unwrap_err();

    assert!(matches!(err, CodecError::MissingName));
    assert!(forest.is_empty());
    assert_eq!(surface.created_count(), 0);
}

#[test]
fn reference_without_location_is_rejected() {
    let records = from_json(r#"[{"type":"container","name":"A","children":[{"type":"ref"}]}]"#)
        .unwrap();
    let mut forest = TagForest::new();
    let mut surface = RecordingSurface::new();

    assert!(matches!(
        parse_forest(&records, &mut forest, &mut surface),
        Err(CodecError::MissingLocation)
    ));
}
