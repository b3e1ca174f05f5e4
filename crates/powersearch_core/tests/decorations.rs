use powersearch_core::model::location::{Location, TextRange};
use powersearch_core::{
    ContainerDraft, DecorationHandle, DecorationStyle, InMemoryTreeStore, NodeDraft, NodeId,
    RecordingSurface, RenderSurface, Selection, TagTreeService, TreeSettings,
};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

type Service = TagTreeService<InMemoryTreeStore, RecordingSurface>;

fn location(uri: &str, line: u32) -> Location {
    Location::new(uri, TextRange::from_coords(line, 2, line, 6))
}

fn service() -> Service {
    let mut surface = RecordingSurface::new();
    surface.open_document("file:///a.rs");
    surface.open_document("file:///b.rs");
    TagTreeService::new(InMemoryTreeStore::new(), surface, TreeSettings::default())
}

fn handle_of(service: &Service, id: NodeId) -> DecorationHandle {
    service.forest().container(id).unwrap().decoration().unwrap()
}

#[test]
fn container_paints_only_its_direct_references() {
    let mut service = service();
    let outer = service
        .add_node(
            ContainerDraft::new("outer")
                .with_color("#ff0000")
                .with_child(location("file:///a.rs", 1))
                .with_child(location("file:///b.rs", 2))
                .with_child(
                    ContainerDraft::new("inner")
                        .with_color("#00ff00")
                        .with_child(location("file:///a.rs", 9)),
                )
                .with_child(location("file:///a.rs", 3))
                .into(),
            None,
        )
        .unwrap();
    let inner = service.forest().container(outer).unwrap().children()[2];

    let outer_painted = service.surface().painted_ranges(handle_of(&service, outer));
    let expected: BTreeMap<String, Vec<TextRange>> = [
        (
            "file:///a.rs".to_string(),
            vec![location("file:///a.rs", 1).range(), location("file:///a.rs", 3).range()],
        ),
        ("file:///b.rs".to_string(), vec![location("file:///b.rs", 2).range()]),
    ]
    .into_iter()
    .collect();
    assert_eq!(outer_painted, expected);

    let inner_painted = service.surface().painted_ranges(handle_of(&service, inner));
    assert_eq!(inner_painted.len(), 1);
    assert_eq!(inner_painted["file:///a.rs"], vec![location("file:///a.rs", 9).range()]);
}

#[test]
fn hidden_ancestor_suppresses_descendants_until_shown() {
    let records = {
        let mut source = service();
        source
            .add_node(
                ContainerDraft::new("outer")
                    .with_color("#ff0000")
                    .with_hidden(true)
                    .with_child(location("file:///a.rs", 1))
                    .with_child(
                        ContainerDraft::new("inner")
                            .with_color("#0000ff")
                            .with_child(location("file:///a.rs", 5)),
                    )
                    .into(),
                None,
            )
            .unwrap();
        let records = source.store().records().to_vec();
        records
    };

    let mut surface = RecordingSurface::new();
    surface.open_document("file:///a.rs");
    let mut service = TagTreeService::load(
        InMemoryTreeStore::with_records(records),
        surface,
        TreeSettings::default(),
    )
    .unwrap();
    let outer = service.top_level()[0];
    let inner = service.forest().container(outer).unwrap().children()[1];

    assert!(!service.forest().container(inner).unwrap().is_hidden());
    assert!(service
        .surface()
        .painted_ranges(handle_of(&service, outer))
        .is_empty());
    assert!(service
        .surface()
        .painted_ranges(handle_of(&service, inner))
        .is_empty());

    service.set_hidden(outer, false).unwrap();

    assert_eq!(
        service.surface().ranges(handle_of(&service, outer), "file:///a.rs"),
        vec![location("file:///a.rs", 1).range()]
    );
    assert_eq!(
        service.surface().ranges(handle_of(&service, inner), "file:///a.rs"),
        vec![location("file:///a.rs", 5).range()]
    );
}

#[test]
fn hiding_releases_handles_and_keeps_colors() {
    let mut service = service();
    let id = service
        .add_node(
            ContainerDraft::new("tag")
                .with_color("#123456")
                .with_child(location("file:///a.rs", 4))
                .into(),
            None,
        )
        .unwrap();

    service.set_hidden(id, true).unwrap();

    let container = service.forest().container(id).unwrap();
    assert!(container.decoration().is_none());
    assert_eq!(container.color(), Some("#123456"));
    assert_eq!(service.surface().live_handle_count(), 0);
}

#[test]
fn removing_a_reference_repaints_its_parent() {
    let mut service = service();
    let id = service
        .add_node(
            ContainerDraft::new("tag")
                .with_color("#ff0000")
                .with_child(location("file:///a.rs", 1))
                .with_child(location("file:///a.rs", 2))
                .into(),
            None,
        )
        .unwrap();
    let first_ref = service.forest().container(id).unwrap().children()[0];

    service.remove_node(first_ref).unwrap();

    assert_eq!(
        service.surface().ranges(handle_of(&service, id), "file:///a.rs"),
        vec![location("file:///a.rs", 2).range()]
    );
}

#[test]
fn removing_the_last_reference_in_a_closed_document_clears_it() {
    let mut service =
        TagTreeService::new(InMemoryTreeStore::new(), RecordingSurface::new(), TreeSettings::default());
    let id = service
        .add_node(
            ContainerDraft::new("tag")
                .with_color("#ff0000")
                .with_child(location("file:///x.rs", 1))
                .with_child(location("file:///y.rs", 2))
                .into(),
            None,
        )
        .unwrap();
    let x_ref = service.forest().container(id).unwrap().children()[0];

    service.remove_node(x_ref).unwrap();

    let handle = handle_of(&service, id);
    let expected: BTreeMap<String, Vec<TextRange>> =
        [("file:///y.rs".to_string(), vec![location("file:///y.rs", 2).range()])]
            .into_iter()
            .collect();
    assert_eq!(service.surface().painted_ranges(handle), expected);
}

#[test]
fn recolor_disposes_previous_handle_before_creating_next() {
    let mut service = service();
    let id = service
        .add_node(
            ContainerDraft::new("tag")
                .with_color("#ff0000")
                .with_child(location("file:///a.rs", 1))
                .into(),
            None,
        )
        .unwrap();
    let before = handle_of(&service, id);

    service.recolor(id, Some("#00ff00".to_string())).unwrap();

    let after = handle_of(&service, id);
    assert_ne!(before, after);
    assert!(!service.surface().is_live(before));
    assert_eq!(
        service.surface().style(after),
        Some(&DecorationStyle::highlight("#00ff00"))
    );
    assert_eq!(service.surface().live_handle_count(), 1);

    service.recolor(id, None).unwrap();
    assert!(service.forest().container(id).unwrap().decoration().is_none());
    assert_eq!(service.surface().live_handle_count(), 0);
    assert_eq!(service.surface().created_count(), 2);
    assert_eq!(service.surface().disposed_count(), 2);
}

#[test]
fn selecting_a_reference_moves_the_focus_highlight() {
    let mut service = service();
    let id = service
        .add_node(
            ContainerDraft::new("plain")
                .with_child(location("file:///a.rs", 1))
                .with_child(location("file:///b.rs", 2))
                .into(),
            None,
        )
        .unwrap();
    let refs = service.forest().container(id).unwrap().children().to_vec();

    let first = service.select(refs[0]).unwrap();
    assert_eq!(first, Selection::Navigate(location("file:///a.rs", 1)));
    assert_eq!(service.surface().live_handle_count(), 1);

    service.select(refs[1]).unwrap();
    assert_eq!(service.surface().live_handle_count(), 1);
    assert_eq!(service.surface().disposed_count(), 1);
}

#[test]
fn teardown_is_idempotent() {
    let mut service = service();
    service
        .add_node(
            ContainerDraft::new("tag")
                .with_color("#ff0000")
                .with_child(ContainerDraft::new("nested").with_color("#00ff00"))
                .into(),
            None,
        )
        .unwrap();
    assert_eq!(service.surface().live_handle_count(), 2);

    service.teardown();
    service.teardown();

    assert_eq!(service.surface().live_handle_count(), 0);
    assert_eq!(service.surface().disposed_count(), 2);
}

#[test]
fn refresh_repaints_ranges_the_host_dropped() {
    let mut service = service();
    let id = service
        .add_node(
            ContainerDraft::new("tag")
                .with_color("#ff0000")
                .with_child(location("file:///a.rs", 8))
                .into(),
            None,
        )
        .unwrap();
    let handle = handle_of(&service, id);
    service
        .surface_mut()
        .set_highlight_ranges(handle, "file:///a.rs", &[]);
    assert!(service.surface().painted_ranges(handle).is_empty());

    service.refresh_decorations();

    assert_eq!(
        service.surface().ranges(handle, "file:///a.rs"),
        vec![location("file:///a.rs", 8).range()]
    );
}

/// Surface shared with the test so it stays observable after the service drops.
#[derive(Clone, Default)]
struct SharedSurface(Rc<RefCell<RecordingSurface>>);

impl RenderSurface for SharedSurface {
    fn create_decoration(&mut self, style: &DecorationStyle) -> DecorationHandle {
        self.0.borrow_mut().create_decoration(style)
    }

    fn set_highlight_ranges(&mut self, handle: DecorationHandle, document_uri: &str, ranges: &[TextRange]) {
        self.0
            .borrow_mut()
            .set_highlight_ranges(handle, document_uri, ranges);
    }

    fn dispose_handle(&mut self, handle: DecorationHandle) {
        self.0.borrow_mut().dispose_handle(handle);
    }

    fn visible_documents(&self) -> Vec<String> {
        self.0.borrow().visible_documents()
    }
}

#[test]
fn dropping_the_service_releases_every_handle() {
    let shared = SharedSurface::default();
    {
        let mut service =
            TagTreeService::new(InMemoryTreeStore::new(), shared.clone(), TreeSettings::default());
        let id = service
            .add_node(
                ContainerDraft::new("tag")
                    .with_color("#ff0000")
                    .with_child(location("file:///a.rs", 1))
                    .into(),
                None,
            )
            .unwrap();
        let reference = service.forest().container(id).unwrap().children()[0];
        service.select(reference).unwrap();
        assert_eq!(shared.0.borrow().live_handle_count(), 2);
    }
    assert_eq!(shared.0.borrow().live_handle_count(), 0);
}

#[test]
fn reference_nodes_never_hold_handles() {
    let mut service = service();
    service
        .add_node(NodeDraft::reference(location("file:///a.rs", 1)), None)
        .unwrap();
    assert_eq!(service.surface().created_count(), 0);
}

#[test]
fn hidden_ancestor_blocks_direct_apply() {
    use powersearch_core::decoration::apply_decorations;
    use powersearch_core::model::forest::InsertPosition;
    use powersearch_core::{ParentRef, TagForest};

    let mut forest = TagForest::new();
    let mut surface = RecordingSurface::new();
    surface.open_document("file:///a.rs");
    let a = forest
        .insert(
            ContainerDraft::new("A")
                .with_hidden(true)
                .with_child(
                    ContainerDraft::new("B")
                        .with_color("#ff0000")
                        .with_child(location("file:///a.rs", 3)),
                )
                .into(),
            ParentRef::Root,
            InsertPosition::Back,
        )
        .unwrap();
    let b = forest.container(a).unwrap().children()[0];

    apply_decorations(&mut forest, &mut surface, &[a]);
    apply_decorations(&mut forest, &mut surface, &[b]);

    // B never acquired a handle, so nothing was painted for R.
    assert!(forest.container(b).unwrap().decoration().is_none());
    assert_eq!(surface.created_count(), 0);
}
