use powersearch_core::model::location::{Location, TextRange};
use powersearch_core::{
    ContainerDraft, DragPayload, DropOutcome, InMemoryTreeStore, NodeId, ParentRef,
    RecordingSurface, TagTreeService, TreeChange, TreeError, TreeServiceError, TreeSettings,
};
use std::cell::RefCell;
use std::rc::Rc;

type Service = TagTreeService<InMemoryTreeStore, RecordingSurface>;

fn location(line: u32) -> Location {
    Location::new("file:///drag.rs", TextRange::from_coords(line, 0, line, 3))
}

struct Fixture {
    service: Service,
    changes: Rc<RefCell<Vec<TreeChange>>>,
    a: NodeId,
    b: NodeId,
}

impl Fixture {
    /// Root: [A, B]. A (red): [r1, r2, r3, A.1]. B (blue): [r4].
    fn new() -> Self {
        let mut surface = RecordingSurface::new();
        surface.open_document("file:///drag.rs");
        let mut service =
            TagTreeService::new(InMemoryTreeStore::new(), surface, TreeSettings::default());
        let b = service
            .add_node(
                ContainerDraft::new("B")
                    .with_color("#0000ff")
                    .with_child(location(4))
                    .into(),
                None,
            )
            .unwrap();
        let a = service
            .add_node(
                ContainerDraft::new("A")
                    .with_color("#ff0000")
                    .with_child(location(1))
                    .with_child(location(2))
                    .with_child(location(3))
                    .with_child(ContainerDraft::new("A.1"))
                    .into(),
                None,
            )
            .unwrap();
        let changes = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&changes);
        service.subscribe(move |change| sink.borrow_mut().push(change.clone()));
        Self {
            service,
            changes,
            a,
            b,
        }
    }

    fn child(&self, parent: NodeId, index: usize) -> NodeId {
        self.service.children(Some(parent)).unwrap()[index]
    }
}

#[test]
fn drag_start_encodes_index_paths() {
    let fx = Fixture::new();
    let r1 = fx.child(fx.a, 0);
    let r3 = fx.child(fx.a, 2);

    let payload = fx.service.drag_start(&[r1, r3]).unwrap();

    assert_eq!(payload.paths(), &[vec![0, 0], vec![0, 2]]);
    assert_eq!(fx.service.store().save_count(), 2);
}

#[test]
fn drag_start_rejects_mixed_parents_and_empty_selection() {
    let fx = Fixture::new();
    let r1 = fx.child(fx.a, 0);

    let r4 = fx.child(fx.b, 0);

    assert_eq!(fx.service.drag_start(&[r1, r4]), None);
    assert_eq!(fx.service.drag_start(&[fx.a, r1]), None);
    assert_eq!(fx.service.drag_start(&[]), None);
    assert!(fx.changes.borrow().is_empty());
}

#[test]
fn drop_moves_nodes_in_order_and_repaints_both_sides() {
    let mut fx = Fixture::new();
    let r1 = fx.child(fx.a, 0);
    let r2 = fx.child(fx.a, 1);
    let r3 = fx.child(fx.a, 2);
    let r4 = fx.child(fx.b, 0);
    let payload = fx.service.drag_start(&[r1, r3]).unwrap();

    let outcome = fx.service.drop_nodes(Some(fx.b), &payload).unwrap();

    assert_eq!(
        outcome,
        DropOutcome::Moved {
            count: 2,
            target: ParentRef::Container(fx.b)
        }
    );
    assert_eq!(fx.service.children(Some(fx.b)).unwrap(), &[r4, r1, r3]);
    assert_eq!(fx.service.children(Some(fx.a)).unwrap()[0], r2);
    assert_eq!(fx.service.parent(r1), Some(fx.b));
    assert_eq!(fx.service.parent(r3), Some(fx.b));

    let a_handle = fx.service.forest().container(fx.a).unwrap().decoration().unwrap();
    let b_handle = fx.service.forest().container(fx.b).unwrap().decoration().unwrap();
    assert_eq!(
        fx.service.surface().ranges(a_handle, "file:///drag.rs"),
        vec![location(2).range()]
    );
    assert_eq!(
        fx.service.surface().ranges(b_handle, "file:///drag.rs"),
        vec![location(4).range(), location(1).range(), location(3).range()]
    );
    assert_eq!(
        *fx.changes.borrow(),
        vec![TreeChange::Moved {
            nodes: vec![r1, r3],
            target: ParentRef::Container(fx.b)
        }]
    );
    assert_eq!(fx.service.store().save_count(), 3);
}

#[test]
fn drop_onto_own_parent_is_a_no_op() {
    let mut fx = Fixture::new();
    let r1 = fx.child(fx.a, 0);
    let r2 = fx.child(fx.a, 1);
    let before = fx.service.children(Some(fx.a)).unwrap().to_vec();
    let payload = fx.service.drag_start(&[r1]).unwrap();

    // A sibling reference target stands for the shared parent.
    assert_eq!(
        fx.service.drop_nodes(Some(r2), &payload).unwrap(),
        DropOutcome::Unchanged
    );
    assert_eq!(
        fx.service.drop_nodes(Some(fx.a), &payload).unwrap(),
        DropOutcome::Unchanged
    );

    assert_eq!(fx.service.children(Some(fx.a)).unwrap(), before.as_slice());
    assert!(fx.changes.borrow().is_empty());
    assert_eq!(fx.service.store().save_count(), 2);
}

#[test]
fn drop_onto_reference_targets_its_parent() {
    let mut fx = Fixture::new();
    let r1 = fx.child(fx.a, 0);
    let r4 = fx.child(fx.b, 0);
    let payload = fx.service.drag_start(&[r1]).unwrap();

    let outcome = fx.service.drop_nodes(Some(r4), &payload).unwrap();

    assert_eq!(
        outcome,
        DropOutcome::Moved {
            count: 1,
            target: ParentRef::Container(fx.b)
        }
    );
    assert_eq!(fx.service.children(Some(fx.b)).unwrap(), &[r4, r1]);
}

#[test]
fn drop_onto_root_appends_top_level() {
    let mut fx = Fixture::new();
    let nested = fx.child(fx.a, 3);
    let payload = fx.service.drag_start(&[nested]).unwrap();

    fx.service.drop_nodes(None, &payload).unwrap();

    assert_eq!(fx.service.top_level(), &[fx.a, fx.b, nested]);
    assert_eq!(fx.service.parent(nested), None);
    assert_eq!(fx.service.forest().index_path(nested), Some(vec![2]));
}

#[test]
fn stale_path_fails_without_touching_the_tree() {
    let mut fx = Fixture::new();
    let r1 = fx.child(fx.a, 0);
    let r3 = fx.child(fx.a, 2);
    let payload = fx.service.drag_start(&[r1, r3]).unwrap();
    let nested = fx.child(fx.a, 3);
    fx.service.remove_node(nested).unwrap();
    fx.service.remove_node(r3).unwrap();
    let saves = fx.service.store().save_count();
    let changes = fx.changes.borrow().len();

    // [0, 0] still resolves; [0, 2] no longer does.
    let err = fx.service.drop_nodes(Some(fx.b), &payload).unwrap_err();

    assert!(matches!(err, TreeServiceError::StaleDragPath(ref path) if path == &vec![0, 2]));
    assert_eq!(fx.service.parent(r1), Some(fx.a));
    assert_eq!(fx.service.children(Some(fx.b)).unwrap().len(), 1);
    assert_eq!(fx.service.store().save_count(), saves);
    assert_eq!(fx.changes.borrow().len(), changes);
}

#[test]
fn hand_built_payload_with_mixed_parents_is_rejected() {
    let mut fx = Fixture::new();
    let payload = DragPayload::from_paths(vec![vec![1], vec![0, 0]]);

    let err = fx.service.drop_nodes(None, &payload).unwrap_err();

    assert!(matches!(err, TreeServiceError::MixedDragParents));
    assert!(fx.changes.borrow().is_empty());
}

#[test]
fn drop_into_own_subtree_is_a_cycle() {
    let mut fx = Fixture::new();
    let nested = fx.child(fx.a, 3);
    let payload = fx.service.drag_start(&[fx.a]).unwrap();

    let err = fx.service.drop_nodes(Some(nested), &payload).unwrap_err();

    assert!(matches!(
        err,
        TreeServiceError::Tree(TreeError::CycleDetected { node, parent }) if node == fx.a && parent == nested
    ));
    assert_eq!(fx.service.top_level(), &[fx.a, fx.b]);
    assert_eq!(fx.service.parent(nested), Some(fx.a));
    assert!(fx.changes.borrow().is_empty());
}

#[test]
fn unknown_target_is_reported() {
    let mut fx = Fixture::new();
    let r1 = fx.child(fx.a, 0);
    let payload = fx.service.drag_start(&[r1]).unwrap();
    let unknown = uuid::Uuid::new_v4();

    assert!(matches!(
        fx.service.drop_nodes(Some(unknown), &payload),
        Err(TreeServiceError::Tree(TreeError::NodeNotFound(_)))
    ));
    assert_eq!(fx.service.parent(r1), Some(fx.a));
}

#[test]
fn empty_payload_is_unchanged() {
    let mut fx = Fixture::new();
    let payload = DragPayload::from_paths(Vec::new());
    assert_eq!(
        fx.service.drop_nodes(None, &payload).unwrap(),
        DropOutcome::Unchanged
    );
}

#[test]
fn dragging_a_node_into_a_sibling_container() {
    let mut fx = Fixture::new();
    let nested = fx.child(fx.a, 3);
    let r2 = fx.child(fx.a, 1);
    let payload = fx.service.drag_start(&[r2]).unwrap();

    fx.service.drop_nodes(Some(nested), &payload).unwrap();

    assert_eq!(fx.service.children(Some(nested)).unwrap(), &[r2]);
    assert_eq!(fx.service.forest().index_path(r2), Some(vec![0, 2, 0]));
}

#[test]
fn moving_the_only_reference_out_clears_the_source_in_a_closed_document() {
    let mut service =
        TagTreeService::new(InMemoryTreeStore::new(), RecordingSurface::new(), TreeSettings::default());
    let b = service
        .add_node(ContainerDraft::new("B").with_color("#0000ff").into(), None)
        .unwrap();
    let a = service
        .add_node(
            ContainerDraft::new("A")
                .with_color("#ff0000")
                .with_child(location(7))
                .into(),
            None,
        )
        .unwrap();
    let moved = service.children(Some(a)).unwrap()[0];
    let payload = service.drag_start(&[moved]).unwrap();

    service.drop_nodes(Some(b), &payload).unwrap();

    let a_handle = service.forest().container(a).unwrap().decoration().unwrap();
    let b_handle = service.forest().container(b).unwrap().decoration().unwrap();
    assert!(service.surface().painted_ranges(a_handle).is_empty());
    assert_eq!(
        service.surface().ranges(b_handle, "file:///drag.rs"),
        vec![location(7).range()]
    );
}
