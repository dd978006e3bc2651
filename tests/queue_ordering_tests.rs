use queue_board::{
    Board, BoardError, MemoryStore, MoveRequest, RecordKind, ResourceId, WorkItemDraft, WorkItemId,
};

fn board() -> Board<MemoryStore> {
    Board::new(MemoryStore::new())
}

fn item(board: &Board<MemoryStore>, name: &str, days: u32) -> WorkItemId {
    board
        .create_work_item(WorkItemDraft::new(name, days))
        .unwrap()
        .id
}

fn assign(board: &Board<MemoryStore>, id: WorkItemId, resource: ResourceId) {
    board
        .move_item(MoveRequest::append(id, Some(resource)))
        .unwrap();
}

fn ids(board: &Board<MemoryStore>, resource: Option<ResourceId>) -> Vec<WorkItemId> {
    board.queue_ids(resource).unwrap()
}

#[test]
fn new_items_land_at_the_end_of_the_pool() {
    let board = board();
    let a = item(&board, "A", 1);
    let b = item(&board, "B", 2);
    let c = item(&board, "C", 3);
    assert_eq!(ids(&board, None), vec![a, b, c]);
    let keys: Vec<f64> = board.pool().unwrap().iter().map(|q| q.key.value()).collect();
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn move_before_places_item_directly_in_front() {
    let board = board();
    let r = board.create_resource("Ana").unwrap().id;
    let a = item(&board, "A", 3);
    let b = item(&board, "B", 2);
    let c = item(&board, "C", 1);
    assign(&board, a, r);
    assign(&board, b, r);

    board.move_item(MoveRequest::before(c, Some(r), b)).unwrap();
    assert_eq!(ids(&board, Some(r)), vec![a, c, b]);
    assert!(ids(&board, None).is_empty());
}

#[test]
fn move_with_both_neighbors_lands_between_them() {
    let board = board();
    let r = board.create_resource("Ana").unwrap().id;
    let [a, b, c] = ["A", "B", "C"].map(|n| item(&board, n, 1));
    for id in [a, b, c] {
        assign(&board, id, r);
    }

    let request = MoveRequest {
        work_item_id: c,
        target: Some(r),
        before: Some(b),
        after: Some(a),
    };
    let assignment = board.move_item(request).unwrap();
    assert_eq!(ids(&board, Some(r)), vec![a, c, b]);

    let queue = board.queue(Some(r)).unwrap();
    assert!(queue[0].key < assignment.key && assignment.key < queue[2].key);
}

#[test]
fn move_to_front_and_between_resources() {
    let board = board();
    let r1 = board.create_resource("Ana").unwrap().id;
    let r2 = board.create_resource("Ben").unwrap().id;
    let [a, b, c] = ["A", "B", "C"].map(|n| item(&board, n, 1));
    for id in [a, b, c] {
        assign(&board, id, r1);
    }

    board.move_item(MoveRequest::before(c, Some(r1), a)).unwrap();
    assert_eq!(ids(&board, Some(r1)), vec![c, a, b]);

    board.move_item(MoveRequest::append(a, Some(r2))).unwrap();
    assert_eq!(ids(&board, Some(r1)), vec![c, b]);
    assert_eq!(ids(&board, Some(r2)), vec![a]);

    let assignment = board.assignment(a).unwrap();
    assert_eq!(assignment.resource_id, Some(r2));
    board.verify().unwrap();
}

#[test]
fn moving_into_the_current_slot_keeps_order() {
    let board = board();
    let r = board.create_resource("Ana").unwrap().id;
    let [a, b, c] = ["A", "B", "C"].map(|n| item(&board, n, 1));
    for id in [a, b, c] {
        assign(&board, id, r);
    }

    board
        .move_item(MoveRequest {
            work_item_id: b,
            target: Some(r),
            before: Some(c),
            after: Some(a),
        })
        .unwrap();
    board.move_item(MoveRequest::append(c, Some(r))).unwrap();
    assert_eq!(ids(&board, Some(r)), vec![a, b, c]);
}

#[test]
fn naming_the_mover_as_its_own_neighbor_keeps_its_slot() {
    let board = board();
    let r = board.create_resource("Ana").unwrap().id;
    let [a, b, c, d] = ["A", "B", "C", "D"].map(|n| item(&board, n, 1));
    for id in [a, b, c] {
        assign(&board, id, r);
    }

    let before_key = board.assignment(c).unwrap().key;
    let kept = board.move_item(MoveRequest::before(c, Some(r), c)).unwrap();
    assert_eq!(kept.key, before_key);
    assert_eq!(ids(&board, Some(r)), vec![a, b, c]);

    board.move_item(MoveRequest::after(b, Some(r), b)).unwrap();
    assert_eq!(ids(&board, Some(r)), vec![a, b, c]);

    // A stale `before` falls through to the self `after`.
    let request = MoveRequest {
        work_item_id: a,
        target: Some(r),
        before: Some(d),
        after: Some(a),
    };
    board.move_item(request).unwrap();
    assert_eq!(ids(&board, Some(r)), vec![a, b, c]);

    // From another queue the mover is not a member, so the hint is stale.
    board.move_item(MoveRequest::before(d, Some(r), d)).unwrap();
    assert_eq!(ids(&board, Some(r)), vec![d, a, b, c]);
}

#[test]
fn stale_neighbors_degrade_instead_of_failing() {
    let board = board();
    let r = board.create_resource("Ana").unwrap().id;
    let [a, b, c, d] = ["A", "B", "C", "D"].map(|n| item(&board, n, 1));
    assign(&board, a, r);
    assign(&board, b, r);

    // `d` sits in the pool, so it is not a neighbor in r's queue.
    board.move_item(MoveRequest::before(c, Some(r), d)).unwrap();
    assert_eq!(ids(&board, Some(r)), vec![c, a, b]);

    board.move_item(MoveRequest::after(c, Some(r), d)).unwrap();
    assert_eq!(ids(&board, Some(r)), vec![a, b, c]);

    // A stale `before` with a live `after` honors the `after`.
    let request = MoveRequest {
        work_item_id: c,
        target: Some(r),
        before: Some(d),
        after: Some(a),
    };
    board.move_item(request).unwrap();
    assert_eq!(ids(&board, Some(r)), vec![a, c, b]);
}

#[test]
fn repeated_inserts_at_one_boundary_stay_ordered() {
    let board = board();
    let r = board.create_resource("Ana").unwrap().id;
    let a = item(&board, "A", 1);
    let b = item(&board, "B", 1);
    assign(&board, a, r);
    assign(&board, b, r);

    let mut inserted = Vec::new();
    for n in 0..120 {
        let id = item(&board, &format!("X{n}"), 1);
        board.move_item(MoveRequest::after(id, Some(r), a)).unwrap();
        inserted.push(id);
    }

    let mut expected = vec![a];
    expected.extend(inserted.iter().rev());
    expected.push(b);
    assert_eq!(ids(&board, Some(r)), expected);
    board.verify().unwrap();
}

#[test]
fn unknown_ids_are_not_found() {
    let board = board();
    let a = item(&board, "A", 1);

    let err = board.move_item(MoveRequest::append(99, None)).unwrap_err();
    assert!(matches!(
        err,
        BoardError::NotFound {
            kind: RecordKind::WorkItem,
            id: 99
        }
    ));

    let err = board.move_item(MoveRequest::append(a, Some(7))).unwrap_err();
    assert!(matches!(
        err,
        BoardError::NotFound {
            kind: RecordKind::Resource,
            id: 7
        }
    ));
    assert!(matches!(
        board.queue(Some(7)).unwrap_err(),
        BoardError::NotFound { .. }
    ));

    // Nothing moved.
    assert_eq!(ids(&board, None), vec![a]);
}

#[test]
fn remove_to_pool_appends_after_existing_backlog() {
    let board = board();
    let r = board.create_resource("Ana").unwrap().id;
    let [a, b, c] = ["A", "B", "C"].map(|n| item(&board, n, 1));
    assign(&board, a, r);

    board.remove_to_pool(a).unwrap();
    assert_eq!(ids(&board, None), vec![b, c, a]);
    assert!(ids(&board, Some(r)).is_empty());
}
