use queue_board::{
    Board, BoardError, BoardStore, BoardTx, MemoryStore, MoveRequest, Priority, WorkItemDraft,
};

fn board() -> Board<MemoryStore> {
    Board::new(MemoryStore::new())
}

#[test]
fn work_item_drafts_are_normalized_and_validated() {
    let board = board();
    let item = board
        .create_work_item(
            WorkItemDraft::new("  Write docs  ", 3)
                .with_theme("   ")
                .with_priority(Priority::High),
        )
        .unwrap();
    assert_eq!(item.name, "Write docs");
    assert_eq!(item.theme, None);
    assert_eq!(item.priority, Priority::High);

    assert!(matches!(
        board.create_work_item(WorkItemDraft::new("", 3)),
        Err(BoardError::Invalid(_))
    ));
    assert!(matches!(
        board.create_work_item(WorkItemDraft::new("Zero", 0)),
        Err(BoardError::Invalid(_))
    ));
    // Failed creations leave nothing behind.
    assert_eq!(board.work_items().unwrap().len(), 1);
    assert_eq!(board.pool().unwrap().len(), 1);
}

#[test]
fn dependency_cycles_and_unknown_ids_are_rejected() {
    let board = board();
    let a = board.create_work_item(WorkItemDraft::new("A", 1)).unwrap();
    let b = board
        .create_work_item(WorkItemDraft::new("B", 1).with_dependencies(vec![a.id]))
        .unwrap();

    let err = board
        .update_work_item(a.id, a.to_draft().with_dependencies(vec![b.id]))
        .unwrap_err();
    assert!(matches!(err, BoardError::Invalid(_)));

    let err = board
        .create_work_item(WorkItemDraft::new("C", 1).with_dependencies(vec![42]))
        .unwrap_err();
    assert!(matches!(err, BoardError::Invalid(_)));
    assert_eq!(board.work_items().unwrap().len(), 2);
}

#[test]
fn deleting_an_item_drops_it_from_dependency_lists() {
    let board = board();
    let a = board.create_work_item(WorkItemDraft::new("A", 1)).unwrap();
    let b = board
        .create_work_item(WorkItemDraft::new("B", 1).with_dependencies(vec![a.id]))
        .unwrap();

    board.delete_work_item(a.id).unwrap();
    assert!(board.work_item(b.id).unwrap().dependencies.is_empty());
    assert_eq!(board.queue_ids(None).unwrap(), vec![b.id]);
    assert!(matches!(
        board.delete_work_item(a.id),
        Err(BoardError::NotFound { .. })
    ));
}

#[test]
fn deleting_a_resource_returns_its_queue_to_the_pool_in_order() {
    let board = board();
    let r = board.create_resource("Ana").unwrap().id;
    let pooled = board.create_work_item(WorkItemDraft::new("P", 1)).unwrap().id;
    let mut queued = Vec::new();
    for name in ["A", "B", "C"] {
        let id = board.create_work_item(WorkItemDraft::new(name, 2)).unwrap().id;
        board.move_item(MoveRequest::append(id, Some(r))).unwrap();
        queued.push(id);
    }

    let migrated = board.delete_resource(r).unwrap();
    assert_eq!(migrated, 3);
    assert!(board.resources().unwrap().is_empty());

    let mut expected = vec![pooled];
    expected.extend(queued);
    assert_eq!(board.queue_ids(None).unwrap(), expected);
    board.verify().unwrap();
}

#[test]
fn resources_can_be_renamed_but_not_blank() {
    let board = board();
    let r = board.create_resource("Ana").unwrap();
    assert_eq!(board.rename_resource(r.id, " Bea ").unwrap().name, "Bea");
    assert_eq!(board.resource(r.id).unwrap().name, "Bea");
    assert!(matches!(
        board.rename_resource(r.id, "  "),
        Err(BoardError::Invalid(_))
    ));
    assert!(matches!(
        board.rename_resource(99, "X"),
        Err(BoardError::NotFound { .. })
    ));
}

#[test]
fn theme_summary_sorts_by_total_duration() {
    let board = board();
    for (name, days, theme) in [
        ("a", 2, "Infra"),
        ("b", 5, "Docs"),
        ("c", 4, "Infra"),
        ("d", 1, ""),
        ("e", 6, "Billing"),
    ] {
        board
            .create_work_item(WorkItemDraft::new(name, days).with_theme(theme))
            .unwrap();
    }

    let summary = board.theme_summary().unwrap();
    let rows: Vec<(&str, u64, usize)> = summary
        .iter()
        .map(|s| (s.theme.as_str(), s.total_duration, s.count))
        .collect();
    assert_eq!(
        rows,
        vec![("Billing", 6, 1), ("Infra", 6, 2), ("Docs", 5, 1)]
    );
}

#[test]
fn failed_transactions_leave_no_partial_writes() {
    let store = MemoryStore::new();
    let result: Result<(), BoardError> = store.transaction(|tx: &mut dyn BoardTx| {
        tx.insert_resource("Ana")?;
        Err(BoardError::invalid("abort"))
    });
    assert!(result.is_err());

    let board = Board::new(store);
    assert!(board.resources().unwrap().is_empty());
}

#[test]
fn clear_empties_the_board() {
    let board = board();
    let r = board.create_resource("Ana").unwrap().id;
    let id = board.create_work_item(WorkItemDraft::new("A", 1)).unwrap().id;
    board.move_item(MoveRequest::append(id, Some(r))).unwrap();

    board.clear().unwrap();
    assert!(board.resources().unwrap().is_empty());
    assert!(board.work_items().unwrap().is_empty());
    assert!(board.pool().unwrap().is_empty());
}
