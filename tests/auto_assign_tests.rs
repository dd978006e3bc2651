use parking_lot::Mutex;
use queue_board::{
    Assignment, Board, BoardError, BoardResult, BoardStore, BoardTx, MemoryStore, MoveRequest,
    OrderingKey, StoreError, WorkItemDraft, WorkItemId,
};

fn board() -> Board<MemoryStore> {
    Board::new(MemoryStore::new())
}

fn pooled(board: &Board<MemoryStore>, days: &[u32]) -> Vec<WorkItemId> {
    days.iter()
        .enumerate()
        .map(|(n, d)| {
            board
                .create_work_item(WorkItemDraft::new(format!("item {n}"), *d))
                .unwrap()
                .id
        })
        .collect()
}

#[test]
fn no_resources_is_an_error_even_with_an_empty_pool() {
    let board = board();
    assert!(matches!(
        board.auto_assign_all(),
        Err(BoardError::EmptyTargetSet)
    ));

    pooled(&board, &[3]);
    assert!(matches!(
        board.auto_assign_all(),
        Err(BoardError::EmptyTargetSet)
    ));
    assert_eq!(board.pool().unwrap().len(), 1);
}

#[test]
fn empty_pool_is_a_no_op() {
    let board = board();
    let r = board.create_resource("Ana").unwrap().id;
    let summary = board.auto_assign_all().unwrap();
    assert!(summary.assigned.is_empty());
    assert_eq!(summary.totals.len(), 1);
    assert_eq!(summary.totals[0].resource_id, r);
    assert_eq!(summary.totals[0].total, 0);
}

#[test]
fn pool_order_goes_to_the_least_loaded_resource() {
    let board = board();
    let r1 = board.create_resource("Ana").unwrap().id;
    let r2 = board.create_resource("Ben").unwrap().id;
    let ids = pooled(&board, &[5, 3, 2, 2]);

    let summary = board.auto_assign_all().unwrap();
    assert_eq!(summary.assigned.len(), 4);
    assert!(board.pool().unwrap().is_empty());

    // 5 -> r1; 3 -> r2; 2 -> r2 (3 < 5); 2 -> r1 on the tie at 5.
    assert_eq!(board.queue_ids(Some(r1)).unwrap(), vec![ids[0], ids[3]]);
    assert_eq!(board.queue_ids(Some(r2)).unwrap(), vec![ids[1], ids[2]]);
    let totals: Vec<u64> = summary.totals.iter().map(|t| t.total).collect();
    assert_eq!(totals, vec![7, 5]);
}

#[test]
fn existing_load_is_taken_into_account() {
    let board = board();
    let r1 = board.create_resource("Ana").unwrap().id;
    let r2 = board.create_resource("Ben").unwrap().id;
    let busy = pooled(&board, &[10])[0];
    board.move_item(MoveRequest::append(busy, Some(r1))).unwrap();

    let ids = pooled(&board, &[2, 2, 2]);
    board.auto_assign_all().unwrap();
    assert_eq!(board.queue_ids(Some(r1)).unwrap(), vec![busy]);
    assert_eq!(board.queue_ids(Some(r2)).unwrap(), ids);
}

#[test]
fn final_totals_stay_within_one_item_of_each_other() {
    let board = board();
    for name in ["Ana", "Ben", "Cy"] {
        board.create_resource(name).unwrap();
    }
    let durations = [4, 1, 7, 3, 3, 2, 5, 1, 6, 2, 2, 8];
    pooled(&board, &durations);

    let summary = board.auto_assign_all().unwrap();
    let max = summary.totals.iter().map(|t| t.total).max().unwrap();
    let min = summary.totals.iter().map(|t| t.total).min().unwrap();
    let longest = u64::from(*durations.iter().max().unwrap());
    assert!(max - min <= longest, "totals {:?}", summary.totals);

    let sum: u64 = durations.iter().map(|d| u64::from(*d)).sum();
    assert_eq!(summary.totals.iter().map(|t| t.total).sum::<u64>(), sum);
    board.verify().unwrap();
}

#[test]
fn rerunning_after_a_full_assignment_changes_nothing() {
    let board = board();
    let r = board.create_resource("Ana").unwrap().id;
    let ids = pooled(&board, &[1, 2]);
    board.auto_assign_all().unwrap();
    let again = board.auto_assign_all().unwrap();
    assert!(again.assigned.is_empty());
    assert_eq!(board.queue_ids(Some(r)).unwrap(), ids);
}

type Interference = Box<dyn FnOnce(&mut dyn BoardTx) -> BoardResult<()> + Send>;

enum Hook {
    /// Commits a competing write just before the armed transaction runs.
    Interfere(Interference),
    /// Fails the armed transaction without touching the store.
    Fail,
}

/// Memory store that misbehaves on one transaction chosen by `arm`.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    hook: Mutex<Option<(usize, Hook)>>,
}

impl FlakyStore {
    /// Fires `hook` on the transaction that starts after `skip` others.
    fn arm(&self, skip: usize, hook: Hook) {
        *self.hook.lock() = Some((skip, hook));
    }
}

impl BoardStore for FlakyStore {
    fn transaction<T, F>(&self, f: F) -> BoardResult<T>
    where
        F: FnOnce(&mut dyn BoardTx) -> BoardResult<T>,
    {
        let hook = {
            let mut slot = self.hook.lock();
            if matches!(slot.as_ref(), Some((0, _))) {
                slot.take().map(|(_, hook)| hook)
            } else {
                if let Some((remaining, _)) = slot.as_mut() {
                    *remaining -= 1;
                }
                None
            }
        };
        match hook {
            Some(Hook::Fail) => {
                return Err(StoreError::Corrupt("store went away".to_string()).into());
            }
            Some(Hook::Interfere(write)) => self.inner.transaction(write)?,
            None => {}
        }
        self.inner.transaction(f)
    }
}

fn flaky_board() -> Board<FlakyStore> {
    Board::new(FlakyStore::default())
}

fn pooled_on<S: BoardStore>(board: &Board<S>, days: &[u32]) -> Vec<WorkItemId> {
    days.iter()
        .map(|d| {
            board
                .create_work_item(WorkItemDraft::new(format!("{d} days"), *d))
                .unwrap()
                .id
        })
        .collect()
}

#[test]
fn items_that_leave_the_pool_mid_run_are_skipped() {
    let board = flaky_board();
    let r1 = board.create_resource("Ana").unwrap().id;
    let r2 = board.create_resource("Ben").unwrap().id;
    let ids = pooled_on(&board, &[5, 3, 2]);

    // Planning and the first placement run, then someone grabs the second
    // planned item before its own write.
    let grabbed = ids[1];
    board.store().arm(
        2,
        Hook::Interfere(Box::new(move |tx: &mut dyn BoardTx| {
            tx.set_assignment(Assignment {
                work_item_id: grabbed,
                resource_id: Some(r1),
                key: OrderingKey::new(1.0),
            })?;
            Ok(())
        })),
    );

    let summary = board.auto_assign_all().unwrap();
    assert_eq!(summary.skipped, vec![grabbed]);
    let assigned: Vec<WorkItemId> = summary.assigned.iter().map(|p| p.work_item_id).collect();
    assert_eq!(assigned, vec![ids[0], ids[2]]);

    // Totals only count what this run placed.
    let totals: Vec<(i64, u64)> = summary
        .totals
        .iter()
        .map(|t| (t.resource_id, t.total))
        .collect();
    assert_eq!(totals, vec![(r1, 5), (r2, 2)]);

    assert_eq!(board.queue_ids(Some(r1)).unwrap(), vec![grabbed, ids[0]]);
    assert_eq!(board.queue_ids(Some(r2)).unwrap(), vec![ids[2]]);
    assert!(board.pool().unwrap().is_empty());
    board.verify().unwrap();
}

#[test]
fn a_failed_run_keeps_earlier_placements_and_a_rerun_finishes() {
    let board = flaky_board();
    let r1 = board.create_resource("Ana").unwrap().id;
    let r2 = board.create_resource("Ben").unwrap().id;
    let ids = pooled_on(&board, &[5, 3, 2]);

    board.store().arm(2, Hook::Fail);
    assert!(matches!(
        board.auto_assign_all(),
        Err(BoardError::Store(StoreError::Corrupt(_)))
    ));
    assert_eq!(board.queue_ids(Some(r1)).unwrap(), vec![ids[0]]);
    assert_eq!(board.queue_ids(None).unwrap(), vec![ids[1], ids[2]]);

    let summary = board.auto_assign_all().unwrap();
    assert_eq!(summary.assigned.len(), 2);
    assert!(summary.skipped.is_empty());
    assert!(board.pool().unwrap().is_empty());
    assert_eq!(board.queue_ids(Some(r1)).unwrap(), vec![ids[0]]);
    assert_eq!(board.queue_ids(Some(r2)).unwrap(), vec![ids[1], ids[2]]);
}
