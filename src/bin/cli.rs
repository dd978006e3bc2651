use chrono::NaiveDate;
use polars::prelude::{AnyValue, DataFrame};
use queue_board::{
    Board, BoardConfig, BoardResult, BoardStore, MemoryStore, MoveRequest, Priority, ResourceId,
    WorkItemDraft, WorkItemId, config, logging, restore_board_from_json, save_board_to_json,
};
use std::io::{self, Write};

fn render_cell(av: &AnyValue) -> String {
    match av {
        AnyValue::Null => String::new(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        _ => av.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let cells: Vec<Vec<String>> = (0..df.height())
        .map(|row_idx| {
            columns
                .iter()
                .map(|col| col.get(row_idx).map(|av| render_cell(&av)).unwrap_or_default())
                .collect()
        })
        .collect();

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &cells {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(w + 2));
        sep.push('+');
    }

    let line = |values: &[String]| {
        let mut out = String::from("|");
        for (value, width) in values.iter().zip(widths.iter().copied()) {
            out.push_str(&format!(" {value:<width$} |"));
        }
        out
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&line(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &cells {
        out.push_str(&line(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show every staff queue and the pool\n  staff list                         List staff\n  staff add <name...>                Add a staff member\n  staff rename <id> <name...>        Rename a staff member\n  staff rm <id>                      Remove a staff member (queue returns to pool)\n  add <duration_days> <name...>      Create a work item in the pool\n  theme <id> <text...>               Set a work item's theme\n  deps <id> <csv>                    Set a work item's dependencies (e.g. 1,2)\n  priority <id> <HIGH|MEDIUM|LOW>    Set a work item's priority\n  rm <id>                            Delete a work item\n  move <id> <staff_id|pool> [before|after <id>]\n                                     Move a work item\n  pool                               List the pool\n  pool <id>                          Return a work item to the pool\n  auto                               Assign the pool to the least loaded staff\n  timeline [YYYY-MM-DD] [weekends]   Show the timeline (weekends keeps Sat/Sun)\n  themes                             Total duration per theme\n  conflicts                          Items scheduled before their dependencies end\n  save json <path>                   Persist the board to disk\n  load json <path>                   Replace the board from disk\n  quit|exit                          Exit"
    );
}

/// Comma or space separated ids; `None` if any token is not an id.
fn parse_id_list(s: &str) -> Option<Vec<WorkItemId>> {
    s.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .map(|p| p.parse::<WorkItemId>().ok())
        .collect()
}

fn parse_target(s: &str) -> Option<Option<ResourceId>> {
    if s.eq_ignore_ascii_case("pool") {
        return Some(None);
    }
    s.parse::<ResourceId>().ok().map(Some)
}

fn print_board<S: BoardStore>(board: &Board<S>) -> BoardResult<()> {
    for resource in board.resources()? {
        let queue = board.queue(Some(resource.id))?;
        let total: u64 = queue.iter().map(|q| u64::from(q.item.duration_days)).sum();
        println!("Staff {} {} ({}d)", resource.id, resource.name, total);
        for (idx, queued) in queue.iter().enumerate() {
            println!(
                "  {}. #{} {} [{}d]",
                idx + 1,
                queued.item.id,
                queued.item.name,
                queued.item.duration_days
            );
        }
    }
    print_pool(board)
}

fn print_pool<S: BoardStore>(board: &Board<S>) -> BoardResult<()> {
    let pool = board.pool()?;
    println!("Pool ({})", pool.len());
    for queued in &pool {
        println!(
            "  #{} {} [{}d]",
            queued.item.id, queued.item.name, queued.item.duration_days
        );
    }
    Ok(())
}

fn print_timeline<S: BoardStore>(
    board: &Board<S>,
    start: NaiveDate,
    skip_weekends: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let today = chrono::Local::now().date_naive();
    let view = board.timeline(start, Some(skip_weekends), today)?;
    match (view.axis.first(), view.axis.last()) {
        (Some(first), Some(last)) => println!(
            "Axis {first} .. {last} ({} columns, {} week starts)",
            view.axis.len(),
            view.week_starts.len()
        ),
        _ => println!("Axis is empty"),
    }
    if let Some(marker) = view.today {
        println!("Today at column {marker}");
    }
    let df = view.layout.to_dataframe(&view.axis)?;
    print!("{}", render_df_as_text_table(&df));
    Ok(())
}

fn run<S: BoardStore>(board: Board<S>) {
    println!("Queue Board (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => {
                if let Err(e) = print_board(&board) {
                    println!("Error: {e}");
                }
            }
            "staff" => match (parts.next(), parts.next()) {
                (Some("list"), _) => match board.resources() {
                    Ok(resources) => {
                        for r in resources {
                            println!("  {} {}", r.id, r.name);
                        }
                    }
                    Err(e) => println!("Error: {e}"),
                },
                (Some("add"), Some(first)) => {
                    let name = std::iter::once(first).chain(parts).collect::<Vec<_>>().join(" ");
                    match board.create_resource(&name) {
                        Ok(r) => println!("Added staff {} ({}).", r.id, r.name),
                        Err(e) => println!("Error: {e}"),
                    }
                }
                (Some("rename"), Some(id_s)) => {
                    let Ok(id) = id_s.parse::<ResourceId>() else {
                        println!("Invalid id");
                        continue;
                    };
                    let name = parts.collect::<Vec<_>>().join(" ");
                    match board.rename_resource(id, &name) {
                        Ok(r) => println!("Renamed staff {} to {}.", r.id, r.name),
                        Err(e) => println!("Error: {e}"),
                    }
                }
                (Some("rm"), Some(id_s)) => {
                    let Ok(id) = id_s.parse::<ResourceId>() else {
                        println!("Invalid id");
                        continue;
                    };
                    match board.delete_resource(id) {
                        Ok(count) => {
                            println!("Removed staff {id}; {count} item(s) returned to pool.")
                        }
                        Err(e) => println!("Error: {e}"),
                    }
                }
                _ => println!("Usage: staff list | staff add <name...> | staff rename <id> <name...> | staff rm <id>"),
            },
            "add" => {
                let Some(dur_s) = parts.next() else {
                    println!("Usage: add <duration_days> <name...>");
                    continue;
                };
                let Ok(duration) = dur_s.parse::<u32>() else {
                    println!("Invalid duration_days");
                    continue;
                };
                let name = parts.collect::<Vec<_>>().join(" ");
                match board.create_work_item(WorkItemDraft::new(name, duration)) {
                    Ok(item) => println!("Created work item {} in pool.", item.id),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "theme" | "deps" | "priority" => {
                let Some(Ok(id)) = parts.next().map(|s| s.parse::<WorkItemId>()) else {
                    println!("Usage: {cmd} <id> <value>");
                    continue;
                };
                let rest = parts.collect::<Vec<_>>().join(" ");
                let priority = match cmd {
                    "priority" => match rest.parse::<Priority>() {
                        Ok(p) => Some(p),
                        Err(()) => {
                            println!("Priority must be HIGH, MEDIUM or LOW");
                            continue;
                        }
                    },
                    _ => None,
                };
                let dependencies = match cmd {
                    "deps" => match parse_id_list(&rest) {
                        Some(ids) => Some(ids),
                        None => {
                            println!("Dependencies must be work item ids, e.g. deps 5 1,2");
                            continue;
                        }
                    },
                    _ => None,
                };
                let result = board.work_item(id).and_then(|item| {
                    let mut draft = item.to_draft();
                    match (priority, dependencies) {
                        (Some(p), _) => draft.priority = p,
                        (_, Some(ids)) => draft.dependencies = ids,
                        _ => draft.theme = Some(rest),
                    }
                    board.update_work_item(id, draft)
                });
                match result {
                    Ok(_) => println!("Updated work item {id}."),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "rm" => match parts.next().map(|s| s.parse::<WorkItemId>()) {
                Some(Ok(id)) => match board.delete_work_item(id) {
                    Ok(()) => println!("Deleted work item {id}."),
                    Err(e) => println!("Error: {e}"),
                },
                _ => println!("Usage: rm <id>"),
            },
            "move" => {
                let id = parts.next().and_then(|s| s.parse::<WorkItemId>().ok());
                let target = parts.next().and_then(parse_target);
                let (Some(id), Some(target)) = (id, target) else {
                    println!("Usage: move <id> <staff_id|pool> [before|after <id>]");
                    continue;
                };
                let neighbor = parts.next().zip(parts.next().and_then(|s| s.parse().ok()));
                let request = match neighbor {
                    None => MoveRequest::append(id, target),
                    Some(("before", other)) => MoveRequest::before(id, target, other),
                    Some(("after", other)) => MoveRequest::after(id, target, other),
                    Some(_) => {
                        println!("Usage: move <id> <staff_id|pool> [before|after <id>]");
                        continue;
                    }
                };
                match board.move_item(request) {
                    Ok(a) => println!("Moved work item {id} (key {}).", a.key),
                    Err(e) => println!("Error: {e}"),
                }
            }
            "pool" => match parts.next().map(|s| s.parse::<WorkItemId>()) {
                None => {
                    if let Err(e) = print_pool(&board) {
                        println!("Error: {e}");
                    }
                }
                Some(Ok(id)) => match board.remove_to_pool(id) {
                    Ok(_) => println!("Returned work item {id} to pool."),
                    Err(e) => println!("Error: {e}"),
                },
                Some(Err(_)) => println!("Invalid id"),
            },
            "auto" => match board.auto_assign_all() {
                Ok(summary) => {
                    println!("Assigned {} item(s).", summary.assigned.len());
                    for load in &summary.totals {
                        println!("  staff {}: {}d", load.resource_id, load.total);
                    }
                }
                Err(e) => println!("Error: {e}"),
            },
            "timeline" => {
                let mut start = chrono::Local::now().date_naive();
                let mut skip_weekends = board.config().timeline.skip_weekends;
                let mut bad = false;
                for arg in parts {
                    if arg == "weekends" {
                        skip_weekends = false;
                    } else if let Ok(date) = NaiveDate::parse_from_str(arg, "%Y-%m-%d") {
                        start = date;
                    } else {
                        bad = true;
                    }
                }
                if bad {
                    println!("Usage: timeline [YYYY-MM-DD] [weekends]");
                    continue;
                }
                if let Err(e) = print_timeline(&board, start, skip_weekends) {
                    println!("Error: {e}");
                }
            }
            "themes" => match board.theme_summary() {
                Ok(summary) => {
                    for t in summary {
                        println!("  {:<20} {:>5}d  ({} item(s))", t.theme, t.total_duration, t.count);
                    }
                }
                Err(e) => println!("Error: {e}"),
            },
            "conflicts" => match board.dependency_conflicts() {
                Ok(conflicts) if conflicts.is_empty() => println!("No dependency conflicts."),
                Ok(conflicts) => {
                    for c in conflicts {
                        println!(
                            "  #{} starts {}d before #{} ends",
                            c.work_item_id, c.overlap, c.dependency_id
                        );
                    }
                }
                Err(e) => println!("Error: {e}"),
            },
            "save" | "load" => match (parts.next(), parts.next()) {
                (Some("json"), Some(path)) => {
                    let result = if cmd == "save" {
                        save_board_to_json(board.store(), path)
                    } else {
                        restore_board_from_json(board.store(), path)
                    };
                    match result {
                        Ok(()) if cmd == "save" => println!("Saved to {path}."),
                        Ok(()) => println!("Loaded from {path}."),
                        Err(e) => println!("Error: {e}"),
                    }
                }
                _ => println!("Usage: {cmd} json <path>"),
            },
            _ => println!("Unknown command '{cmd}'. Type 'help'."),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_tracing();
    let board_config = BoardConfig::from_env()?;
    match config::db_path_from_env() {
        Some(path) => {
            let store = queue_board::SqliteStore::new(&path)?;
            run(Board::with_config(store, board_config));
        }
        None => run(Board::with_config(MemoryStore::new(), board_config)),
    }
    Ok(())
}
