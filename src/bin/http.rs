#[cfg(feature = "http_api")]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use queue_board::{Board, BoardConfig, MemoryStore, config, http_api, logging};

    logging::init_tracing();
    let board_config = BoardConfig::from_env()?;
    let addr = config::http_addr_from_env()?;

    #[cfg(feature = "sqlite")]
    if let Some(path) = config::db_path_from_env() {
        let store = queue_board::SqliteStore::new(&path)?;
        tracing::info!(db = %path.display(), "using sqlite store");
        http_api::serve(addr, Board::with_config(store, board_config)).await?;
        return Ok(());
    }

    tracing::info!("using in-memory store");
    http_api::serve(addr, Board::with_config(MemoryStore::new(), board_config)).await?;
    Ok(())
}

#[cfg(not(feature = "http_api"))]
fn main() {
    eprintln!("Rebuild with the `http_api` feature to enable the HTTP server.");
}
