//! Library inventory binary.

use library_app::{LibraryApp, config::Config, init_tracing};

fn main() -> anyhow::Result<()> {
    // Load environment variables from .env if present
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    tracing::info!(data_dir = %config.data_dir.display(), "Starting library inventory");

    let app = LibraryApp::open(config)?;
    let summary = app.summary();

    tracing::info!(
        books = summary.books,
        dvds = summary.dvds,
        software = summary.software,
        available = summary.available,
        reserved = summary.reserved,
        lent = summary.lent,
        users = summary.users,
        "Library ready"
    );

    Ok(())
}
