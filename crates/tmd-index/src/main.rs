mod config;

use anyhow::{Context, bail};
use tracing::info;

use tmd_db::Database;

use crate::config::Config;

const USAGE: &str = "usage:
  tmd-index                                 bootstrap the store
  tmd-index locate-account <account_id> <dir>
  tmd-index locate-list <list_id> <dir>
  tmd-index links <account_id>";

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tmd_index=info,tmd_db=info".into()),
        )
        .init();

    let config = Config::from_env();
    let db = Database::open(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?;

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    match args.as_slice() {
        [] => info!("Store ready at {}", config.db_path.display()),
        ["locate-account", id, dir] => {
            let found = db.locate_account_entity(parse_id(id)?, dir)?;
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
        ["locate-list", id, dir] => {
            let found = db.locate_list_entity(parse_id(id)?, dir)?;
            println!("{}", serde_json::to_string_pretty(&found)?);
        }
        ["links", id] => {
            let links = db.links_for_account(parse_id(id)?)?;
            println!("{}", serde_json::to_string_pretty(&links)?);
        }
        _ => bail!("{USAGE}"),
    }

    Ok(())
}

fn parse_id(raw: &str) -> anyhow::Result<i64> {
    raw.parse()
        .with_context(|| format!("'{raw}' is not a numeric id"))
}
