use std::path::PathBuf;

pub struct Config {
    pub db_path: PathBuf,
}

impl Config {
    /// Environment first, then `.env` (loaded by the caller), then defaults.
    pub fn from_env() -> Self {
        let db_path = std::env::var("TMD_DB_PATH").unwrap_or_else(|_| "tmd.db".into());
        Self {
            db_path: PathBuf::from(db_path),
        }
    }
}
