use std::path::PathBuf;

/// Where the store lives, where `.tbl` files are read from, and how hard the
/// log is flushed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineParams {
    pub data_dir: PathBuf,
    pub tbl_dir: PathBuf,
    /// fsync the log on every `flush`, not just flush the buffer.
    pub wal_sync: bool,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            tbl_dir: PathBuf::from("tpch-data"),
            wal_sync: false,
        }
    }
}

impl EngineParams {
    /// Defaults overridden by `TPKV_DATA`, `TPKV_TBL_DIR` and `TPKV_WAL_SYNC`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let data_dir = lookup("TPKV_DATA")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);
        let tbl_dir = lookup("TPKV_TBL_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.tbl_dir);
        let wal_sync = match lookup("TPKV_WAL_SYNC")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => defaults.wal_sync,
        };
        Self {
            data_dir,
            tbl_dir,
            wal_sync,
        }
    }
}
