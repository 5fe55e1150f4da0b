use std::path::{Path, PathBuf};

use anyhow::{Context, Error};
use tokio::{fs, sync::RwLock};
use tracing::{debug, info, warn};

use crate::SymbolId;

/// Ordered, de-duplicated list of watched symbols backed by a plain text file.
///
/// Every mutation is written back before the call returns. The lock is held
/// across the write so concurrent mutations reach disk in the order they
/// were applied.
pub struct WatchlistStore {
    path: PathBuf,
    symbols: RwLock<Vec<SymbolId>>,
}

impl WatchlistStore {
    /// Load the watchlist at `path`, creating an empty file (and its parent
    /// directories) if none exists yet.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("create watchlist directory {}", parent.display()))?;
        }

        let symbols = match fs::read_to_string(&path).await {
            Ok(contents) => parse_lines(&contents),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %path.display(), "watchlist not found, creating empty file");
                fs::write(&path, "")
                    .await
                    .with_context(|| format!("create watchlist {}", path.display()))?;
                Vec::new()
            }
            Err(e) => {
                return Err(Error::new(e).context(format!("read watchlist {}", path.display())));
            }
        };

        info!(path = %path.display(), count = symbols.len(), "loaded watchlist");

        Ok(Self {
            path,
            symbols: RwLock::new(symbols),
        })
    }

    /// Add a symbol
    /// Returns true if it was newly added
    pub async fn add(&self, symbol: &str) -> Result<bool, Error> {
        let Some(id) = SymbolId::parse(symbol) else {
            debug!(raw = symbol, "rejected invalid symbol");
            return Ok(false);
        };

        let mut symbols = self.symbols.write().await;
        if symbols.contains(&id) {
            return Ok(false);
        }

        symbols.push(id);
        write_atomic(&self.path, &symbols).await?;

        Ok(true)
    }

    /// Remove a symbol
    /// Returns true if it existed
    pub async fn remove(&self, symbol: &str) -> Result<bool, Error> {
        let Some(id) = SymbolId::parse(symbol) else {
            return Ok(false);
        };

        let mut symbols = self.symbols.write().await;
        let Some(pos) = symbols.iter().position(|s| *s == id) else {
            return Ok(false);
        };

        symbols.remove(pos);
        write_atomic(&self.path, &symbols).await?;

        Ok(true)
    }

    /// Write the current list back to disk.
    pub async fn save(&self) -> Result<(), Error> {
        let symbols = self.symbols.read().await;
        write_atomic(&self.path, &symbols).await
    }

    /// Point-in-time copy of all symbols, in display order
    pub async fn list(&self) -> Vec<SymbolId> {
        self.symbols.read().await.clone()
    }

    pub async fn contains(&self, symbol: &str) -> bool {
        match SymbolId::parse(symbol) {
            Some(id) => self.symbols.read().await.contains(&id),
            None => false,
        }
    }

    /// Total number of tracked symbols
    pub async fn len(&self) -> usize {
        self.symbols.read().await.len()
    }

    /// Returns true if there are no tracked symbols
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn parse_lines(contents: &str) -> Vec<SymbolId> {
    let mut symbols: Vec<SymbolId> = Vec::new();

    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }

        match SymbolId::parse(line) {
            Some(id) if !symbols.contains(&id) => symbols.push(id),
            Some(_) => {}
            None => warn!(line, "skipping invalid watchlist entry"),
        }
    }

    symbols
}

async fn write_atomic(path: &Path, symbols: &[SymbolId]) -> Result<(), Error> {
    let mut contents = String::with_capacity(symbols.len() * 12);
    for id in symbols {
        contents.push_str(id.as_str());
        contents.push('\n');
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, contents)
        .await
        .with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .await
        .with_context(|| format!("replace watchlist {}", path.display()))?;

    debug!(path = %path.display(), count = symbols.len(), "saved watchlist");
    Ok(())
}
