mod delete;
mod focus;
mod list;
mod watch;

use crate::{Data, Error};
use delete::delete;
use focus::{analysis, focus, unfocus};
use list::list;
use watch::watch;

pub use focus::{Action, RsiZone};

const HELP: &str = "\
Commands:
  watch <id>[,<id>...]    add coins to the watchlist (e.g. bitcoin,ethereum)
  delete <id>[,<id>...]   remove coins from the watchlist
  list                    watched coins with their latest prices
  focus <id>              fetch price history and indicators for a coin
  unfocus                 stop tracking the focused coin
  analysis                show RSI / MACD for the focused coin
  help                    this text
  quit                    exit";

#[derive(Debug, PartialEq, Eq)]
pub enum Reply {
    Output(String),
    Quit,
}

/// Run one console line.
pub async fn dispatch(data: &Data, line: &str) -> Result<Reply, Error> {
    let line = line.trim();
    let (name, args) = line.split_once(char::is_whitespace).unwrap_or((line, ""));

    let output = match name.to_lowercase().as_str() {
        "" => return Ok(Reply::Output(String::new())),
        "watch" | "add" => watch(data, args).await?,
        "delete" | "remove" | "rm" => delete(data, args).await?,
        "list" | "ls" => list(data).await,
        "focus" => focus(data, args)?,
        "unfocus" => unfocus(data),
        "analysis" | "show" => analysis(data),
        "help" | "?" => HELP.to_string(),
        "quit" | "exit" => return Ok(Reply::Quit),
        other => format!("Unknown command `{other}`. Type `help` for a list."),
    };

    Ok(Reply::Output(output))
}

/// Split comma and/or whitespace separated symbols.
fn split_symbols(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use std::{collections::HashMap, sync::Arc};

    use async_trait::async_trait;
    use market::{FetchError, PollScheduler, PricePoint, PriceSource, SymbolId, WatchlistStore};

    use super::*;

    #[derive(Default)]
    pub struct StaticSource {
        pub current: HashMap<SymbolId, f32>,
        pub history: HashMap<SymbolId, Vec<PricePoint>>,
    }

    #[async_trait]
    impl PriceSource for StaticSource {
        async fn fetch_current(
            &self,
            _ids: &[SymbolId],
        ) -> Result<HashMap<SymbolId, f32>, FetchError> {
            Ok(self.current.clone())
        }

        async fn fetch_history(
            &self,
            id: &SymbolId,
            _range_days: u32,
        ) -> Result<Vec<PricePoint>, FetchError> {
            self.history
                .get(id)
                .cloned()
                .ok_or_else(|| FetchError::Empty(id.clone()))
        }
    }

    pub fn id(s: &str) -> SymbolId {
        SymbolId::parse(s).unwrap()
    }

    pub async fn data_with(source: StaticSource, watched: &[&str]) -> (Data, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let watchlist = Arc::new(
            WatchlistStore::load(dir.path().join("watchlist.txt"))
                .await
                .unwrap(),
        );
        for s in watched {
            watchlist.add(s).await.unwrap();
        }

        let scheduler = Arc::new(PollScheduler::new(
            Arc::new(source),
            Arc::clone(&watchlist),
            100,
        ));

        (
            Data {
                watchlist,
                scheduler,
                history_days: 7,
            },
            dir,
        )
    }

    pub async fn run(data: &Data, line: &str) -> String {
        match dispatch(data, line).await.unwrap() {
            Reply::Output(out) => out,
            Reply::Quit => panic!("unexpected quit for {line:?}"),
        }
    }

    #[test]
    fn split_symbols_accepts_commas_and_spaces() {
        assert_eq!(
            split_symbols(" BTC, eth  sol,,"),
            vec!["btc", "eth", "sol"]
        );
        assert!(split_symbols(" , ").is_empty());
    }

    #[tokio::test]
    async fn quit_and_unknown() {
        let (data, _dir) = data_with(StaticSource::default(), &[]).await;

        assert_eq!(dispatch(&data, "  QUIT ").await.unwrap(), Reply::Quit);
        assert!(run(&data, "frobnicate").await.starts_with("Unknown command `frobnicate`"));
        assert_eq!(run(&data, "   ").await, "");
        assert!(run(&data, "help").await.contains("watch <id>"));
    }
}
