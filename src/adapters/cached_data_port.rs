//! Keyed memoization in front of any [`DataPort`].
//!
//! The cache belongs to whoever constructs it (the CLI for one invocation). Only
//! successful fetches are stored; errors are returned every time.

use crate::domain::error::SignalframeError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::resample::MacroObservation;
use crate::domain::sentiment::Article;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CacheKey {
    Ohlcv {
        symbol: String,
        start: NaiveDate,
        end: NaiveDate,
    },
    Macro(String),
    Articles,
}

#[derive(Debug, Clone)]
enum CacheEntry {
    Ohlcv(Vec<OhlcvBar>),
    Macro(Vec<MacroObservation>),
    Articles(Vec<Article>),
}

pub struct CachedDataPort<D: DataPort> {
    inner: D,
    entries: RefCell<HashMap<CacheKey, CacheEntry>>,
    hits: Cell<usize>,
}

impl<D: DataPort> CachedDataPort<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            entries: RefCell::new(HashMap::new()),
            hits: Cell::new(0),
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.get()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    fn cached<T>(
        &self,
        key: CacheKey,
        extract: impl Fn(&CacheEntry) -> Option<T>,
        wrap: impl FnOnce(T) -> CacheEntry,
        fetch: impl FnOnce() -> Result<T, SignalframeError>,
    ) -> Result<T, SignalframeError>
    where
        T: Clone,
    {
        if let Some(value) = self.entries.borrow().get(&key).and_then(&extract) {
            self.hits.set(self.hits.get() + 1);
            return Ok(value);
        }
        let value = fetch()?;
        self.entries.borrow_mut().insert(key, wrap(value.clone()));
        Ok(value)
    }
}

impl<D: DataPort> DataPort for CachedDataPort<D> {
    fn fetch_ohlcv(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<OhlcvBar>, SignalframeError> {
        self.cached(
            CacheKey::Ohlcv {
                symbol: symbol.to_string(),
                start: start_date,
                end: end_date,
            },
            |e| match e {
                CacheEntry::Ohlcv(bars) => Some(bars.clone()),
                _ => None,
            },
            CacheEntry::Ohlcv,
            || self.inner.fetch_ohlcv(symbol, start_date, end_date),
        )
    }

    fn fetch_macro(&self, name: &str) -> Result<Vec<MacroObservation>, SignalframeError> {
        self.cached(
            CacheKey::Macro(name.to_string()),
            |e| match e {
                CacheEntry::Macro(obs) => Some(obs.clone()),
                _ => None,
            },
            CacheEntry::Macro,
            || self.inner.fetch_macro(name),
        )
    }

    fn fetch_articles(&self) -> Result<Vec<Article>, SignalframeError> {
        self.cached(
            CacheKey::Articles,
            |e| match e {
                CacheEntry::Articles(a) => Some(a.clone()),
                _ => None,
            },
            CacheEntry::Articles,
            || self.inner.fetch_articles(),
        )
    }

    fn list_symbols(&self) -> Result<Vec<String>, SignalframeError> {
        self.inner.list_symbols()
    }

    fn get_data_range(&self, symbol: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SignalframeError> {
        self.inner.get_data_range(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingPort {
        calls: Cell<usize>,
        fail: bool,
    }

    impl DataPort for CountingPort {
        fn fetch_ohlcv(&self, symbol: &str, start: NaiveDate, _end: NaiveDate) -> Result<Vec<OhlcvBar>, SignalframeError> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                return Err(SignalframeError::Data {
                    reason: "offline".into(),
                });
            }
            Ok(vec![OhlcvBar::new(symbol, start, 1.0, 1.0, 1.0, 1.0, None)])
        }

        fn fetch_macro(&self, _name: &str) -> Result<Vec<MacroObservation>, SignalframeError> {
            self.calls.set(self.calls.get() + 1);
            Ok(Vec::new())
        }

        fn fetch_articles(&self) -> Result<Vec<Article>, SignalframeError> {
            Ok(Vec::new())
        }

        fn list_symbols(&self) -> Result<Vec<String>, SignalframeError> {
            Ok(Vec::new())
        }

        fn get_data_range(&self, _symbol: &str) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SignalframeError> {
            Ok(None)
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn repeated_fetch_hits_cache() {
        let port = CachedDataPort::new(CountingPort::default());
        let first = port.fetch_ohlcv("SPY", d(1), d(31)).unwrap();
        let second = port.fetch_ohlcv("SPY", d(1), d(31)).unwrap();

        assert_eq!(first, second);
        assert_eq!(port.inner.calls.get(), 1);
        assert_eq!(port.hits(), 1);
    }

    #[test]
    fn key_includes_range_and_kind() {
        let port = CachedDataPort::new(CountingPort::default());
        port.fetch_ohlcv("SPY", d(1), d(31)).unwrap();
        port.fetch_ohlcv("SPY", d(2), d(31)).unwrap();
        port.fetch_macro("SPY").unwrap();

        assert_eq!(port.inner.calls.get(), 3);
        assert_eq!(port.len(), 3);
        port.clear();
        assert!(port.is_empty());
    }

    #[test]
    fn errors_are_not_cached() {
        let port = CachedDataPort::new(CountingPort {
            fail: true,
            ..Default::default()
        });
        assert!(port.fetch_ohlcv("SPY", d(1), d(31)).is_err());
        assert!(port.fetch_ohlcv("SPY", d(1), d(31)).is_err());
        assert_eq!(port.inner.calls.get(), 2);
        assert!(port.is_empty());
    }
}
