//! Addressable location of the app: a route plus a query string.
//!
//! The directory view writes its filters into the current entry's query
//! (replace, never push). The query is only read back when a view mounts.

use std::fmt;

use tracing::trace;
use url::form_urlencoded;

use crate::domain::DirError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Dashboard,
    Directory,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Dashboard => "/",
            Route::Directory => "/people",
        }
    }
}

/// Ordered `key=value` pairs of a query string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPairs(Vec<(String, String)>);

impl QueryPairs {
    pub fn parse(query: &str) -> Self {
        Self(
            form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
                .into_owned()
                .collect(),
        )
    }

    pub fn push(&mut self, key: &str, value: &str) {
        self.0.push((key.to_string(), value.to_string()));
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for QueryPairs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish();
        f.write_str(&encoded)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub route: Route,
    pub query: QueryPairs,
}

impl Location {
    pub fn new(route: Route) -> Self {
        Self {
            route,
            query: QueryPairs::default(),
        }
    }

    pub fn parse(s: &str) -> Result<Self, DirError> {
        let (path, query) = match s.split_once('?') {
            Some((path, query)) => (path, query),
            None => (s, ""),
        };
        let route = match path.trim_end_matches('/') {
            "" => Route::Dashboard,
            "/people" | "people" => Route::Directory,
            _ => return Err(DirError::InvalidLocation(s.to_string())),
        };
        Ok(Self {
            route,
            query: QueryPairs::parse(query),
        })
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.route.path())?;
        if !self.query.is_empty() {
            write!(f, "?{}", self.query)?;
        }
        Ok(())
    }
}

/// History of visited locations. The last entry is current.
#[derive(Debug)]
pub struct Navigation {
    entries: Vec<Location>,
}

impl Navigation {
    pub fn new(initial: Location) -> Self {
        Self {
            entries: vec![initial],
        }
    }

    pub fn current(&self) -> &Location {
        // Never empty: `back` keeps the first entry.
        &self.entries[self.entries.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn push(&mut self, location: Location) {
        trace!("Navigate to {location}");
        self.entries.push(location);
    }

    /// Swaps the query of the current entry without growing the history.
    pub fn replace_query(&mut self, query: QueryPairs) {
        let last = self.entries.len() - 1;
        self.entries[last].query = query;
        trace!("Location is now {}", self.entries[last]);
    }

    pub fn back(&mut self) -> bool {
        if self.entries.len() > 1 {
            self.entries.pop();
            true
        } else {
            false
        }
    }
}
