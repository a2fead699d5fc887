//! Boundary of the free-text location search.
//!
//! The geocoding service itself lives outside this crate. Searches are
//! best-effort: a failing service produces no results, never an error. Only
//! the newest submitted query may publish results; older in-flight requests
//! are superseded, not queued.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub const DEFAULT_RESULT_LIMIT: usize = 5;
pub const MIN_QUERY_LEN: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeocodeRequest {
    pub query: String,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeHit {
    pub id: String,
    pub lat: f64,
    pub lng: f64,
    pub display_name: String,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeocodeError {
    #[error("Geocoding service unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid geocoding response: {0}")]
    InvalidResponse(String),
}

pub trait Geocoder {
    fn search(&self, request: &GeocodeRequest) -> Result<Vec<GeocodeHit>, GeocodeError>;
}

/// Run a search, swallowing failures into an empty result set.
pub fn search_best_effort(geocoder: &dyn Geocoder, request: &GeocodeRequest) -> Vec<GeocodeHit> {
    match geocoder.search(request) {
        Ok(mut hits) => {
            hits.truncate(request.limit);
            hits
        }
        Err(e) => {
            warn!(query = %request.query, error = %e, "Location search failed");
            Vec::new()
        }
    }
}

/// Handle for one submitted query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
    pub request: GeocodeRequest,
}

/// Tracks the single live search and the results currently shown.
#[derive(Debug, Clone)]
pub struct SearchSlot {
    generation: u64,
    min_query_len: usize,
    limit: usize,
    results: Vec<GeocodeHit>,
}

impl Default for SearchSlot {
    fn default() -> Self {
        Self::new(MIN_QUERY_LEN, DEFAULT_RESULT_LIMIT)
    }
}

impl SearchSlot {
    pub fn new(min_query_len: usize, limit: usize) -> Self {
        Self {
            generation: 0,
            min_query_len,
            limit,
            results: Vec::new(),
        }
    }

    /// Submit new input. Any earlier ticket becomes stale.
    ///
    /// Input shorter than the minimum clears the results and returns `None`.
    pub fn submit(&mut self, query: &str) -> Option<SearchTicket> {
        self.generation += 1;
        let query = query.trim();
        if query.chars().count() < self.min_query_len {
            self.results.clear();
            return None;
        }
        Some(SearchTicket {
            generation: self.generation,
            request: GeocodeRequest {
                query: query.to_string(),
                limit: self.limit,
            },
        })
    }

    /// Publish results for a ticket. Returns `false` (and drops them) if a
    /// newer query was submitted since.
    pub fn complete(&mut self, ticket: &SearchTicket, hits: Vec<GeocodeHit>) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        self.results = hits;
        true
    }

    /// Run a ticket against a geocoder and publish its results if still current.
    pub fn resolve(&mut self, ticket: &SearchTicket, geocoder: &dyn Geocoder) -> bool {
        let hits = search_best_effort(geocoder, &ticket.request);
        self.complete(ticket, hits)
    }

    /// Invalidate any in-flight ticket (e.g. the search box was unmounted).
    pub fn cancel(&mut self) {
        self.generation += 1;
    }

    pub fn results(&self) -> &[GeocodeHit] {
        &self.results
    }
}
