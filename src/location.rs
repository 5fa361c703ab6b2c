//! Search-as-you-type for task locations
use std::sync::Arc;

use tokio::sync::watch;

use crate::config::Settings;
use crate::debounce::Debouncer;
use crate::traits::Geocoder;

/// See [`LocationSearch::results`]
pub type ResultsReceiver = watch::Receiver<Vec<String>>;

/// Sends the text typed by the user to a [`Geocoder`], once the user has stopped typing.
///
/// Queries shorter than `Settings::search_min_chars` (once trimmed) clear the results instead of reaching the geocoder.
/// A failing search is logged and keeps the previous results.
pub struct LocationSearch<G> {
    geocoder: Arc<G>,
    debouncer: Debouncer,
    results: Arc<watch::Sender<Vec<String>>>,
    _results_keeper: ResultsReceiver,
    min_chars: usize,
    limit: usize,
}

impl<G> LocationSearch<G>
where
    G: Geocoder + 'static,
{
    pub fn new(geocoder: Arc<G>, settings: &Settings) -> Self {
        let (results, _results_keeper) = watch::channel(Vec::new());
        Self {
            geocoder,
            debouncer: Debouncer::new(settings.search_debounce()),
            results: Arc::new(results),
            _results_keeper,
            min_chars: settings.search_min_chars,
            limit: settings.search_limit,
        }
    }

    /// The latest search results
    pub fn results(&self) -> ResultsReceiver {
        self.results.subscribe()
    }

    /// Call this every time the search text changes
    pub fn on_input(&mut self, text: &str) {
        let query = text.trim().to_string();
        let geocoder = self.geocoder.clone();
        let results = self.results.clone();
        let min_chars = self.min_chars;
        let limit = self.limit;

        self.debouncer.schedule(async move {
            if query.chars().count() < min_chars {
                let _ = results.send(Vec::new());
                return;
            }
            log::debug!("Searching locations for {:?}", query);
            match geocoder.search(&query, limit).await {
                Ok(mut found) => {
                    found.truncate(limit);
                    let _ = results.send(found);
                },
                Err(err) => log::warn!("Location search for {:?} failed: {}", query, err),
            }
        });
    }

    /// Forget the pending search, if any
    pub fn cancel(&mut self) {
        self.debouncer.cancel();
    }
}

/// Returns the `candidates` that contain `text`, ignoring case
pub fn quick_matches<'a, S: AsRef<str>>(candidates: &'a [S], text: &str) -> Vec<&'a str> {
    let needle = text.to_lowercase();
    candidates.iter()
        .map(|c| c.as_ref())
        .filter(|c| c.to_lowercase().contains(&needle))
        .collect()
}
