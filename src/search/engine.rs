use crate::config::SearchConfig;
use crate::crawler::{html_to_text, page_title};
use crate::morphology::Lemmatizer;
use crate::search::snippet::build_snippet;
use crate::search::types::{SearchItem, SearchResults};
use crate::search::{SearchError, SearchResult};
use crate::storage::{lock_storage, SharedStorage, SiteRecord, SqliteStorage, Storage};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::debug;

/// A page that matched every retained query lemma
#[derive(Debug, Clone)]
struct RankedPage {
    page_id: i64,
    absolute: f64,
    relative: f64,
}

/// Answers ranked queries against the lemma index
#[derive(Clone)]
pub struct SearchEngine {
    storage: SharedStorage,
    lemmatizer: Lemmatizer,
    config: SearchConfig,
}

impl SearchEngine {
    pub fn new(storage: SharedStorage, lemmatizer: Lemmatizer, config: SearchConfig) -> Self {
        Self {
            storage,
            lemmatizer,
            config,
        }
    }

    pub fn default_limit(&self) -> usize {
        self.config.default_limit
    }

    /// Runs a query, optionally scoped to the site with root URL `site`
    ///
    /// Pages must contain every retained lemma of the query. Lemmas present on
    /// more than the configured share of pages are dropped first, unless the
    /// corpus holds a single page. `limit` falls back to the configured default.
    pub fn search(
        &self,
        query: &str,
        site: Option<&str>,
        offset: usize,
        limit: Option<usize>,
    ) -> SearchResult<SearchResults> {
        if query.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let query_lemmas: HashSet<String> =
            self.lemmatizer.lemmas_with_counts(query).into_keys().collect();
        if query_lemmas.is_empty() {
            debug!("Query {:?} has no indexable words", query);
            return Ok(SearchResults::empty());
        }

        let storage = lock_storage(&self.storage)?;
        let site_id = match site {
            Some(url) => {
                let url = url.trim().trim_end_matches('/');
                let record = storage
                    .find_site_by_url(url)?
                    .ok_or_else(|| SearchError::UnknownSite(url.to_string()))?;
                Some(record.id)
            }
            None => None,
        };

        let Some(lemmas) = self.retained_lemmas(&storage, &query_lemmas, site_id)? else {
            return Ok(SearchResults::empty());
        };
        debug!("Searching for lemmas {:?}", lemmas);

        let ranked = self.rank_pages(&storage, &lemmas, site_id)?;
        let count = ranked.len();
        let limit = limit.unwrap_or(self.config.default_limit);

        let mut sites: HashMap<i64, SiteRecord> = HashMap::new();
        let mut data = Vec::new();
        for ranked_page in ranked.into_iter().skip(offset).take(limit) {
            let page = storage.get_page(ranked_page.page_id)?;
            if !sites.contains_key(&page.site_id) {
                let record = storage.get_site(page.site_id)?;
                sites.insert(page.site_id, record);
            }
            let (site_url, site_name) = sites
                .get(&page.site_id)
                .map(|s| (s.url.clone(), s.name.clone()))
                .unwrap_or_default();

            let text = html_to_text(&page.content);
            data.push(SearchItem {
                site: site_url,
                site_name,
                uri: page.path,
                title: page_title(&page.content).unwrap_or_default(),
                snippet: build_snippet(&text, &self.lemmatizer, &query_lemmas),
                relevance: ranked_page.relative,
            });
        }

        Ok(SearchResults { count, data })
    }

    /// Query lemmas that survive pruning, rarest first
    ///
    /// Returns None when a lemma is unknown in the searched scope, since no page
    /// can then contain all of them.
    fn retained_lemmas(
        &self,
        storage: &SqliteStorage,
        query_lemmas: &HashSet<String>,
        site_id: Option<i64>,
    ) -> SearchResult<Option<Vec<String>>> {
        let total_pages = storage.count_pages(site_id)?;
        let threshold = u64::from(self.config.frequency_threshold_percent);

        let mut frequencies: Vec<(String, u64)> = Vec::with_capacity(query_lemmas.len());
        for lemma in query_lemmas {
            match storage.lemma_document_frequency(lemma, site_id)? {
                Some(frequency) => frequencies.push((lemma.clone(), frequency)),
                None => {
                    debug!("Lemma {} is not indexed", lemma);
                    return Ok(None);
                }
            }
        }

        if total_pages > 1 {
            frequencies.retain(|(lemma, frequency)| {
                let keep = frequency * 100 <= threshold * total_pages;
                if !keep {
                    debug!("Ignoring frequent lemma {} ({} of {} pages)", lemma, frequency, total_pages);
                }
                keep
            });
        }

        if frequencies.is_empty() {
            return Ok(None);
        }

        frequencies.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        Ok(Some(frequencies.into_iter().map(|(lemma, _)| lemma).collect()))
    }

    fn rank_pages(
        &self,
        storage: &SqliteStorage,
        lemmas: &[String],
        site_id: Option<i64>,
    ) -> SearchResult<Vec<RankedPage>> {
        let mut pages: BTreeSet<i64> = BTreeSet::new();
        for (i, lemma) in lemmas.iter().enumerate() {
            let ids: BTreeSet<i64> = storage
                .page_ids_for_lemma(lemma, site_id)?
                .into_iter()
                .collect();
            pages = if i == 0 {
                ids
            } else {
                pages.intersection(&ids).copied().collect()
            };
            if pages.is_empty() {
                return Ok(Vec::new());
            }
        }

        let mut ranked = Vec::with_capacity(pages.len());
        for page_id in pages {
            let absolute = storage.rank_sum(page_id, lemmas)?;
            ranked.push(RankedPage {
                page_id,
                absolute,
                relative: 0.0,
            });
        }

        let max = ranked.iter().map(|p| p.absolute).fold(0.0_f64, f64::max);
        for page in &mut ranked {
            page.relative = if max > 0.0 { page.absolute / max } else { 0.0 };
        }

        ranked.sort_by(|a, b| {
            b.relative
                .partial_cmp(&a.relative)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.page_id.cmp(&b.page_id))
        });
        Ok(ranked)
    }
}
