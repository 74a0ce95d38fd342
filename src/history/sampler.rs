//! Bounded sampling of paginated listings into histories.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::reconstruct::{History, HistoryValue};
use super::resource::{ResourceItem, ResourceKind, ResourceSpec, ValueMode, PAGE_LENGTH};
use crate::github::{Fork, GitHubError, Release, Stargazer};

/// Source of listing pages for one repository.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch page `page` (1-based) of `kind`, at most `per_page` items.
    async fn fetch_page(&self, kind: ResourceKind, page: u64, per_page: u64) -> Result<Vec<Value>, GitHubError>;
}

/// Result of sampling one resource.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampledHistory {
    pub history: History,
    /// Declared total, passed through for axis scaling.
    pub total: u64,
    pub pages_fetched: u32,
}

/// Walks a listing according to a [`ResourceSpec`]'s fetch plan.
pub struct Sampler<'a> {
    spec: ResourceSpec,
    fetcher: &'a dyn PageFetcher,
}

impl<'a> Sampler<'a> {
    pub fn new(spec: ResourceSpec, fetcher: &'a dyn PageFetcher) -> Self {
        Self { spec, fetcher }
    }

    /// Sample the resource into a history.
    ///
    /// A zero total issues no request. Pages are fetched one at a time in
    /// increasing order; the first short page ends the walk. Any page error
    /// aborts the walk.
    pub async fn sample(&self) -> Result<SampledHistory, GitHubError> {
        match self.spec.kind {
            ResourceKind::Stars => self.run::<Stargazer>().await,
            ResourceKind::Forks => self.run::<Fork>().await,
            ResourceKind::Releases => self.run::<Release>().await,
        }
    }

    async fn run<T: ResourceItem>(&self) -> Result<SampledHistory, GitHubError> {
        let kind = self.spec.kind;
        let total = self.spec.total;
        let mut history = History::new();

        if total == 0 {
            return Ok(SampledHistory {
                history,
                total,
                pages_fetched: 0,
            });
        }

        let plan = self.spec.plan();
        tracing::debug!(
            "Sampling {:?}: total={} last_page={} stride={} planned={} budget={}",
            kind,
            total,
            plan.last_page,
            plan.page_stride,
            plan.planned_pages().count(),
            plan.request_budget
        );

        let mut page = 1;
        let mut pages_fetched = 0u32;
        let mut last_seen: Option<(u64, Value)> = None;

        loop {
            let items = self.fetcher.fetch_page(kind, page, plan.page_length).await?;
            pages_fetched += 1;

            let offset = (page - 1) * plan.page_length;
            let stride = plan.intra_page_stride(items.len());
            for (i, item) in items.iter().enumerate().step_by(stride) {
                self.record::<T>(&mut history, offset + i as u64 + 1, item);
            }
            if let Some(item) = items.last() {
                last_seen = Some((offset + items.len() as u64, item.clone()));
            }

            tracing::debug!("{:?} page {}: {} items", kind, page, items.len());

            if plan.is_last_page(items.len()) {
                break;
            }
            if pages_fetched >= plan.max_requests() {
                if page > plan.last_page {
                    tracing::warn!(
                        "{:?}: still full pages after {} requests, declared total {} looks stale",
                        kind,
                        pages_fetched,
                        total
                    );
                }
                break;
            }
            page = plan.next_page(page);
        }

        if self.spec.keep_last_item {
            if let Some((ordinal, item)) = last_seen {
                self.record::<T>(&mut history, ordinal, &item);
            }
        }

        Ok(SampledHistory {
            history,
            total,
            pages_fetched,
        })
    }

    fn record<T: ResourceItem>(&self, history: &mut History, ordinal: u64, raw: &Value) {
        let item: T = match serde_json::from_value(raw.clone()) {
            Ok(item) => item,
            Err(e) => {
                tracing::warn!("{:?} item #{} undecodable: {}", self.spec.kind, ordinal, e);
                return;
            }
        };

        let Some(key) = item.key() else {
            tracing::debug!("{:?} item #{} has no timestamp", self.spec.kind, ordinal);
            return;
        };

        let value = match self.spec.kind.value_mode() {
            ValueMode::Ordinal => HistoryValue::Count(ordinal),
            ValueMode::Label => match item.label() {
                Some(label) => HistoryValue::Label(label.to_string()),
                None => return,
            },
        };

        history.record(key, value);
    }
}

/// Fetch a listing page by page until a short page or `budget` pages.
pub async fn fetch_listing(
    fetcher: &dyn PageFetcher,
    kind: ResourceKind,
    budget: u32,
) -> Result<Vec<Value>, GitHubError> {
    let mut items = Vec::new();

    for page in 1..=u64::from(budget.max(1)) {
        let batch = fetcher.fetch_page(kind, page, PAGE_LENGTH).await?;
        let short = (batch.len() as u64) < PAGE_LENGTH;
        items.extend(batch);
        if short {
            return Ok(items);
        }
    }

    tracing::warn!("{:?} listing truncated at {} items", kind, items.len());
    Ok(items)
}

/// Listings held in memory, served page by page.
#[derive(Default)]
pub struct MemoryPages {
    items: HashMap<ResourceKind, Vec<Value>>,
    failures: HashMap<(ResourceKind, u64), GitHubError>,
    requests: Mutex<Vec<(ResourceKind, u64)>>,
}

impl MemoryPages {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(mut self, kind: ResourceKind, items: Vec<Value>) -> Self {
        self.items.insert(kind, items);
        self
    }

    /// Make `page` of `kind` fail with `err`.
    #[cfg(test)]
    pub fn fail_on(mut self, kind: ResourceKind, page: u64, err: GitHubError) -> Self {
        self.failures.insert((kind, page), err);
        self
    }

    /// Pages requested so far, in order.
    #[cfg(test)]
    pub fn requests(&self) -> Vec<(ResourceKind, u64)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for MemoryPages {
    async fn fetch_page(&self, kind: ResourceKind, page: u64, per_page: u64) -> Result<Vec<Value>, GitHubError> {
        self.requests.lock().unwrap().push((kind, page));

        if let Some(err) = self.failures.get(&(kind, page)) {
            return Err(err.clone());
        }

        let items = self.items.get(&kind).map(Vec::as_slice).unwrap_or_default();
        let start = page.saturating_sub(1).saturating_mul(per_page) as usize;
        let end = start.saturating_add(per_page as usize).min(items.len());
        Ok(items.get(start..end).map(<[Value]>::to_vec).unwrap_or_default())
    }
}
