use super::SourceClient;
use crate::retry::classify_source_error;
use connectors::{error::SourceError, http::page::parse_page};
use engine_core::retry::RetryPolicy;
use futures::{StreamExt, future, stream};
use model::{
    execution::source::SourceDescriptor,
    pagination::page::{FetchResult, Page, page_count},
};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

impl SourceClient {
    /// Fetches every page of `source`.
    ///
    /// The first page is fetched alone to learn the declared total; the
    /// remaining pages then run on up to `page_pool` workers and arrive in
    /// completion order. No page is scheduled after one comes back empty. A page that exhausts its retries is dropped and
    /// listed in `failed_pages`. If the first page fails the result is
    /// empty with a count of zero.
    pub async fn fetch_paginated(&self, source: &SourceDescriptor) -> FetchResult {
        let policy = Self::retry_policy(source);

        let first = match self.fetch_page(source, 1, &policy).await {
            Some(page) => page,
            None => {
                error!(source = %source.id, "First page failed; source unavailable");
                return FetchResult::unavailable(1);
            }
        };

        let Some(count) = first.count else {
            debug!(source = %source.id, "No declared total; paging until an empty page");
            return self.fetch_sequential(source, first, &policy).await;
        };

        info!(source = %source.id, total = count, "Total records to fetch");
        let mut result = FetchResult {
            count,
            data: first.data,
            failed_pages: Vec::new(),
        };

        if result.data.is_empty() || result.data.len() as u64 >= count {
            return result;
        }

        let pages = page_count(count, source.params.page_size);
        let exhausted = AtomicBool::new(false);
        let mut fetches = stream::iter(2..=pages)
            .take_while(|_| future::ready(!exhausted.load(Ordering::Acquire)))
            .map(|page| {
                let policy = &policy;
                let exhausted = &exhausted;
                async move {
                    let outcome = self.fetch_page(source, page, policy).await;
                    if outcome.as_ref().is_some_and(Page::is_empty) {
                        exhausted.store(true, Ordering::Release);
                    }
                    (page, outcome)
                }
            })
            .buffer_unordered(self.page_pool);

        while let Some((page, outcome)) = fetches.next().await {
            match outcome {
                Some(p) if p.is_empty() => {
                    debug!(source = %source.id, page, "Empty page before declared total; no further pages scheduled");
                }
                Some(p) => result.data.extend(p.data),
                None => result.failed_pages.push(page),
            }
        }

        result.failed_pages.sort_unstable();
        if result.is_partial() {
            warn!(
                source = %source.id,
                fetched = result.data.len(),
                total = count,
                failed_pages = ?result.failed_pages,
                "Partial result"
            );
        } else {
            info!(source = %source.id, records = result.data.len(), "Fetched all pages");
        }
        result
    }

    /// Walks pages one at a time until an empty or failed page.
    async fn fetch_sequential(
        &self,
        source: &SourceDescriptor,
        first: Page,
        policy: &RetryPolicy,
    ) -> FetchResult {
        let mut result = FetchResult::default();
        let mut page = 1;
        let mut current = first;

        while !current.is_empty() {
            result.data.extend(current.data);
            page += 1;
            match self.fetch_page(source, page, policy).await {
                Some(next) => current = next,
                None => {
                    result.failed_pages.push(page);
                    break;
                }
            }
        }

        result.count = result.data.len() as u64;
        info!(source = %source.id, records = result.count, pages = page - 1, "Fetched pages");
        result
    }

    /// One page under the retry policy; `None` once retries are exhausted.
    async fn fetch_page(&self, source: &SourceDescriptor, page: u32, policy: &RetryPolicy) -> Option<Page> {
        let url = source.page_url(page);
        let timeout = source.params.timeout();
        let label = format!("{} page {page}", source.id);

        debug!(source = %source.id, page, "Fetching page");
        let outcome = policy
            .run(
                &label,
                || {
                    let url = url.as_str();
                    async move {
                        let body = self.transport.get_json(url, timeout).await?;
                        parse_page(url, body)
                    }
                },
                classify_source_error,
            )
            .await;

        if !self.page_pause.is_zero() {
            tokio::time::sleep(self.page_pause).await;
        }

        match outcome {
            Ok(page) => Some(page),
            Err(e) => {
                let e: SourceError = e.into_inner();
                error!(source = %source.id, page, error = %e, "Dropping page after retries");
                None
            }
        }
    }
}
