use async_trait::async_trait;

use crate::{
    error::AppResult,
    models::{Collection, CollectionOutcome, Page, PageRequest, Record},
};

/// Anything that can answer a page request. The HTTP client implements this,
/// tests script it.
#[async_trait]
pub trait PageSource {
    async fn fetch_page(&self, request: &PageRequest) -> AppResult<Page>;
}

/// What to walk and how far.
#[derive(Debug, Clone)]
pub struct CollectOptions {
    pub identifier: String,
    pub page_size: u32,
    pub sort: String,
    // None walks until an empty page or the declared total
    pub max_pages: Option<u32>,
}

// Walks pages 1.. sequentially until an empty page, the declared total or a failure
pub async fn collect_all<S>(source: &S, options: &CollectOptions) -> Collection
where
    S: PageSource + ?Sized,
{
    tracing::info!(identifier = %options.identifier, page_size = options.page_size, "Starting collection");

    let mut records: Vec<Record> = Vec::new();
    let mut page = 1u32;
    let mut pages_requested = 0u32;

    let outcome = loop {
        if let Some(max) = options.max_pages {
            if page > max {
                tracing::warn!(max_pages = max, collected = records.len(), "Page limit reached before the listing ended");
                break CollectionOutcome::Partial { page, reason: format!("page limit of {} reached", max) };
            }
        }

        let request = PageRequest {
            page,
            page_size: options.page_size,
            identifier: options.identifier.clone(),
            sort: options.sort.clone(),
        };
        pages_requested += 1;

        let fetched = match source.fetch_page(&request).await {
            Ok(p) => p,
            Err(e) => {
                // No retry: whatever was gathered so far is the result
                tracing::error!(page, error = %e, collected = records.len(), "Page fetch failed, stopping collection");
                let reason = e.to_string();
                break if records.is_empty() {
                    CollectionOutcome::Failed { reason }
                } else {
                    CollectionOutcome::Partial { page, reason }
                };
            }
        };

        if fetched.records.is_empty() {
            tracing::debug!(page, "Empty page, listing exhausted");
            break CollectionOutcome::Complete;
        }

        tracing::debug!(page, num_records = fetched.records.len(), declared_total = ?fetched.declared_total, "Fetched page");
        records.extend(fetched.records);

        if let Some(total) = fetched.declared_total {
            let total = usize::try_from(total).unwrap_or(usize::MAX);
            if records.len() >= total {
                if records.len() > total {
                    tracing::debug!(page, surplus = records.len() - total, "Dropping records beyond the declared total");
                    records.truncate(total);
                }
                break CollectionOutcome::Complete;
            }
        }

        page += 1;
    };

    tracing::info!(collected = records.len(), pages_requested, outcome = ?outcome, "Collection finished");
    Collection { records, outcome, pages_requested }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use serde_json::json;
    use std::sync::Mutex;

    // Serves scripted pages in order and remembers which pages were asked for
    struct ScriptedSource {
        pages: Vec<AppResult<Page>>,
        requested: Mutex<Vec<u32>>,
    }

    impl ScriptedSource {
        fn new(pages: Vec<AppResult<Page>>) -> Self {
            ScriptedSource { pages, requested: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl PageSource for ScriptedSource {
        async fn fetch_page(&self, request: &PageRequest) -> AppResult<Page> {
            self.requested.lock().unwrap().push(request.page);
            match self.pages.get(request.page as usize - 1) {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(e)) => Err(AppError::ApiShape(e.to_string())),
                None => Ok(Page::default()),
            }
        }
    }

    fn page_of(n: usize, total: Option<u64>) -> AppResult<Page> {
        let records = (0..n)
            .map(|i| json!({ "id": i }).as_object().unwrap().clone())
            .collect();
        Ok(Page { records, declared_total: total })
    }

    fn options() -> CollectOptions {
        CollectOptions { identifier: "118".into(), page_size: 100, sort: "new".into(), max_pages: None }
    }

    #[tokio::test]
    async fn stops_at_first_empty_page() {
        let source = ScriptedSource::new(vec![page_of(100, None), page_of(30, None), page_of(0, None), page_of(5, None)]);
        let collection = collect_all(&source, &options()).await;
        assert_eq!(collection.records.len(), 130);
        assert_eq!(collection.outcome, CollectionOutcome::Complete);
        assert_eq!(*source.requested.lock().unwrap(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn stops_when_declared_total_reached() {
        let source = ScriptedSource::new(vec![page_of(100, Some(150)), page_of(50, Some(150)), page_of(10, Some(150))]);
        let collection = collect_all(&source, &options()).await;
        assert_eq!(collection.records.len(), 150);
        assert_eq!(collection.pages_requested, 2);
        assert_eq!(*source.requested.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn never_exceeds_declared_total() {
        let source = ScriptedSource::new(vec![page_of(100, Some(120)), page_of(100, Some(120))]);
        let collection = collect_all(&source, &options()).await;
        assert_eq!(collection.records.len(), 120);
        assert_eq!(collection.outcome, CollectionOutcome::Complete);
    }

    #[tokio::test]
    async fn failure_keeps_partial_records() {
        let source = ScriptedSource::new(vec![
            page_of(100, None),
            Err(AppError::ApiShape("boom".into())),
            page_of(100, None),
        ]);
        let collection = collect_all(&source, &options()).await;
        assert_eq!(collection.records.len(), 100);
        assert!(matches!(collection.outcome, CollectionOutcome::Partial { page: 2, .. }));
        assert_eq!(*source.requested.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn failure_on_first_page_is_total_failure() {
        let source = ScriptedSource::new(vec![Err(AppError::ApiShape("down".into()))]);
        let collection = collect_all(&source, &options()).await;
        assert!(collection.is_empty());
        assert!(matches!(collection.outcome, CollectionOutcome::Failed { .. }));
    }

    #[tokio::test]
    async fn page_limit_bounds_the_loop() {
        let source = ScriptedSource::new((0..5).map(|_| page_of(10, None)).collect());
        let mut opts = options();
        opts.max_pages = Some(2);
        let collection = collect_all(&source, &opts).await;
        assert_eq!(collection.records.len(), 20);
        assert!(matches!(collection.outcome, CollectionOutcome::Partial { page: 3, .. }));
        assert_eq!(*source.requested.lock().unwrap(), vec![1, 2]);
    }
}
