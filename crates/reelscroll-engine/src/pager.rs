//! Random page selection over a filtered, paginated collection.
//!
//! One page is drawn uniformly from the whole result set without fetching
//! it: a count-only query sizes the collection, a page number is drawn, and
//! the data query runs with a fresh random sort seed. Offsets pin the page;
//! filtered requests always start at page 1.

use async_trait::async_trait;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use reelscroll_core::defaults::RANDOM_SORT_PREFIX;
use reelscroll_core::{FilterCriteria, Result};

/// Paging half of a data query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
    /// Opaque sort token, `random_<seed>` for random order.
    pub sort: String,
}

/// One fetched page plus the server's total count for the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub count: u64,
    pub items: Vec<T>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            count: 0,
            items: Vec::new(),
        }
    }
}

/// A paginated collection ("scene markers", "scenes").
#[async_trait]
pub trait PageSource<T: Send>: Send + Sync {
    /// Collection name for logs.
    fn name(&self) -> &'static str;

    /// Total matches for `filter`, from a count-only query (`per_page = 1`).
    async fn count(&self, filter: &FilterCriteria, cancel: &CancellationToken) -> Result<u64>;

    /// Fetch one page.
    async fn fetch(
        &self,
        filter: &FilterCriteria,
        request: &PageRequest,
        cancel: &CancellationToken,
    ) -> Result<Page<T>>;
}

/// How the page number was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageChoice {
    /// Explicit offset.
    Pinned(u32),
    /// A filter is active.
    Filtered,
    /// Drawn from `1..=total_pages`.
    Random { page: u32, total_pages: u32 },
    /// Count unavailable or zero.
    Fallback,
}

impl PageChoice {
    pub fn page(&self) -> u32 {
        match self {
            PageChoice::Pinned(page) | PageChoice::Random { page, .. } => *page,
            PageChoice::Filtered | PageChoice::Fallback => 1,
        }
    }
}

/// 1-based page containing `offset`.
pub fn page_for_offset(offset: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    u32::try_from(offset / page_size)
        .unwrap_or(u32::MAX - 1)
        .saturating_add(1)
}

/// `ceil(count / page_size)`.
pub fn total_pages(count: u64, page_size: u32) -> u32 {
    let page_size = u64::from(page_size.max(1));
    u32::try_from(count.div_ceil(page_size)).unwrap_or(u32::MAX)
}

/// Uniform page in `1..=total_pages` (1 when there are no pages).
pub fn pick_random_page<R: Rng + ?Sized>(rng: &mut R, total_pages: u32) -> u32 {
    if total_pages <= 1 {
        1
    } else {
        rng.gen_range(1..=total_pages)
    }
}

/// Fresh random sort token.
pub fn random_sort_token<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{}{}", RANDOM_SORT_PREFIX, rng.gen_range(0..100_000_000u32))
}

/// Fetch one random page of `source`.
///
/// Count failures fall back to page 1. If the server reports matches but the
/// chosen page comes back empty, page 1 is tried once more.
pub async fn fetch_random_page<T, S>(
    source: &S,
    filter: &FilterCriteria,
    page_size: u32,
    offset: Option<u64>,
    cancel: &CancellationToken,
) -> Result<Vec<T>>
where
    T: Send,
    S: PageSource<T> + ?Sized,
{
    let page_size = page_size.max(1);
    let choice = choose_page(source, filter, page_size, offset, cancel).await;
    if cancel.is_cancelled() {
        return Ok(Vec::new());
    }

    debug!(
        subsystem = "engine",
        component = "pager",
        collection = source.name(),
        page = choice.page(),
        choice = ?choice,
        "Selected page"
    );

    let request = PageRequest {
        page: choice.page(),
        per_page: page_size,
        sort: random_sort_token(&mut rand::thread_rng()),
    };
    let page = source.fetch(filter, &request, cancel).await?;

    if page.items.is_empty() && page.count > 0 && request.page > 1 && !cancel.is_cancelled() {
        warn!(
            subsystem = "engine",
            component = "pager",
            collection = source.name(),
            page = request.page,
            total_count = page.count,
            "Empty page despite nonzero count, retrying page 1"
        );
        let retry = PageRequest {
            page: 1,
            sort: random_sort_token(&mut rand::thread_rng()),
            ..request
        };
        return Ok(source.fetch(filter, &retry, cancel).await?.items);
    }

    Ok(page.items)
}

async fn choose_page<T, S>(
    source: &S,
    filter: &FilterCriteria,
    page_size: u32,
    offset: Option<u64>,
    cancel: &CancellationToken,
) -> PageChoice
where
    T: Send,
    S: PageSource<T> + ?Sized,
{
    if let Some(offset) = offset {
        return PageChoice::Pinned(page_for_offset(offset, page_size));
    }
    if filter.is_active() {
        return PageChoice::Filtered;
    }

    match source.count(filter, cancel).await {
        Ok(0) => PageChoice::Fallback,
        Ok(count) => {
            let total = total_pages(count, page_size);
            let page = pick_random_page(&mut rand::thread_rng(), total);
            PageChoice::Random {
                page,
                total_pages: total,
            }
        }
        Err(e) => {
            warn!(
                subsystem = "engine",
                component = "pager",
                collection = source.name(),
                error = %e,
                "Count query failed, falling back to page 1"
            );
            PageChoice::Fallback
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reelscroll_core::{Error, MultiCriterion};
    use std::sync::Mutex;

    /// Source answering from a fixed script of pages.
    struct ScriptedSource {
        count: Result<u64>,
        pages: Mutex<Vec<Page<u32>>>,
        requests: Mutex<Vec<PageRequest>>,
        count_calls: Mutex<u32>,
    }

    impl ScriptedSource {
        fn new(count: Result<u64>, pages: Vec<Page<u32>>) -> Self {
            Self {
                count,
                pages: Mutex::new(pages),
                requests: Mutex::new(Vec::new()),
                count_calls: Mutex::new(0),
            }
        }

        fn requests(&self) -> Vec<PageRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource<u32> for ScriptedSource {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn count(&self, _filter: &FilterCriteria, _cancel: &CancellationToken) -> Result<u64> {
            *self.count_calls.lock().unwrap() += 1;
            self.count.clone()
        }

        async fn fetch(
            &self,
            _filter: &FilterCriteria,
            request: &PageRequest,
            _cancel: &CancellationToken,
        ) -> Result<Page<u32>> {
            self.requests.lock().unwrap().push(request.clone());
            let mut pages = self.pages.lock().unwrap();
            if pages.is_empty() {
                Ok(Page::default())
            } else {
                Ok(pages.remove(0))
            }
        }
    }

    fn page(count: u64, items: Vec<u32>) -> Page<u32> {
        Page { count, items }
    }

    #[test]
    fn test_page_math() {
        assert_eq!(total_pages(47, 20), 3);
        assert_eq!(total_pages(40, 20), 2);
        assert_eq!(total_pages(0, 20), 0);
        assert_eq!(page_for_offset(0, 20), 1);
        assert_eq!(page_for_offset(19, 20), 1);
        assert_eq!(page_for_offset(20, 20), 2);
        assert_eq!(page_for_offset(45, 20), 3);
    }

    #[test]
    fn test_random_page_bounds_and_spread() {
        let total = total_pages(47, 20);
        let mut rng = rand::thread_rng();
        let mut hits = [0u32; 4];
        for _ in 0..1000 {
            let page = pick_random_page(&mut rng, total);
            assert!((1..=3).contains(&page), "page {} out of range", page);
            hits[page as usize] += 1;
        }
        for count in &hits[1..] {
            assert!(*count < 500, "page chosen {} of 1000 times", count);
        }
    }

    #[test]
    fn test_sort_tokens_are_random_prefixed() {
        let mut rng = rand::thread_rng();
        let token = random_sort_token(&mut rng);
        assert!(token.starts_with("random_"));
        assert!(token["random_".len()..].parse::<u32>().is_ok());
    }

    #[tokio::test]
    async fn test_offset_pins_page_without_count() {
        let source = ScriptedSource::new(Ok(100), vec![page(100, vec![1])]);
        let items = fetch_random_page(
            &source,
            &FilterCriteria::default(),
            20,
            Some(45),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(items, vec![1]);
        assert_eq!(*source.count_calls.lock().unwrap(), 0);
        assert_eq!(source.requests()[0].page, 3);
    }

    #[tokio::test]
    async fn test_filtered_request_starts_at_page_one() {
        let source = ScriptedSource::new(Ok(100), vec![page(5, vec![1, 2])]);
        let filter = FilterCriteria {
            tags: MultiCriterion::includes([4]),
            ..Default::default()
        };
        fetch_random_page(&source, &filter, 20, None, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(*source.count_calls.lock().unwrap(), 0);
        assert_eq!(source.requests()[0].page, 1);
        assert!(source.requests()[0].sort.starts_with("random_"));
    }

    #[tokio::test]
    async fn test_count_failure_falls_back_to_page_one() {
        let source = ScriptedSource::new(
            Err(Error::Transport("down".into())),
            vec![page(3, vec![9])],
        );
        let items = fetch_random_page(
            &source,
            &FilterCriteria::default(),
            20,
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(items, vec![9]);
        assert_eq!(source.requests()[0].page, 1);
    }

    #[tokio::test]
    async fn test_empty_page_retries_once_at_page_one() {
        let source = ScriptedSource::new(
            Ok(10),
            vec![page(10, vec![]), page(10, vec![]), page(10, vec![1])],
        );
        let items = fetch_random_page(
            &source,
            &FilterCriteria::default(),
            5,
            Some(5),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(items.is_empty());
        let requests = source.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].page, 2);
        assert_eq!(requests[1].page, 1);
    }

    #[tokio::test]
    async fn test_retry_result_is_returned() {
        let source = ScriptedSource::new(Ok(10), vec![page(10, vec![]), page(10, vec![7, 8])]);
        let items = fetch_random_page(
            &source,
            &FilterCriteria::default(),
            5,
            Some(5),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(items, vec![7, 8]);
    }

    #[tokio::test]
    async fn test_cancelled_before_fetch_returns_empty() {
        let source = ScriptedSource::new(Ok(10), vec![page(10, vec![1])]);
        let cancel = CancellationToken::new();
        cancel.cancel();
        let items = fetch_random_page(&source, &FilterCriteria::default(), 5, None, &cancel)
            .await
            .unwrap();
        assert!(items.is_empty());
        assert!(source.requests().is_empty());
    }
}
