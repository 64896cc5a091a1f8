use super::source::{JsonSource, ProxyRewrite};
use super::Entity;
use crate::error::FetchError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

pub const DEFAULT_MAX_PAGES: usize = 20;

/// When to stop following `next` cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Follow cursors until none is left, or until a page repeats the cursor
    /// of the page before it.
    CycleSafe,
    /// Fetch at most `max_pages` pages; a remaining cursor marks the result
    /// as truncated.
    Capped { max_pages: usize },
}

impl Default for Termination {
    fn default() -> Self {
        Termination::Capped {
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

/// One page of the cursor-pagination envelope.
#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default, deserialize_with = "null_as_empty")]
    results: Vec<Entity>,
    #[serde(default)]
    next: Option<String>,
    #[serde(default)]
    previous: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

pub(super) fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<Entity>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<Entity>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Every page's `results`, concatenated in fetch order. The remaining fields
/// are those of the first page.
#[derive(Debug, Clone, Serialize)]
pub struct Aggregated {
    pub results: Vec<Entity>,
    pub next: Option<String>,
    pub previous: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(rename = "_pagesFetched")]
    pub pages_fetched: usize,
    #[serde(rename = "_truncated")]
    pub truncated: bool,
}

impl Aggregated {
    fn from_first(page: ListPage) -> Self {
        Self {
            results: page.results,
            next: page.next,
            previous: page.previous,
            extra: page.extra,
            pages_fetched: 1,
            truncated: false,
        }
    }

    pub fn stats(&self) -> PageStats {
        PageStats {
            pages_fetched: self.pages_fetched,
            truncated: self.truncated,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageStats {
    #[serde(rename = "_pagesFetched")]
    pub pages_fetched: usize,
    #[serde(rename = "_truncated")]
    pub truncated: bool,
}

/// Walks a `next`-cursor chain and aggregates every page.
pub struct Paginator<'a> {
    source: &'a dyn JsonSource,
    proxy: &'a ProxyRewrite,
    termination: Termination,
}

impl<'a> Paginator<'a> {
    pub fn new(source: &'a dyn JsonSource, proxy: &'a ProxyRewrite, termination: Termination) -> Self {
        Self {
            source,
            proxy,
            termination,
        }
    }

    /// Fetch `first_target` and every page after it. Pages are requested one
    /// at a time since each cursor is only known once the previous page is
    /// parsed. Any failing page fails the whole aggregation.
    pub async fn fetch(&self, first_target: &str) -> Result<Aggregated, FetchError> {
        let first_url = self.proxy.apply(first_target);
        let first = self.fetch_page(&first_url).await?;
        let mut cursor = self.proxy.apply_cursor(first.next.as_deref());
        let mut aggregated = Aggregated::from_first(first);
        debug!(url = %first_url, results = aggregated.results.len(), "fetched page 1");

        loop {
            let Some(url) = cursor.as_deref() else {
                break;
            };
            if let Termination::Capped { max_pages } = self.termination {
                if aggregated.pages_fetched >= max_pages.max(1) {
                    break;
                }
            }

            let page = self.fetch_page(url).await?;
            aggregated.pages_fetched += 1;
            debug!(
                url = %url,
                page = aggregated.pages_fetched,
                results = page.results.len(),
                "fetched page"
            );

            let next = self.proxy.apply_cursor(page.next.as_deref());
            aggregated.results.extend(page.results);

            if self.termination == Termination::CycleSafe && next.is_some() && next == cursor {
                debug!(cursor = ?next, "cursor repeated, stopping");
                break;
            }
            cursor = next;
        }

        aggregated.truncated =
            matches!(self.termination, Termination::Capped { .. }) && cursor.is_some();
        Ok(aggregated)
    }

    async fn fetch_page(&self, url: &str) -> Result<ListPage, FetchError> {
        let value = self.source.get_json(url).await?;
        serde_json::from_value(value).map_err(|source| FetchError::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{list_page, MockSource};
    use serde_json::json;

    const FIRST: &str = "https://api.test/users/1/followers/";

    fn page_url(n: usize) -> String {
        format!("{}?page={}", FIRST, n)
    }

    /// `total` pages of `per_page` entities each, chained by `next`.
    fn chained_source(total: usize, per_page: u64) -> MockSource {
        let mut source = MockSource::new();
        for n in 1..=total {
            let url = if n == 1 { FIRST.to_string() } else { page_url(n) };
            let next = (n < total).then(|| page_url(n + 1));
            let first_id = (n as u64 - 1) * per_page + 1;
            let ids: Vec<u64> = (first_id..first_id + per_page).collect();
            source = source.with_page(&url, list_page(&ids, next.as_deref()));
        }
        source
    }

    fn ids(aggregated: &Aggregated) -> Vec<u64> {
        aggregated.results.iter().map(|e| e.id).collect()
    }

    #[tokio::test]
    async fn test_concatenates_pages_in_order() {
        let source = chained_source(3, 2);
        let proxy = ProxyRewrite::direct();
        let paginator = Paginator::new(&source, &proxy, Termination::CycleSafe);

        let aggregated = paginator.fetch(FIRST).await.unwrap();
        assert_eq!(ids(&aggregated), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(aggregated.pages_fetched, 3);
        assert!(!aggregated.truncated);
        assert_eq!(source.calls(), vec![FIRST.to_string(), page_url(2), page_url(3)]);
    }

    #[tokio::test]
    async fn test_capped_concatenation_without_truncation() {
        let source = chained_source(3, 2);
        let proxy = ProxyRewrite::direct();
        let paginator = Paginator::new(&source, &proxy, Termination::Capped { max_pages: 10 });

        let aggregated = paginator.fetch(FIRST).await.unwrap();
        assert_eq!(aggregated.results.len(), 6);
        assert_eq!(aggregated.pages_fetched, 3);
        assert!(!aggregated.truncated);
    }

    #[tokio::test]
    async fn test_repeated_cursor_terminates() {
        // Page 2 echoes page 1's cursor forever.
        let source = MockSource::new()
            .with_page(FIRST, list_page(&[1, 2], Some(&page_url(2))))
            .with_page(&page_url(2), list_page(&[3, 4], Some(&page_url(2))));
        let proxy = ProxyRewrite::direct();
        let paginator = Paginator::new(&source, &proxy, Termination::CycleSafe);

        let aggregated = paginator.fetch(FIRST).await.unwrap();
        assert_eq!(aggregated.pages_fetched, 2);
        assert_eq!(ids(&aggregated), vec![1, 2, 3, 4]);
        assert!(!aggregated.truncated);
        assert_eq!(source.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_cap_truncates() {
        let source = chained_source(15, 3);
        let proxy = ProxyRewrite::direct();
        let paginator = Paginator::new(&source, &proxy, Termination::Capped { max_pages: 10 });

        let aggregated = paginator.fetch(FIRST).await.unwrap();
        assert_eq!(aggregated.pages_fetched, 10);
        assert_eq!(aggregated.results.len(), 30);
        assert_eq!(aggregated.results.last().map(|e| e.id), Some(30));
        assert!(aggregated.truncated);
        assert_eq!(source.calls().len(), 10);
    }

    #[tokio::test]
    async fn test_cap_of_zero_still_fetches_first_page() {
        let source = chained_source(2, 1);
        let proxy = ProxyRewrite::direct();
        let paginator = Paginator::new(&source, &proxy, Termination::Capped { max_pages: 0 });

        let aggregated = paginator.fetch(FIRST).await.unwrap();
        assert_eq!(aggregated.pages_fetched, 1);
        assert!(aggregated.truncated);
    }

    #[tokio::test]
    async fn test_failing_page_aborts_aggregation() {
        let source = MockSource::new()
            .with_page(FIRST, list_page(&[1], Some(&page_url(2))))
            .with_status(&page_url(2), 502);
        let proxy = ProxyRewrite::direct();
        let paginator = Paginator::new(&source, &proxy, Termination::CycleSafe);

        let err = paginator.fetch(FIRST).await.unwrap_err();
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.url(), Some(page_url(2).as_str()));
    }

    #[tokio::test]
    async fn test_malformed_page_is_decode_error() {
        let source = MockSource::new().with_page(FIRST, json!({ "results": [{ "nickname": "no id" }] }));
        let proxy = ProxyRewrite::direct();
        let paginator = Paginator::new(&source, &proxy, Termination::CycleSafe);

        let err = paginator.fetch(FIRST).await.unwrap_err();
        assert!(matches!(err, FetchError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_proxy_applies_to_cursors() {
        let proxy = ProxyRewrite::new(Some("https://proxy.test/?".to_string()));
        let source = MockSource::new()
            .with_page(&proxy.apply(FIRST), list_page(&[1], Some(&page_url(2))))
            .with_page(&proxy.apply(&page_url(2)), list_page(&[2], None));
        let paginator = Paginator::new(&source, &proxy, Termination::CycleSafe);

        let aggregated = paginator.fetch(FIRST).await.unwrap();
        assert_eq!(ids(&aggregated), vec![1, 2]);
        assert!(source
            .calls()
            .iter()
            .all(|url| url.starts_with("https://proxy.test/?https%3A%2F%2F")));
    }

    #[tokio::test]
    async fn test_first_page_fields_kept_and_empty_next_ends() {
        let source = MockSource::new().with_page(
            FIRST,
            json!({
                "status_code": 200,
                "detail": "Success",
                "next": "",
                "previous": "",
                "results": null
            }),
        );
        let proxy = ProxyRewrite::direct();
        let paginator = Paginator::new(&source, &proxy, Termination::CycleSafe);

        let aggregated = paginator.fetch(FIRST).await.unwrap();
        assert!(aggregated.results.is_empty());
        assert_eq!(aggregated.pages_fetched, 1);
        assert_eq!(aggregated.extra.get("status_code"), Some(&json!(200)));

        let dumped = serde_json::to_value(&aggregated).unwrap();
        assert_eq!(dumped["_pagesFetched"], json!(1));
        assert_eq!(dumped["_truncated"], json!(false));
        assert_eq!(dumped["detail"], json!("Success"));
    }
}
