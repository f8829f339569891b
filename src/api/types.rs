use crate::error::Result;
use serde::Deserialize;
use serde_json::Value;

/// One page of a list endpoint: `{data, meta?, links?}`.
#[derive(Debug, Default, Deserialize)]
pub struct PageResponse {
    #[serde(default)]
    pub data: Option<Vec<Value>>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
    #[serde(default)]
    pub links: Option<PageLinks>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageMeta {
    #[serde(default)]
    pub current_page: Option<u64>,
    #[serde(default)]
    pub last_page: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageLinks {
    #[serde(default)]
    pub next: Option<String>,
}

impl PageResponse {
    /// Parse a response body. Anything other than a JSON object is treated as
    /// a page without data.
    pub fn parse(body: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(body)?;
        if !value.is_object() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether another page should be requested.
    ///
    /// Pagination metadata wins, then a `next` link, then the full-page guess.
    /// The guess over-fetches by one request when the last page is exactly full.
    pub fn has_more(&self, page_size: usize) -> bool {
        let pages = self
            .meta
            .as_ref()
            .and_then(|meta| meta.current_page.zip(meta.last_page));
        if let Some((current, last)) = pages {
            return current < last;
        }

        let next = self.links.as_ref().and_then(|links| links.next.as_deref());
        if next.is_some_and(|next| !next.is_empty()) {
            return true;
        }

        self.len() == page_size
    }
}

/// Every record of one resource, in page order.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FetchResult {
    pub data: Vec<Value>,
}

impl FetchResult {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(value: Value) -> PageResponse {
        PageResponse::parse(&value.to_string()).unwrap()
    }

    #[test]
    fn test_meta_takes_priority() {
        // A next link is ignored once meta says this is the last page
        let response = page(json!({
            "data": [{"id": 1}],
            "meta": {"current_page": 2, "last_page": 2},
            "links": {"next": "https://api.example.com/x?page=3"}
        }));
        assert!(!response.has_more(1));

        let response = page(json!({
            "data": [{"id": 1}],
            "meta": {"current_page": 1, "last_page": 2}
        }));
        assert!(response.has_more(100));
    }

    #[test]
    fn test_partial_meta_falls_through_to_links() {
        let response = page(json!({
            "data": [{"id": 1}],
            "meta": {"current_page": 1},
            "links": {"next": "https://api.example.com/x?page=2"}
        }));
        assert!(response.has_more(100));
    }

    #[test]
    fn test_null_next_link_falls_back_to_page_size() {
        let response = page(json!({
            "data": [{"id": 1}, {"id": 2}],
            "links": {"next": null}
        }));
        assert!(response.has_more(2));
        assert!(!response.has_more(3));
    }

    #[test]
    fn test_missing_or_non_object_data() {
        assert!(page(json!({"meta": {}})).is_empty());
        assert!(page(json!({"data": null})).is_empty());
        assert!(page(json!([1, 2, 3])).is_empty());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(PageResponse::parse("<html>").is_err());
    }
}
