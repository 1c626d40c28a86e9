//! Opaque-token pagination over ordered listings.
//!
//! A token records the unique attribute of the last item handed out, so a
//! listing can resume after it even when items were appended in between.
//! The token also carries a checksum of the operation it was issued for;
//! presenting it to a different listing is rejected.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{CloudError, CloudResult};

/// Static pagination settings of one listing operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaginationModel {
    pub operation: &'static str,
    pub limit_default: usize,
    pub limit_max: usize,
}

/// Caller-supplied continuation state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    pub next_token: Option<String>,
    pub max_results: Option<usize>,
}

impl PageRequest {
    pub fn first(max_results: Option<usize>) -> Self {
        Self {
            next_token: None,
            max_results,
        }
    }

    pub fn after(next_token: impl Into<String>, max_results: Option<usize>) -> Self {
        Self {
            next_token: Some(next_token.into()),
            max_results,
        }
    }
}

/// One page of results plus the token for the next page, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPayload {
    parameter_checksum: String,
    page_ending: String,
}

#[derive(Debug, Clone, Copy)]
pub struct Paginator {
    model: PaginationModel,
}

impl Paginator {
    pub fn new(model: PaginationModel) -> Self {
        Self { model }
    }

    /// Cut one page out of `items`, keyed by `unique`.
    pub fn paginate<T, F>(
        &self,
        items: Vec<T>,
        request: &PageRequest,
        unique: F,
    ) -> CloudResult<Page<T>>
    where
        F: Fn(&T) -> String,
    {
        let limit = match request.max_results {
            Some(0) => {
                return Err(CloudError::invalid_input(format!(
                    "{}: MaxResults must be at least 1",
                    self.model.operation
                )));
            }
            Some(n) => n.min(self.model.limit_max),
            None => self.model.limit_default,
        };

        let start = match &request.next_token {
            Some(token) => {
                let ending = self.decode(token)?;
                let position = items
                    .iter()
                    .position(|item| unique(item) == ending)
                    .ok_or_else(|| {
                        CloudError::invalid_input(format!(
                            "{}: pagination token refers to an item that no longer exists",
                            self.model.operation
                        ))
                    })?;
                position + 1
            }
            None => 0,
        };

        let total = items.len();
        let page: Vec<T> = items.into_iter().skip(start).take(limit).collect();
        let next_token = if start + page.len() < total {
            page.last().map(|last| self.encode(&unique(last)))
        } else {
            None
        };

        Ok(Page {
            items: page,
            next_token,
        })
    }

    fn checksum(&self) -> String {
        hex::encode(Sha256::digest(self.model.operation.as_bytes()))
    }

    fn encode(&self, page_ending: &str) -> String {
        let payload = TokenPayload {
            parameter_checksum: self.checksum(),
            page_ending: page_ending.to_string(),
        };
        // Serializing two strings cannot fail.
        let json = serde_json::to_vec(&payload).unwrap_or_default();
        STANDARD.encode(json)
    }

    fn decode(&self, token: &str) -> CloudResult<String> {
        let invalid = || {
            CloudError::invalid_input(format!("{}: invalid pagination token", self.model.operation))
        };
        let bytes = STANDARD.decode(token).map_err(|_| invalid())?;
        let payload: TokenPayload = serde_json::from_slice(&bytes).map_err(|_| invalid())?;
        if payload.parameter_checksum != self.checksum() {
            return Err(CloudError::invalid_input(format!(
                "{}: input inconsistent with page token",
                self.model.operation
            )));
        }
        Ok(payload.page_ending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: PaginationModel = PaginationModel {
        operation: "ListThings",
        limit_default: 100,
        limit_max: 1000,
    };

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("thing-{i:03}")).collect()
    }

    fn drain(items: Vec<String>, max: usize) -> Vec<Vec<String>> {
        let paginator = Paginator::new(MODEL);
        let mut pages = Vec::new();
        let mut request = PageRequest::first(Some(max));
        loop {
            let page = paginator
                .paginate(items.clone(), &request, |s| s.clone())
                .unwrap();
            pages.push(page.items);
            match page.next_token {
                Some(token) => request = PageRequest::after(token, Some(max)),
                None => break,
            }
        }
        pages
    }

    #[test]
    fn pages_cover_every_item_once() {
        let items = names(250);
        let pages = drain(items.clone(), 100);
        assert_eq!(pages.iter().map(Vec::len).collect::<Vec<_>>(), vec![100, 100, 50]);
        assert_eq!(pages.concat(), items);
    }

    #[test]
    fn exact_multiple_has_no_trailing_token() {
        let pages = drain(names(200), 100);
        assert_eq!(pages.len(), 2);
    }

    #[test]
    fn empty_listing_yields_empty_page() {
        let page = Paginator::new(MODEL)
            .paginate(Vec::<String>::new(), &PageRequest::default(), |s| s.clone())
            .unwrap();
        assert!(page.items.is_empty());
        assert!(page.next_token.is_none());
    }

    #[test]
    fn resumes_after_appends() {
        let paginator = Paginator::new(MODEL);
        let mut items = names(3);
        let first = paginator
            .paginate(items.clone(), &PageRequest::first(Some(2)), |s| s.clone())
            .unwrap();
        items.push("thing-late".to_string());

        let token = first.next_token.unwrap();
        let second = paginator
            .paginate(items, &PageRequest::after(token, Some(2)), |s| s.clone())
            .unwrap();
        assert_eq!(second.items, vec!["thing-002", "thing-late"]);
        assert!(second.next_token.is_none());
    }

    #[test]
    fn default_and_max_limits() {
        let paginator = Paginator::new(MODEL);
        let page = paginator
            .paginate(names(150), &PageRequest::default(), |s| s.clone())
            .unwrap();
        assert_eq!(page.items.len(), 100);

        let page = paginator
            .paginate(names(1500), &PageRequest::first(Some(5000)), |s| s.clone())
            .unwrap();
        assert_eq!(page.items.len(), 1000);

        assert!(paginator
            .paginate(names(1), &PageRequest::first(Some(0)), |s| s.clone())
            .is_err());
    }

    #[test]
    fn foreign_or_garbage_token_rejected() {
        let other = Paginator::new(PaginationModel {
            operation: "ListOthers",
            ..MODEL
        });
        let token = other
            .paginate(names(5), &PageRequest::first(Some(1)), |s| s.clone())
            .unwrap()
            .next_token
            .unwrap();

        let paginator = Paginator::new(MODEL);
        for bad in [token.as_str(), "not base64!", "e30="] {
            let err = paginator
                .paginate(names(5), &PageRequest::after(bad, None), |s| s.clone())
                .unwrap_err();
            assert!(matches!(err, CloudError::InvalidInput(_)), "{bad}");
        }
    }

    #[test]
    fn token_for_removed_item_rejected() {
        let paginator = Paginator::new(MODEL);
        let token = paginator
            .paginate(names(3), &PageRequest::first(Some(1)), |s| s.clone())
            .unwrap()
            .next_token
            .unwrap();
        let remaining: Vec<String> = names(3).into_iter().skip(1).collect();
        assert!(paginator
            .paginate(remaining, &PageRequest::after(token, None), |s| s.clone())
            .is_err());
    }
}
