//! Route definitions for the HTTP API.

pub mod admin;
pub mod health;
pub mod notes;
pub mod ratings;
pub mod share;

use axum::Router;
use loosenotes_core::{Page, PageRequest};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Build the complete router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health::routes())
        .merge(notes::routes())
        .merge(ratings::routes())
        .merge(share::routes())
        .merge(admin::routes())
        .with_state(state)
}

/// `?page=&limit=` query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageParams {
    pub fn request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// A paginated response body.
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub pages: u64,
}

impl<T> From<Page<T>> for PageResponse<T> {
    fn from(page: Page<T>) -> Self {
        let pages = page.pages();
        Self {
            items: page.items,
            total: page.total,
            page: page.page,
            limit: page.limit,
            pages,
        }
    }
}
