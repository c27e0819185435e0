//! Minimal hypermedia (HAL) response plumbing.
//!
//! Acknowledgments and read responses carry a `_links` object with at least a
//! `self` link and, where one exists, a reference to the owning digest. The
//! exact link vocabulary is an external formatting contract; this module only
//! provides the building blocks.

use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::collections::BTreeMap;

/// Content type for hypermedia responses.
pub const HAL_MEDIA_TYPE: &str = "application/hal+json";

/// A single hypermedia link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Link {
    pub fn new(href: impl Into<String>) -> Self {
        Link {
            href: href.into(),
            method: None,
            title: None,
        }
    }

    pub fn with_method(mut self, method: &'static str) -> Self {
        self.method = Some(method);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }
}

/// Ordered link relation map, serialized as the `_links` object.
pub type Links = BTreeMap<&'static str, Link>;

/// Responder that serializes its body as JSON with the HAL content type.
pub struct Hal<T>(pub T);

impl<T: Serialize> IntoResponse for Hal<T> {
    fn into_response(self) -> Response {
        (
            [(header::CONTENT_TYPE, HAL_MEDIA_TYPE)],
            axum::Json(self.0),
        )
            .into_response()
    }
}
