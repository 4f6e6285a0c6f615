//! Service route binding and path composition.
//!
//! # Responsibilities
//! - Hold the immutable (service, upstream, base path, external prefix) tuple
//! - Strip the external prefix from inbound paths on segment boundaries
//! - Compose the upstream URI from the remainder path
//! - List the axum patterns that serve the prefix
//!
//! # Design Decisions
//! - Prefix stripping is case-sensitive and segment-aware
//!   (`/api/v1/products` does not cover `/api/v1/productsX`)
//! - The catch-all pattern needs a non-empty tail, so the prefix with a
//!   trailing `/` gets its own pattern
//! - The query string travels with the remainder
//! - Base paths are normalized to a leading `/` and no trailing `/`

use axum::http::Uri;

/// Immutable binding of one service to its upstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRoute {
    service_name: String,
    upstream_target: String,
    upstream_base_path: String,
    external_prefix: String,
}

impl ServiceRoute {
    /// Build a route, normalizing the target, base path and prefix.
    pub fn new(
        service_name: impl Into<String>,
        upstream_target: impl Into<String>,
        upstream_base_path: impl AsRef<str>,
        external_prefix: impl AsRef<str>,
    ) -> Self {
        let upstream_target = upstream_target.into().trim().trim_end_matches('/').to_string();
        Self {
            service_name: service_name.into(),
            upstream_target,
            upstream_base_path: normalize_path(upstream_base_path.as_ref()),
            external_prefix: normalize_path(external_prefix.as_ref()),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn upstream_target(&self) -> &str {
        &self.upstream_target
    }

    pub fn upstream_base_path(&self) -> &str {
        &self.upstream_base_path
    }

    pub fn external_prefix(&self) -> &str {
        &self.external_prefix
    }

    /// Remainder of `path` after the external prefix; empty becomes `/`.
    pub fn remainder<'a>(&self, path: &'a str) -> Option<&'a str> {
        self.strip_prefix(path)
            .map(|rest| if rest.is_empty() { "/" } else { rest })
    }

    /// Upstream path and query for an inbound path and query.
    ///
    /// A bare `/` remainder maps onto the base path itself, so
    /// `/api/v1/products` reaches `/products` rather than `/products/`.
    pub fn upstream_path_and_query(&self, path: &str, query: Option<&str>) -> Option<String> {
        let remainder = self.remainder(path)?;
        let mut composed = if remainder == "/" && !self.upstream_base_path.is_empty() {
            self.upstream_base_path.clone()
        } else {
            format!("{}{}", self.upstream_base_path, remainder)
        };
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            composed.push('?');
            composed.push_str(query);
        }
        Some(composed)
    }

    /// Absolute upstream URI for an inbound URI.
    pub fn upstream_uri(&self, inbound: &Uri) -> Option<Result<Uri, axum::http::uri::InvalidUri>> {
        let path_and_query = self.upstream_path_and_query(inbound.path(), inbound.query())?;
        Some(format!("{}{}", self.upstream_target, path_and_query).parse())
    }

    /// Axum route patterns serving this prefix: the bare prefix, the prefix
    /// with a trailing `/`, and everything below it.
    pub fn route_patterns(&self) -> Vec<String> {
        if self.external_prefix.is_empty() {
            return vec!["/".to_string(), "/{*rest}".to_string()];
        }
        vec![
            self.external_prefix.clone(),
            format!("{}/", self.external_prefix),
            format!("{}/{{*rest}}", self.external_prefix),
        ]
    }

    fn strip_prefix<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.external_prefix.as_str())?;
        if rest.is_empty() || rest.starts_with('/') {
            Some(rest)
        } else {
            None
        }
    }
}

/// Leading `/`, no trailing `/`; the root path normalizes to empty.
fn normalize_path(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}
