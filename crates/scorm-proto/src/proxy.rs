// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Same-origin proxy path layout: `/scorm-proxy/{ticket}/{packageId}/{subpath...}`.
//!
//! Sub-resources requested by the package (scripts, styles, media) resolve
//! relative to the launch URL and therefore inherit the ticket segment, so no
//! extra headers or cross-origin storage are needed.

use crate::{PackageId, ViewerTicket};
use thiserror::Error;
use url::Url;

/// First path segment of every proxied content request.
pub const PROXY_PREFIX: &str = "scorm-proxy";

/// Reasons a proxy URL or proxy route cannot be built.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProxyUrlError {
    /// Origin has no tuple form (e.g. `file:` or `data:`).
    #[error("origin {0:?} is opaque")]
    OpaqueOrigin(String),
    /// Ticket empty or containing characters outside the URL-unreserved set.
    #[error("viewer ticket is malformed")]
    InvalidTicket,
    /// Package id empty or containing reserved characters.
    #[error("package id {0:?} is malformed")]
    InvalidPackageId(String),
    /// Launch URL is empty after trimming.
    #[error("package has no launch url")]
    EmptyLaunchUrl,
    /// Launch URL carries its own scheme; content must stay same-origin.
    #[error("launch url {0:?} is absolute")]
    AbsoluteLaunchUrl(String),
    /// Launch URL or subpath tries to leave the package root.
    #[error("path {0:?} escapes the package root")]
    Traversal(String),
    /// Composed string failed to parse.
    #[error("composed proxy url is invalid: {0}")]
    Parse(#[from] url::ParseError),
}

/// Build the proxied launch URL `{origin}/scorm-proxy/{ticket}/{packageId}/{launchUrl}`.
///
/// Only the scheme/host/port of `origin` are used. The launch URL keeps its
/// query string and fragment.
pub fn proxy_url(
    origin: &Url,
    ticket: &ViewerTicket,
    package_id: &PackageId,
    launch_url: &str,
) -> Result<Url, ProxyUrlError> {
    let origin = origin.origin();
    if !origin.is_tuple() {
        return Err(ProxyUrlError::OpaqueOrigin(origin.ascii_serialization()));
    }
    validate_token(ticket.expose()).map_err(|()| ProxyUrlError::InvalidTicket)?;
    validate_token(package_id.as_str())
        .map_err(|()| ProxyUrlError::InvalidPackageId(package_id.to_string()))?;
    let launch = normalize_launch_url(launch_url)?;
    let composed = format!(
        "{}/{}/{}/{}/{}",
        origin.ascii_serialization(),
        PROXY_PREFIX,
        ticket.expose(),
        package_id.as_str(),
        launch
    );
    Ok(Url::parse(&composed)?)
}

/// Strip leading slashes and reject anything that would leave the package root.
fn normalize_launch_url(launch_url: &str) -> Result<&str, ProxyUrlError> {
    let trimmed = launch_url.trim().trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(ProxyUrlError::EmptyLaunchUrl);
    }
    let path_end = trimmed.find(['?', '#']).unwrap_or(trimmed.len());
    let path = &trimmed[..path_end];
    if path.contains("://") || path.starts_with("//") {
        return Err(ProxyUrlError::AbsoluteLaunchUrl(launch_url.to_string()));
    }
    check_segments(path.split('/')).map_err(|()| ProxyUrlError::Traversal(launch_url.into()))?;
    Ok(trimmed)
}

/// Validated, decoded pieces of an incoming proxy request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoute {
    ticket: ViewerTicket,
    package_id: PackageId,
    segments: Vec<String>,
}

impl ProxyRoute {
    /// Validate the three captured path parts of `/scorm-proxy/{ticket}/{id}/{*path}`.
    pub fn new(ticket: &str, package_id: &str, subpath: &str) -> Result<Self, ProxyUrlError> {
        validate_token(ticket).map_err(|()| ProxyUrlError::InvalidTicket)?;
        validate_token(package_id)
            .map_err(|()| ProxyUrlError::InvalidPackageId(package_id.to_string()))?;
        let trimmed = subpath.trim_start_matches('/');
        if trimmed.is_empty() {
            return Err(ProxyUrlError::EmptyLaunchUrl);
        }
        check_segments(trimmed.split('/'))
            .map_err(|()| ProxyUrlError::Traversal(subpath.to_string()))?;
        let segments = trimmed
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Self {
            ticket: ViewerTicket::new(ticket),
            package_id: PackageId::new(package_id),
            segments,
        })
    }

    /// Ticket carried in the path.
    pub fn ticket(&self) -> &ViewerTicket {
        &self.ticket
    }

    /// Package the request targets.
    pub fn package_id(&self) -> &PackageId {
        &self.package_id
    }

    /// Decoded subpath segments inside the package.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Rewrite onto package storage: `{base}/scorm/content/{packageId}/{subpath}`.
    ///
    /// Segments are re-encoded by `url`, so decoded input cannot smuggle
    /// separators.
    pub fn upstream_url(&self, base: &Url) -> Result<Url, ProxyUrlError> {
        let mut url = base.clone();
        {
            let mut path = url
                .path_segments_mut()
                .map_err(|()| ProxyUrlError::OpaqueOrigin(base.to_string()))?;
            path.pop_if_empty()
                .extend(["scorm", "content", self.package_id.as_str()])
                .extend(self.segments.iter());
        }
        Ok(url)
    }
}

/// Tickets and package ids must be non-empty URL-unreserved strings.
fn validate_token(token: &str) -> Result<(), ()> {
    let ok = !token.is_empty()
        && token != "."
        && token != ".."
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.' | b'~'));
    if ok {
        Ok(())
    } else {
        Err(())
    }
}

fn check_segments<'a>(mut segments: impl Iterator<Item = &'a str>) -> Result<(), ()> {
    let bad = segments.any(|seg| {
        let lowered = seg.to_ascii_lowercase();
        seg == ".."
            || seg == "."
            || seg.contains('\\')
            || lowered.contains("%2e%2e")
            || lowered.contains("%2f")
            || lowered.contains("%5c")
    });
    if bad {
        Err(())
    } else {
        Ok(())
    }
}
