//! URL normalisation.
//!
//! Links reach the app in several incompatible shapes:
//!
//! - custom scheme: `schoolmedical://vaccine-registration?eventId=E1`, where the
//!   logical destination is carried in the host position, or
//!   `schoolmedical:///vaccine-registration` / `schoolmedical:vaccine-registration`
//!   where it is carried in the path
//! - local development: `http://localhost:8081/--/vaccine-registration` and
//!   `exp://192.168.1.5:8081/--/vaccine-registration` from Expo dev servers
//! - production: `https://domain.com/vaccine-registration`
//!
//! [`normalize`] reduces all of them to a [`NormalizedLink`]. It never fails: a
//! string the URL parser rejects still yields a link whose `raw_url` is
//! retained for substring matching downstream.

use crate::constants::{DEFAULT_APP_SCHEME, DEV_HOSTS, DEV_SCHEMES, EXPO_PATH_PREFIX};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use url::{Host, Url};

/// The broad family a link belongs to. Used for diagnostics only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LinkShape {
    /// The app's own custom scheme.
    CustomScheme,
    /// Expo or plain-HTTP links served from a development machine.
    LocalDev,
    /// Web links on the production domain.
    Production,
    /// Parsed as a URL but with a scheme the app does not own.
    Other,
    /// The URL parser rejected the input.
    Unparseable,
}

impl LinkShape {
    fn detect(url: &Url, app_scheme: &str) -> Self {
        let scheme = url.scheme();
        if scheme.eq_ignore_ascii_case(app_scheme) {
            return Self::CustomScheme;
        }
        if DEV_SCHEMES.contains(&scheme) {
            return Self::LocalDev;
        }
        match scheme {
            "https" => Self::Production,
            "http" if is_dev_host(url) => Self::LocalDev,
            "http" => Self::Production,
            _ => Self::Other,
        }
    }
}

fn is_dev_host(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => DEV_HOSTS.contains(&domain),
        Some(Host::Ipv4(ip)) => ip.is_loopback() || ip.is_private(),
        Some(Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// A link reduced to the parts the classifier and extractor look at.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedLink {
    pub path: Option<String>,
    pub host_token: Option<String>,
    pub raw_query: Option<String>,
    /// The input exactly as delivered.
    pub raw_url: String,
    pub shape: LinkShape,
}

impl NormalizedLink {
    /// A link the URL parser could not decompose.
    pub fn unparseable(raw: &str) -> Self {
        Self {
            path: None,
            host_token: None,
            raw_query: None,
            raw_url: raw.to_string(),
            shape: LinkShape::Unparseable,
        }
    }

    pub fn is_parsed(&self) -> bool {
        self.shape != LinkShape::Unparseable
    }
}

/// Normalise a link against the default app scheme.
pub fn normalize(raw: &str) -> NormalizedLink {
    normalize_for_scheme(raw, DEFAULT_APP_SCHEME)
}

/// Normalise a link, recognising `app_scheme` as the app's custom scheme.
pub fn normalize_for_scheme(raw: &str, app_scheme: &str) -> NormalizedLink {
    let url = match Url::parse(raw.trim()) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("unparseable deep link ({}): {:?}", e, raw);
            return NormalizedLink::unparseable(raw);
        }
    };

    let link = NormalizedLink {
        path: normalize_path(url.path()),
        host_token: url
            .host_str()
            .filter(|host| !host.is_empty())
            .map(str::to_string),
        raw_query: url
            .query()
            .filter(|query| !query.is_empty())
            .map(str::to_string),
        raw_url: raw.to_string(),
        shape: LinkShape::detect(&url, app_scheme),
    };

    tracing::debug!(
        "normalised deep link: shape={:?} path={:?} host={:?} query={:?}",
        link.shape,
        link.path,
        link.host_token,
        link.raw_query
    );

    link
}

/// Percent-decodes the path, removes the Expo `/--` prefix and any trailing
/// slash, and guarantees a leading slash. Empty paths become `None`.
fn normalize_path(path: &str) -> Option<String> {
    let decoded = percent_decode_str(path).decode_utf8_lossy();
    let mut path = decoded.trim();

    if let Some(rest) = path.strip_prefix(EXPO_PATH_PREFIX) {
        if rest.is_empty() || rest.starts_with('/') {
            path = rest;
        }
    }

    let path = path.trim_matches('/');
    if path.is_empty() {
        return None;
    }

    Some(format!("/{}", path))
}
