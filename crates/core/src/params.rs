//! Parameter extraction.
//!
//! Parameters are recovered in two tiers. The structured tier decomposes the
//! parsed query string and keeps only plain string values. The fallback tier
//! splits the raw input on its first `?` and parses `key=value` pairs by hand,
//! for producers whose links the URL parser cannot decompose. The first tier
//! that yields anything wins; results from the two tiers are never mixed.

use crate::normalize::NormalizedLink;
use percent_encoding::percent_decode_str;
use serde::Serialize;
use std::collections::BTreeMap;

/// Parameter name to value, as forwarded to screens.
pub type ParameterMap = BTreeMap<String, String>;

/// A value as the structured query parser sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    Text(String),
    /// Repeated keys or `key[]=` entries.
    List(Vec<String>),
    /// `key[sub]=` entries.
    Nested(BTreeMap<String, String>),
}

impl QueryValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    fn push(&mut self, value: String) {
        match self {
            Self::Text(first) => *self = Self::List(vec![std::mem::take(first), value]),
            Self::List(values) => values.push(value),
            // Mixing `key[sub]=` and `key=` has no sensible shape; keep the nested one.
            Self::Nested(_) => {}
        }
    }
}

/// Which tier produced the parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "params", rename_all = "kebab-case")]
pub enum ParameterSource {
    Structured(ParameterMap),
    Fallback(ParameterMap),
    Empty,
}

impl ParameterSource {
    pub fn map(&self) -> Option<&ParameterMap> {
        match self {
            Self::Structured(map) | Self::Fallback(map) => Some(map),
            Self::Empty => None,
        }
    }

    pub fn into_map(self) -> ParameterMap {
        match self {
            Self::Structured(map) | Self::Fallback(map) => map,
            Self::Empty => ParameterMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map().map_or(true, BTreeMap::is_empty)
    }
}

/// Extract parameters from a normalised link. Never fails; a link with no
/// recoverable parameters yields [`ParameterSource::Empty`].
///
/// Once the parser has decomposed the query the structured tier owns the
/// result, even if every value was list or nested shaped and got dropped.
pub fn extract(link: &NormalizedLink) -> ParameterSource {
    let shapes = structured_params(link);
    if !shapes.is_empty() {
        return ParameterSource::Structured(text_params(shapes));
    }

    let fallback = fallback_params(&link.raw_url);
    if !fallback.is_empty() {
        tracing::debug!("recovered {} parameter(s) from raw link", fallback.len());
        return ParameterSource::Fallback(fallback);
    }

    ParameterSource::Empty
}

/// Keep plain string values only.
fn text_params(shapes: BTreeMap<String, QueryValue>) -> ParameterMap {
    shapes
        .into_iter()
        .filter_map(|(key, value)| match value {
            QueryValue::Text(text) => Some((key, text)),
            other => {
                tracing::debug!("dropping non-string query parameter {}: {:?}", key, other);
                None
            }
        })
        .collect()
}

/// Decompose the parsed query string into value shapes.
pub fn structured_params(link: &NormalizedLink) -> BTreeMap<String, QueryValue> {
    let mut values: BTreeMap<String, QueryValue> = BTreeMap::new();
    let Some(query) = link.raw_query.as_deref() else {
        return values;
    };

    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let value = value.into_owned();

        if let Some(base) = key.strip_suffix("[]") {
            if base.is_empty() {
                continue;
            }
            match values.get_mut(base) {
                Some(QueryValue::List(list)) => list.push(value),
                Some(existing) => existing.push(value),
                None => {
                    values.insert(base.to_string(), QueryValue::List(vec![value]));
                }
            }
            continue;
        }

        if let Some((base, sub)) = split_bracket_key(&key) {
            let entry = values
                .entry(base.to_string())
                .or_insert_with(|| QueryValue::Nested(BTreeMap::new()));
            if let QueryValue::Nested(map) = entry {
                map.insert(sub.to_string(), value);
            }
            continue;
        }

        if key.is_empty() {
            continue;
        }

        match values.get_mut(&*key) {
            Some(existing) => existing.push(value),
            None => {
                values.insert(key.into_owned(), QueryValue::Text(value));
            }
        }
    }

    values
}

/// `base[sub]` -> `(base, sub)`.
fn split_bracket_key(key: &str) -> Option<(&str, &str)> {
    let inner = key.strip_suffix(']')?;
    let (base, sub) = inner.split_once('[')?;
    if base.is_empty() || sub.is_empty() || sub.contains(['[', ']']) {
        return None;
    }
    Some((base, sub))
}

/// Parse everything after the first `?` of the raw input as `key=value`
/// pairs joined by `&`.
///
/// Pairs are decoded like form data (`+` is a space, then `%XX`); a pair
/// that does not decode to UTF-8 is skipped rather than failing the whole
/// map. A bare key maps to an empty
/// value. Later duplicates overwrite earlier ones.
pub fn fallback_params(raw_url: &str) -> ParameterMap {
    let mut params = ParameterMap::new();
    let Some((_, query)) = raw_url.split_once('?') else {
        return params;
    };
    let query = query.split_once('#').map_or(query, |(query, _)| query);

    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));

        let (key, value) = (key.replace('+', " "), value.replace('+', " "));
        let decoded = percent_decode_str(&key)
            .decode_utf8()
            .and_then(|key| percent_decode_str(&value).decode_utf8().map(|value| (key, value)));

        match decoded {
            Ok((key, value)) if !key.is_empty() => {
                params.insert(key.into_owned(), value.into_owned());
            }
            Ok(_) => {}
            Err(_) => tracing::debug!("skipping undecodable query pair: {:?}", pair),
        }
    }

    params
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;

    fn map(entries: &[(&str, &str)]) -> ParameterMap {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn structured_tier_wins_when_it_yields_values() {
        let link = normalize("https://domain.com/vaccine-registration?eventId=E1&studentId=S%201");
        let source = extract(&link);
        assert_eq!(
            source,
            ParameterSource::Structured(map(&[("eventId", "E1"), ("studentId", "S 1")]))
        );
    }

    #[test]
    fn array_and_nested_values_are_dropped() {
        let link = normalize(
            "schoolmedical://vaccine-registration?eventId=E1&tag=a&tag=b&ids[]=1&filter[year]=2024",
        );

        let shapes = structured_params(&link);
        assert_eq!(shapes["tag"], QueryValue::List(vec!["a".into(), "b".into()]));
        assert_eq!(shapes["ids"], QueryValue::List(vec!["1".into()]));
        assert_eq!(
            shapes["filter"],
            QueryValue::Nested(BTreeMap::from([("year".to_string(), "2024".to_string())]))
        );

        assert_eq!(extract(&link).into_map(), map(&[("eventId", "E1")]));
    }

    #[test]
    fn fallback_tier_used_when_parser_cannot_decompose() {
        // The query sits behind a fragment, so the parser never sees it.
        let link = normalize("schoolmedical://vaccine-registration#open?eventId=E1&parentId=P%2F2");
        assert_eq!(link.raw_query, None);
        assert_eq!(
            extract(&link),
            ParameterSource::Fallback(map(&[("eventId", "E1"), ("parentId", "P/2")]))
        );
    }

    #[test]
    fn fallback_tier_handles_unparseable_links() {
        let link = normalize("vaccine-registration?eventId=E1&flag&=orphan&&studentId=S1#top");
        assert!(!link.is_parsed());
        assert_eq!(
            extract(&link).into_map(),
            map(&[("eventId", "E1"), ("flag", ""), ("studentId", "S1")])
        );
    }

    #[test]
    fn fallback_skips_undecodable_pairs() {
        let params = fallback_params("x?eventId=E1&bad=%FF%FE&studentId=S1");
        assert_eq!(params, map(&[("eventId", "E1"), ("studentId", "S1")]));
    }

    #[test]
    fn both_tiers_agree_on_equivalent_content() {
        let raw = "schoolmedical://vaccine-registration?eventId=E%201&registrationId=R-7&studentId=S1";
        let structured = extract(&normalize(raw)).into_map();
        let fallback = fallback_params(raw);
        assert_eq!(structured, fallback);
    }

    #[test]
    fn repeated_keys_never_reach_the_fallback_tier() {
        let link = normalize("schoolmedical://vaccine-registration?eventId=E1&eventId=E2");
        let source = extract(&link);
        assert_eq!(source, ParameterSource::Structured(ParameterMap::new()));
        assert!(source.is_empty());

        let link = normalize("https://domain.com/vaccine-registration?ids[]=1&filter[year]=2024");
        assert_eq!(extract(&link), ParameterSource::Structured(ParameterMap::new()));
    }

    #[test]
    fn both_tiers_decode_plus_as_space() {
        let raw = "schoolmedical://vaccine-registration?eventId=E+1&studentId=S%2B2";
        let structured = extract(&normalize(raw)).into_map();
        let fallback = fallback_params(raw);
        assert_eq!(structured, map(&[("eventId", "E 1"), ("studentId", "S+2")]));
        assert_eq!(structured, fallback);
    }

    #[test]
    fn no_query_is_empty_not_an_error() {
        let source = extract(&normalize("https://domain.com/vaccine-registration"));
        assert_eq!(source, ParameterSource::Empty);
        assert!(source.is_empty());
        assert!(source.into_map().is_empty());
    }
}
