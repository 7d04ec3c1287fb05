//! Query string decoding.
//!
//! The decoding follows URI-component rules: `%HH` escapes are decoded,
//! `+` is kept literally, and a malformed escape fails the whole parse.

use indexmap::IndexMap;

use crate::errors::AppError;

/// Decoded query parameters in first-occurrence order. A repeated key keeps
/// its first position but the last value.
pub type QueryParameters = IndexMap<String, String>;

/// Parse the query part of `url` (everything after the first `?`, without
/// any `#fragment`).
///
/// Segments with an empty name are dropped. A segment without `=` yields the
/// name with an empty value.
pub fn parse(url: &str) -> Result<QueryParameters, AppError> {
    let mut params = QueryParameters::new();

    let query = match url.split_once('?') {
        Some((_, rest)) => rest.split_once('#').map_or(rest, |(q, _)| q),
        None => return Ok(params),
    };

    for segment in query.split('&').filter(|s| !s.is_empty()) {
        let (raw_key, raw_value) = segment.split_once('=').unwrap_or((segment, ""));
        if raw_key.is_empty() {
            continue;
        }
        let key = decode_component(raw_key)?;
        let value = decode_component(raw_value)?;
        params.insert(key, value);
    }

    Ok(params)
}

/// Strict percent-decoding of a single key or value.
fn decode_component(raw: &str) -> Result<String, AppError> {
    let bytes = raw.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        if b != b'%' {
            continue;
        }
        let escape = bytes.get(i + 1..i + 3);
        let valid = matches!(escape, Some(h) if h.iter().all(u8::is_ascii_hexdigit));
        if !valid {
            return Err(AppError::Decode(format!("malformed escape at byte {i} in {raw:?}")));
        }
    }
    Ok(urlencoding::decode(raw)?.into_owned())
}
