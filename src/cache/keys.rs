//! Cache key construction.
//!
//! List payloads are stored under `{prefix}:{region_code}:{query_hash}` where
//! `query_hash` is the first eight hex characters of the MD5 digest of the
//! re-encoded query string.

use std::fmt;

use md5::{Digest, Md5};
use url::form_urlencoded;

use crate::domain::regions::Region;

/// Region segment used when a request carries no resolved region.
pub const GLOBAL_REGION: &str = "global";

/// Key holding the serialized list of active regions.
pub const REGIONS_ALL: &str = "regions:all";

const QUERY_HASH_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Build the cache key for one list request.
pub fn build_key(prefix: &str, region: Option<&Region>, query: &str) -> CacheKey {
    CacheKey(format!(
        "{prefix}:{}:{}",
        region_code(region),
        hash_query(query)
    ))
}

/// The region segment of a key: the region's code, or `global`.
pub fn region_code(region: Option<&Region>) -> &str {
    region.map_or(GLOBAL_REGION, |region| region.code.as_str())
}

/// Re-serialize `query` the way a Django `QueryDict` does.
///
/// Names keep their first-appearance order and repeated names are grouped, so
/// `a=1&b=2&a=3` encodes as `a=1&a=3&b=2`. Escaping follows Python's
/// `quote_plus`: `~` stays literal and `*` becomes `%2A`.
pub fn encode_query(query: &str) -> String {
    let mut grouped: Vec<(String, Vec<String>)> = Vec::new();
    for (name, value) in form_urlencoded::parse(query.as_bytes()) {
        match grouped.iter_mut().find(|(seen, _)| *seen == name) {
            Some((_, values)) => values.push(value.into_owned()),
            None => grouped.push((name.into_owned(), vec![value.into_owned()])),
        }
    }

    let mut encoded = String::with_capacity(query.len());
    for (name, values) in &grouped {
        for value in values {
            if !encoded.is_empty() {
                encoded.push('&');
            }
            encoded.push_str(&quote_plus(name));
            encoded.push('=');
            encoded.push_str(&quote_plus(value));
        }
    }
    encoded
}

fn quote_plus(input: &str) -> String {
    form_urlencoded::byte_serialize(input.as_bytes())
        .collect::<String>()
        .replace('*', "%2A")
        .replace("%7E", "~")
}

pub fn hash_query(query: &str) -> String {
    let digest = Md5::digest(encode_query(query).as_bytes());
    let mut encoded = hex::encode(digest);
    encoded.truncate(QUERY_HASH_LEN);
    encoded
}

/// Short type name of a view marker, e.g. `ProfessionalListView`.
pub fn view_name<V: ?Sized>() -> &'static str {
    let full = std::any::type_name::<V>();
    full.rsplit("::").next().unwrap_or(full)
}

/// Key for a cached region lookup by code.
pub fn region_lookup_key(code: &str) -> String {
    format!("region:code:{code}")
}

pub fn featured_categories_key(region: Option<&Region>) -> String {
    format!("featured_categories:{}", region_code(region))
}
