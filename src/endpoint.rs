use reqwest::Url;

use crate::{ApiClientError, Query, Result};

/// Strips trailing slashes from a base URL.
pub(crate) fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_owned()
}

/// Resolves `endpoint` against `base_url` and appends `query`.
///
/// Exactly one `/` separates base and endpoint whatever slashes either side
/// carries. Null query values are skipped; the rest are form-encoded in
/// insertion order.
pub fn build_url(base_url: &str, endpoint: &str, query: &Query) -> Result<Url> {
    let base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    let joined = format!("{base}/{endpoint}");

    let mut url = Url::parse(&joined).map_err(|err| ApiClientError::InvalidUrl {
        url: joined.clone(),
        reason: err.to_string(),
    })?;
    if url.cannot_be_a_base() {
        return Err(ApiClientError::InvalidUrl {
            url: joined,
            reason: "url is not hierarchical".to_owned(),
        });
    }

    if !query.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in query.present() {
            pairs.append_pair(key, &value.to_string());
        }
    }

    Ok(url)
}
