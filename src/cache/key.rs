use sha2::{Digest, Sha256};

/// Stable cache key over an endpoint and its query parameters.
///
/// Parameters are sorted before hashing, so their order at the call site
/// does not matter.
pub fn cache_key(endpoint: &str, params: &[(&str, String)]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(endpoint.as_bytes());
    hasher.update(b"?");
    hasher.update(serialize_params(params).as_bytes());
    to_hex(&hasher.finalize())
}

fn serialize_params(params: &[(&str, String)]) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort();
    sorted
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&")
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
