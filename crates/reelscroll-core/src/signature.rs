//! Request signatures: the identity shared by caching and deduplication.
//!
//! A signature is the operation name plus a truncated SHA-256 over the
//! canonical JSON of its parameters. Parameters are kept in a `BTreeMap`
//! so insertion order never matters, and ID sets are sorted.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;

use crate::defaults::SIGNATURE_HASH_LEN;

/// Cache/dedup key for one logical request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestSignature(String);

impl RequestSignature {
    /// Start building a signature for `operation`.
    pub fn builder(operation: &str) -> SignatureBuilder {
        SignatureBuilder {
            operation: operation.to_string(),
            params: BTreeMap::new(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Operation name the signature was built for.
    pub fn operation(&self) -> &str {
        self.0.split(':').next().unwrap_or_default()
    }
}

impl fmt::Display for RequestSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Builder for [`RequestSignature`].
#[derive(Debug, Clone)]
pub struct SignatureBuilder {
    operation: String,
    params: BTreeMap<String, Value>,
}

impl SignatureBuilder {
    /// Add a parameter. Values that fail to serialize are recorded as null.
    pub fn param(mut self, key: &str, value: impl Serialize) -> Self {
        let value = serde_json::to_value(value).unwrap_or(Value::Null);
        self.params.insert(key.to_string(), value);
        self
    }

    /// Add a search term, normalized (trimmed, lowercased).
    pub fn term(self, key: &str, term: &str) -> Self {
        let normalized = term.trim().to_lowercase();
        self.param(key, normalized)
    }

    /// Add an order-independent ID set.
    pub fn id_set<I, S>(self, key: &str, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut sorted: Vec<String> = ids.into_iter().map(Into::into).collect();
        sorted.sort();
        sorted.dedup();
        self.param(key, sorted)
    }

    pub fn build(self) -> RequestSignature {
        let mut hasher = Sha256::new();
        hasher.update(self.operation.as_bytes());
        // Value's map type is ordered, so the encoding is canonical.
        let canonical = serde_json::to_string(&self.params).unwrap_or_default();
        hasher.update(canonical.as_bytes());
        let hash = hex::encode(hasher.finalize());
        RequestSignature(format!(
            "{}:{}",
            self.operation,
            &hash[..SIGNATURE_HASH_LEN]
        ))
    }
}
