/// Scheme prefix of the preview references produced by [`crate::decode`].
pub const DATA_URL_SCHEME: &str = "data:";

/// Content digest algorithm recorded on every payload.
pub const HASH_ALGORITHM: &str = "sha256";
