use thiserror::Error;

/// Reasons an inbound frame cannot be turned into an [`Envelope`](super::Envelope).
///
/// The codec only checks field presence; cross-field rules are enforced by
/// the reassembly buffer and the connection manager.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The frame is not valid JSON or has the wrong shape.
    #[error("malformed envelope: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The frame has no `type`/`kind` field.
    #[error("envelope has no `type` field")]
    MissingKind,
    /// The `type` field names a kind this client does not know.
    #[error("unknown envelope kind `{0}`")]
    UnknownKind(String),
    /// A field required by the declared kind is absent.
    #[error("`{kind}` envelope is missing required field `{field}`")]
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
    /// Only one of `chunkIndex`/`chunkTotal` is present.
    #[error("envelope carries only one of `chunkIndex` and `chunkTotal`")]
    PartialChunk,
}
