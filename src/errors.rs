use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LirError
{
    #[error("insufficient training data ({points} points): {reason}")]
    InsufficientTrainingData
    {
        points: usize,
        reason: &'static str,
    },

    #[error("training point {index} has a non-finite coordinate")]
    NonFiniteCoordinate
    {
        index: usize,
    },

    #[error("training point {index} could not be located in the partial triangulation")]
    PointLocationFailed
    {
        index: usize,
    },

    #[error("grid for `{variable}`: field `{field}` has {actual} entries, expected {expected}")]
    MalformedGrid
    {
        variable: String,
        field: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("grid for `{variable}` does not share the training coordinates (first difference at vertex {index})")]
    MismatchedGridCoordinates
    {
        variable: String,
        index: usize,
    },

    #[error("malformed query `{record}`: {reason}")]
    MalformedQuery
    {
        record: String,
        reason: String,
    },

    #[error("coefficient tensor of shape ({rows}, _, {channels}) does not fit a triangulation with {vertices} vertices")]
    TensorShapeMismatch
    {
        vertices: usize,
        rows: usize,
        channels: usize,
    },

    #[error("corrupt triangulation cache {path:?}: {reason}")]
    CorruptCacheFile
    {
        path: PathBuf,
        reason: String,
    },

    #[error("unable to read triangulation cache {path:?}")]
    UnreadableCacheFile
    {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to write triangulation cache {path:?}")]
    CacheWriteFailed
    {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization failed: {0}")]
    SerializationFailed(String),

    #[error("deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("LZ4 decompression failed")]
    LZ4DecompressionFailed,

    #[error("k-d tree rejected a coordinate")]
    KdTreeError,
}
