use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::serialization::SerializationFormat;

/// File name of the triangulation cache inside a data root.
pub const CACHE_FILE_NAME: &str = "lir_triangulation.bin";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InterpolationOptions
{
    /// Location of the persisted triangulation.
    pub cache_path: PathBuf,
    /// Encoding used when a cold build writes the cache.
    pub format: SerializationFormat,
    /// Locate query points on the rayon pool.
    pub parallel: bool,
}

impl Default for InterpolationOptions
{
    fn default() -> Self
    {
        Self { cache_path: PathBuf::from(CACHE_FILE_NAME), format: SerializationFormat::default(), parallel: false }
    }
}

impl InterpolationOptions
{
    ///
    /// Options with the cache stored in `root`.
    ///
    pub fn from_data_root(root: impl AsRef<Path>) -> Self
    {
        Self { cache_path: root.as_ref().join(CACHE_FILE_NAME), ..Default::default() }
    }
}

#[test]
fn test_data_root_places_cache()
{
    let options = InterpolationOptions::from_data_root("/data/lir");
    assert_eq!(options.cache_path, Path::new("/data/lir").join(CACHE_FILE_NAME));
    assert_eq!(options.format, SerializationFormat::BincodeLz4);
    assert!(!options.parallel);
}
