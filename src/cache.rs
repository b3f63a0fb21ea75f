//! Persisted triangulation of the training grid.
//!
//! A present cache file is trusted: it is decoded and checked for structural integrity, but
//! never compared against the current training points. Only a missing file triggers a build.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::errors::LirError;
use crate::geometry::predicates::Point3;
use crate::options::InterpolationOptions;
use crate::serialization::SerializationFormat;
use crate::triangulation::Triangulation;

/// Outcome of reading the cache file.
#[derive(Debug)]
pub enum CacheLookup
{
    /// No file at the cache path.
    Absent,
    /// A file exists but could not be read or decoded.
    Corrupt(LirError),
    Present(Triangulation),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TriangulationCache
{
    path: PathBuf,
    format: SerializationFormat,
}

impl TriangulationCache
{
    pub fn new(path: impl Into<PathBuf>) -> Self
    {
        Self { path: path.into(), format: SerializationFormat::default() }
    }

    pub fn with_format(mut self, format: SerializationFormat) -> Self
    {
        self.format = format;
        self
    }

    pub fn from_options(options: &InterpolationOptions) -> Self
    {
        Self::new(&options.cache_path).with_format(options.format)
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }

    pub fn lookup(&self) -> CacheLookup
    {
        let bytes = match fs::read(&self.path)
        {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return CacheLookup::Absent,
            Err(source) => return CacheLookup::Corrupt(LirError::UnreadableCacheFile { path: self.path.clone(), source }),
        };
        match Triangulation::read_buffer(&bytes)
        {
            Ok(triangulation) => CacheLookup::Present(triangulation),
            Err(e) => CacheLookup::Corrupt(LirError::CorruptCacheFile { path: self.path.clone(), reason: e.to_string() }),
        }
    }

    ///
    /// Atomically replace the cache file with `triangulation`: the bytes go to a temporary
    /// file next to the target, which is then renamed over it.
    ///
    pub fn store(&self, triangulation: &Triangulation) -> Result<(), LirError>
    {
        let write_failed = |source: io::Error| LirError::CacheWriteFailed { path: self.path.clone(), source };
        let bytes = triangulation.to_bytes(self.format)?;
        let parent = match self.path.parent()
        {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent).map_err(write_failed)?;
        let mut file = tempfile::NamedTempFile::new_in(parent).map_err(write_failed)?;
        file.write_all(&bytes).map_err(write_failed)?;
        file.as_file().sync_all().map_err(write_failed)?;
        file.persist(&self.path).map_err(|e| write_failed(e.error))?;
        info!(path = %self.path.display(), bytes = bytes.len(), format = ?self.format, "wrote triangulation cache");
        Ok(())
    }

    ///
    /// Return the cached triangulation, or build one from `points` and persist it when no
    /// cache file exists. A corrupt or unreadable file is an error and is left in place.
    ///
    pub fn get_or_build(&self, points: &[Point3]) -> Result<Triangulation, LirError>
    {
        match self.lookup()
        {
            CacheLookup::Present(triangulation) =>
            {
                info!(path = %self.path.display(), vertices = triangulation.num_vertices(), cells = triangulation.num_cells(), "loaded cached triangulation");
                Ok(triangulation)
            },
            CacheLookup::Corrupt(e) => Err(e),
            CacheLookup::Absent =>
            {
                info!(path = %self.path.display(), points = points.len(), "no cached triangulation, building");
                let triangulation = Triangulation::new(points)?;
                self.store(&triangulation)?;
                Ok(triangulation)
            },
        }
    }

    ///
    /// Delete the cache file. Returns whether a file was removed.
    ///
    pub fn invalidate(&self) -> Result<bool, LirError>
    {
        match fs::remove_file(&self.path)
        {
            Ok(()) =>
            {
                debug!(path = %self.path.display(), "removed triangulation cache");
                Ok(true)
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(LirError::CacheWriteFailed { path: self.path.clone(), source }),
        }
    }
}
