use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tracing::debug;

use docqa_core::{Error, Result};

const FORMAT_VERSION: u32 = 1;

/// On-disk dense index: row-major vectors of a fixed dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseArtifact {
    version: u32,
    pub dim: usize,
    data: Vec<f32>,
}

impl DenseArtifact {
    pub fn from_rows<'a, I>(dim: usize, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a [f32]>,
    {
        let mut data = Vec::new();
        for row in rows {
            if row.len() != dim {
                return Err(Error::DimensionMismatch { expected: dim, actual: row.len() });
            }
            data.extend_from_slice(row);
        }
        Ok(Self { version: FORMAT_VERSION, dim, data })
    }

    pub fn len(&self) -> usize {
        if self.dim == 0 { 0 } else { self.data.len() / self.dim }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_rows(self) -> Vec<Vec<f32>> {
        if self.dim == 0 {
            return Vec::new();
        }
        self.data.chunks_exact(self.dim).map(<[f32]>::to_vec).collect()
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let bytes = bincode::serialize(self).map_err(|e| Error::persistence(path, e))?;
        write_atomic(path, &bytes)?;
        debug!(path = %path.display(), rows = self.len(), dim = self.dim, "Wrote dense artifact");
        Ok(())
    }

    /// Reads the artifact at `path`; `Ok(None)` when the file does not exist.
    pub fn read(path: &Path) -> Result<Option<Self>> {
        let bytes = match fs::read(path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(Error::persistence(path, e)),
        };
        let artifact: Self = bincode::deserialize(&bytes).map_err(|e| Error::persistence(path, e))?;
        if artifact.version != FORMAT_VERSION {
            return Err(Error::persistence(path, format!("unsupported format version {}", artifact.version)));
        }
        if artifact.dim == 0 || artifact.data.len() % artifact.dim != 0 {
            return Err(Error::persistence(
                path,
                format!("{} values do not divide into rows of {}", artifact.data.len(), artifact.dim),
            ));
        }
        Ok(Some(artifact))
    }
}

/// Writes `bytes` to a temp file beside `path`, then renames it into place.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| Error::persistence(dir, e))?;
    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| Error::persistence(dir, e))?;
    tmp.write_all(bytes).map_err(|e| Error::persistence(path, e))?;
    tmp.as_file().sync_all().map_err(|e| Error::persistence(path, e))?;
    tmp.persist(path).map_err(|e| Error::persistence(path, e.error))?;
    Ok(())
}

/// Removes `path`, treating a missing file as already removed.
pub fn remove_if_exists(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::persistence(path, e)),
    }
}
