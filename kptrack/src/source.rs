use feature_track::{BoxError, FrameSource};
use image::{GrayImage, ImageError};
use log::*;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("failed to load frame {}", path.display())]
pub struct LoadError {
    pub path: PathBuf,
    #[source]
    pub source: ImageError,
}

/// A numbered sequence of image files in one directory.
///
/// Frame `i` is read from `<dir>/<prefix><i>.<extension>`, with `i` zero padded to
/// `fill_width` digits.
#[derive(Debug, Clone)]
pub struct ImageSequence {
    dir: PathBuf,
    prefix: String,
    extension: String,
    fill_width: usize,
}

impl ImageSequence {
    /// Uses the KITTI naming scheme (`0000000000.png`, `0000000001.png`, ...).
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            prefix: "000000".to_owned(),
            extension: "png".to_owned(),
            fill_width: 4,
        }
    }

    pub fn prefix(self, prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..self
        }
    }

    /// A leading `.` is ignored.
    pub fn extension(self, extension: &str) -> Self {
        Self {
            extension: extension.trim_start_matches('.').to_owned(),
            ..self
        }
    }

    pub fn fill_width(self, fill_width: usize) -> Self {
        Self { fill_width, ..self }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, index: usize) -> PathBuf {
        self.dir.join(format!(
            "{}{:0width$}.{}",
            self.prefix,
            index,
            self.extension,
            width = self.fill_width
        ))
    }
}

impl FrameSource for ImageSequence {
    fn load(&mut self, index: usize) -> Result<GrayImage, BoxError> {
        let path = self.path(index);
        trace!("loading frame {} from {}", index, path.display());
        let image = image::open(&path).map_err(|source| LoadError { path, source })?;
        Ok(image.to_luma8())
    }
}
