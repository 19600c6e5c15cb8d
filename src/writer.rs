//! Frame persistence.
//!
//! [`FrameWriter`] owns the destination directory of a run. It creates the
//! directory tree up front and writes each selected frame as
//! `<destination>/<index>.jpg` at the frame's native resolution using the
//! `image` crate's default JPEG encoder settings. Existing files with the
//! same name are overwritten.

use std::{
    fs,
    path::{Path, PathBuf},
};

use image::ImageFormat;

use crate::{error::FramegrabError, frame::DecodedFrame, request::frame_file_path};

/// Writes frames into one destination directory.
#[derive(Debug, Clone)]
pub struct FrameWriter {
    destination: PathBuf,
}

impl FrameWriter {
    /// Ensure `destination` exists (creating missing parents) and return a
    /// writer for it.
    ///
    /// # Errors
    ///
    /// - [`FramegrabError::MissingDestination`] if `destination` is empty.
    /// - [`FramegrabError::WriteError`] if the directory cannot be created.
    pub fn prepare<P: AsRef<Path>>(destination: P) -> Result<Self, FramegrabError> {
        let destination = destination.as_ref();
        if destination.as_os_str().is_empty() {
            return Err(FramegrabError::MissingDestination);
        }

        if !destination.is_dir() {
            log::info!("Creating destination directory {}", destination.display());
            fs::create_dir_all(destination).map_err(|error| FramegrabError::WriteError {
                path: destination.to_path_buf(),
                reason: error.to_string(),
            })?;
        }

        Ok(Self {
            destination: destination.to_path_buf(),
        })
    }

    /// The directory frames are written into.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Write `frame` as `<destination>/<frame.index>.jpg` and return the path.
    ///
    /// # Errors
    ///
    /// [`FramegrabError::WriteError`] if the file cannot be encoded or written
    /// (directory removed, permission revoked, disk full).
    pub fn write(&self, frame: &DecodedFrame) -> Result<PathBuf, FramegrabError> {
        let path = frame_file_path(&self.destination, frame.index);
        frame
            .image
            .save_with_format(&path, ImageFormat::Jpeg)
            .map_err(|error| FramegrabError::WriteError {
                path: path.clone(),
                reason: error.to_string(),
            })?;
        log::trace!("Wrote frame {} to {}", frame.index, path.display());
        Ok(path)
    }
}
