//! Writing accepted frames.
//!
//! Output files are named `"{index}-{token}.png"`, where `index` is the
//! number of frames accepted before this one and `token` identifies the run.
//! Because the index only grows, names never repeat within a run.

use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    fs,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use image::{ImageFormat, RgbImage};

use crate::error::Vid2TrainError;

/// Leading digits of the Unix time dropped from generated run tokens.
const TOKEN_DROPPED_DIGITS: usize = 4;

/// A short string that tags every file written in one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunToken(String);

impl RunToken {
    /// Use an explicit token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Token derived from the current wall-clock time.
    ///
    /// The Unix time in seconds is written in decimal and its first four
    /// digits are dropped, leaving a short value that still changes every
    /// second.
    pub fn from_system_time() -> Self {
        let seconds = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or_default();
        Self::from_unix_seconds(seconds)
    }

    /// Token for a given Unix time in seconds.
    pub fn from_unix_seconds(seconds: u64) -> Self {
        let digits = seconds.to_string();
        let token = digits.get(TOKEN_DROPPED_DIGITS..).unwrap_or_default();
        Self(token.to_string())
    }

    /// The token text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RunToken {
    fn default() -> Self {
        Self::from_system_time()
    }
}

impl Display for RunToken {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// File name for the accepted frame numbered `index` in the run tagged `token`.
///
/// ```
/// use vid2train::{RunToken, output_file_name};
///
/// assert_eq!(output_file_name(0, &RunToken::new("905123")), "0-905123.png");
/// ```
pub fn output_file_name(index: u64, token: &RunToken) -> String {
    format!("{index}-{token}.png")
}

/// Destination for transformed frames.
pub trait FrameSink {
    /// Persist `image` under `file_name`, returning where it was written.
    ///
    /// # Errors
    ///
    /// Returns [`Vid2TrainError::FrameWrite`] if the image could not be
    /// stored.
    fn save(&mut self, image: &RgbImage, file_name: &str) -> Result<PathBuf, Vid2TrainError>;
}

/// Writes PNG files into a directory.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    directory: PathBuf,
}

impl DirectorySink {
    /// Sink writing into an existing `directory`.
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
        }
    }

    /// Sink writing into `directory`, creating it and its parents first.
    ///
    /// # Errors
    ///
    /// Returns [`Vid2TrainError::IoError`] if the directory cannot be created.
    pub fn create<P: AsRef<Path>>(directory: P) -> Result<Self, Vid2TrainError> {
        let directory = directory.as_ref();
        if !directory.exists() {
            fs::create_dir_all(directory)?;
            log::info!("Created output directory {}", directory.display());
        }
        Ok(Self::new(directory))
    }

    /// Directory files are written into.
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl FrameSink for DirectorySink {
    fn save(&mut self, image: &RgbImage, file_name: &str) -> Result<PathBuf, Vid2TrainError> {
        let path = self.directory.join(file_name);
        image
            .save_with_format(&path, ImageFormat::Png)
            .map_err(|source| Vid2TrainError::FrameWrite {
                path: path.clone(),
                source,
            })?;
        Ok(path)
    }
}
