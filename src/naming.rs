//! Shot file naming
//!
//! Operator-supplied names are reduced to a safe stem and written as
//! `<stem>.png`, `<stem>_1.png`, ... inside the project directory. The
//! collision check happens when the file is created, not beforehand.

use chrono::{Local, NaiveDateTime};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use log::debug;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

const MAX_SUFFIX: u32 = 100_000;

#[derive(Debug, thiserror::Error)]
pub enum NamingError {
    #[error("Cannot create {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot encode {path:?}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

/// Where a shot ended up. `stem` is the sanitized name, without any
/// collision suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredShot {
    pub path: PathBuf,
    pub stem: String,
}

impl StoredShot {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Keep alphanumerics, space and `-_()`, then trim.
pub fn sanitize_name(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '(' | ')'))
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn default_name(now: NaiveDateTime) -> String {
    format!("screenshot_{}", now.format("%H%M%S"))
}

/// Name pre-filled in the naming prompt.
pub fn suggested_name(now: NaiveDateTime) -> String {
    format!("screenshot_{}", now.format("%Y%m%d_%H%M%S"))
}

pub fn stem_for(raw: &str, now: NaiveDateTime) -> String {
    match sanitize_name(raw) {
        stem if stem.is_empty() => default_name(now),
        stem => stem,
    }
}

fn create_unique(dir: &Path, stem: &str) -> Result<(PathBuf, File), NamingError> {
    for i in 0..MAX_SUFFIX {
        let name = match i {
            0 => format!("{}.png", stem),
            i => format!("{}_{}.png", stem, i),
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(source) => return Err(NamingError::Io { path, source }),
        }
    }
    Err(NamingError::Io {
        path: dir.join(format!("{}.png", stem)),
        source: std::io::Error::new(ErrorKind::AlreadyExists, "no free file name"),
    })
}

fn encode_png(file: File, image: &RgbImage) -> Result<(), image::ImageError> {
    let mut writer = BufWriter::new(file);
    PngEncoder::new(&mut writer).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    writer.flush()?;
    Ok(())
}

/// Write `image` under a unique name derived from `raw_name`.
pub fn save_shot(dir: &Path, raw_name: &str, image: &RgbImage) -> Result<StoredShot, NamingError> {
    let stem = stem_for(raw_name, Local::now().naive_local());
    let (path, file) = create_unique(dir, &stem)?;

    if let Err(source) = encode_png(file, image) {
        let _ = std::fs::remove_file(&path);
        return Err(NamingError::Encode { path, source });
    }

    debug!("Wrote {}x{} shot to {:?}", image.width(), image.height(), path);
    Ok(StoredShot { path, stem })
}
