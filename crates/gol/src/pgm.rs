//! Binary PGM (`P5`) image directories.
//!
//! Input images are read from `{input_dir}/{name}.pgm`, snapshots are
//! written to `{output_dir}/{name}.pgm`. Pixels are cell bytes verbatim:
//! `0` dead, `255` alive.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gol_engine::{ImageError, ImageStore};
use tracing::debug;

/// An [`ImageStore`] over two directories of PGM files.
#[derive(Clone, Debug)]
pub struct PgmStore {
    input_dir: PathBuf,
    output_dir: PathBuf,
}

impl PgmStore {
    /// Read from `input_dir`, write to `output_dir`.
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
        }
    }

    fn path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{name}.pgm"))
    }
}

impl ImageStore for PgmStore {
    fn load(&self, name: &str, height: usize, width: usize) -> Result<Vec<u8>, ImageError> {
        let path = Self::path(&self.input_dir, name);
        let data = fs::read(&path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ImageError::NotFound { name: name.into() },
            _ => ImageError::Io {
                name: name.into(),
                source,
            },
        })?;
        let pixels = decode(name, &data, height, width)?;
        debug!(path = %path.display(), "image read");
        Ok(pixels.to_vec())
    }

    fn save(
        &self,
        name: &str,
        height: usize,
        width: usize,
        bytes: &[u8],
    ) -> Result<(), ImageError> {
        if bytes.len() != height * width {
            return Err(ImageError::SizeMismatch {
                name: name.into(),
                expected: height * width,
                actual: bytes.len(),
            });
        }
        let io_err = |source| ImageError::Io {
            name: name.into(),
            source,
        };
        fs::create_dir_all(&self.output_dir).map_err(io_err)?;
        let path = Self::path(&self.output_dir, name);
        fs::write(&path, encode(height, width, bytes)).map_err(io_err)?;
        debug!(path = %path.display(), "image written");
        Ok(())
    }
}

/// A `P5` file holding `pixels` with maxval 255.
pub fn encode(height: usize, width: usize, pixels: &[u8]) -> Vec<u8> {
    let mut out = format!("P5\n{width} {height}\n255\n").into_bytes();
    out.extend_from_slice(pixels);
    out
}

/// Parse a `P5` file and return its pixel bytes, checking the declared
/// size against `height × width`.
pub fn decode<'a>(
    name: &str,
    data: &'a [u8],
    height: usize,
    width: usize,
) -> Result<&'a [u8], ImageError> {
    let malformed = |reason: &str| ImageError::Malformed {
        name: name.into(),
        reason: reason.into(),
    };
    let mut header = Header { data, pos: 0 };
    if header.token() != Some(b"P5".as_slice()) {
        return Err(malformed("not a binary PGM (missing P5 magic)"));
    }
    let mut field = |what: &str| {
        header
            .token()
            .and_then(|t| std::str::from_utf8(t).ok())
            .and_then(|t| t.parse::<usize>().ok())
            .ok_or_else(|| malformed(&format!("bad {what}")))
    };
    let file_width = field("width")?;
    let file_height = field("height")?;
    let maxval = field("maxval")?;
    if maxval != 255 {
        return Err(malformed(&format!("maxval {maxval}, expected 255")));
    }
    if (file_height, file_width) != (height, width) {
        return Err(malformed(&format!(
            "image is {file_height}x{file_width}, expected {height}x{width}"
        )));
    }
    // Exactly one whitespace byte separates the header from the pixels.
    let start = header.pos + 1;
    let pixels = data.get(start..).unwrap_or_default();
    if pixels.len() != height * width {
        return Err(ImageError::SizeMismatch {
            name: name.into(),
            expected: height * width,
            actual: pixels.len(),
        });
    }
    Ok(pixels)
}

struct Header<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Header<'a> {
    /// Next whitespace-separated token, skipping `#` comments. Leaves
    /// `pos` on the byte after the token.
    fn token(&mut self) -> Option<&'a [u8]> {
        loop {
            match *self.data.get(self.pos)? {
                b if b.is_ascii_whitespace() => self.pos += 1,
                b'#' => {
                    while *self.data.get(self.pos)? != b'\n' {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        let data = self.data;
        let start = self.pos;
        while data.get(self.pos).is_some_and(|b| !b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        Some(&data[start..self.pos])
    }
}
