//! Content-based file type detection.
//!
//! This module identifies a file's real format from its leading bytes,
//! ignoring whatever extension its name carries. Detection is driven by an
//! ordered signature table: the first entry whose magic bytes match wins, so
//! specific formats are listed before the generic containers they build on.
//! Formats the table does not cover are handed to the `infer` crate.
//!
//! # Examples
//!
//! ```
//! use renamelog::type_sniffer::{TypeLabel, sniff_bytes};
//!
//! assert_eq!(sniff_bytes(&[0xFF, 0xD8, 0xFF, 0xE0]).to_string(), "jpg");
//! assert_eq!(sniff_bytes(b"%PDF-1.7").to_string(), "pdf");
//! assert_eq!(sniff_bytes(b""), TypeLabel::Unknown);
//! ```

use crate::paths::trim_path;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Maximum number of leading bytes inspected per file.
pub const SNIFF_LEN: usize = 128;

/// The detected type of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeLabel {
    /// A recognised format.
    Known {
        /// Canonical extension, e.g. `jpg`.
        extension: &'static str,
        /// MIME type of the format.
        mime: &'static str,
    },
    /// No signature matched.
    Unknown,
}

impl TypeLabel {
    /// Returns the canonical extension, or `None` for unknown content.
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            TypeLabel::Known { extension, .. } => Some(*extension),
            TypeLabel::Unknown => None,
        }
    }

    /// Returns the MIME type, or `None` for unknown content.
    pub fn mime(&self) -> Option<&'static str> {
        match self {
            TypeLabel::Known { mime, .. } => Some(*mime),
            TypeLabel::Unknown => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, TypeLabel::Known { .. })
    }
}

impl fmt::Display for TypeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeLabel::Known { extension, .. } => f.write_str(extension),
            TypeLabel::Unknown => f.write_str("Unknown"),
        }
    }
}

/// A magic-number signature.
///
/// Every `(offset, bytes)` part must be present for the signature to match.
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    pub extension: &'static str,
    pub mime: &'static str,
    pub parts: &'static [(usize, &'static [u8])],
}

impl Signature {
    const fn new(
        extension: &'static str,
        mime: &'static str,
        parts: &'static [(usize, &'static [u8])],
    ) -> Self {
        Self {
            extension,
            mime,
            parts,
        }
    }

    /// Number of leading bytes a buffer needs before this signature can match.
    pub fn min_len(&self) -> usize {
        self.parts
            .iter()
            .map(|(offset, bytes)| offset + bytes.len())
            .max()
            .unwrap_or(0)
    }

    /// Returns true if every part of the signature is present in `data`.
    pub fn matches(&self, data: &[u8]) -> bool {
        data.len() >= self.min_len()
            && self
                .parts
                .iter()
                .all(|(offset, bytes)| &data[*offset..offset + bytes.len()] == *bytes)
    }

    fn label(&self) -> TypeLabel {
        TypeLabel::Known {
            extension: self.extension,
            mime: self.mime,
        }
    }
}

const PK_LOCAL: &[u8] = b"PK\x03\x04";

/// Signature table in priority order.
///
/// Entries that refine a shorter, generic signature must precede it:
/// zip-based documents before `zip`, and the `RIFF` family is split by
/// its form type at offset 8. ISO media files are told apart by the
/// major brand that follows `ftyp`.
pub const SIGNATURES: &[Signature] = &[
    // Images
    Signature::new("jpg", "image/jpeg", &[(0, &[0xFF, 0xD8, 0xFF])]),
    Signature::new(
        "png",
        "image/png",
        &[(0, &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A])],
    ),
    Signature::new("gif", "image/gif", &[(0, b"GIF87a")]),
    Signature::new("gif", "image/gif", &[(0, b"GIF89a")]),
    Signature::new("webp", "image/webp", &[(0, b"RIFF"), (8, b"WEBP")]),
    Signature::new("tif", "image/tiff", &[(0, b"II*\x00")]),
    Signature::new("tif", "image/tiff", &[(0, b"MM\x00*")]),
    Signature::new("psd", "image/vnd.adobe.photoshop", &[(0, b"8BPS")]),
    Signature::new("ico", "image/vnd.microsoft.icon", &[(0, &[0x00, 0x00, 0x01, 0x00])]),
    // Audio / video
    Signature::new("wav", "audio/wav", &[(0, b"RIFF"), (8, b"WAVE")]),
    Signature::new("avi", "video/x-msvideo", &[(0, b"RIFF"), (8, b"AVI ")]),
    Signature::new("flac", "audio/flac", &[(0, b"fLaC")]),
    Signature::new("ogg", "audio/ogg", &[(0, b"OggS")]),
    Signature::new("mp3", "audio/mpeg", &[(0, b"ID3")]),
    Signature::new("mid", "audio/midi", &[(0, b"MThd")]),
    Signature::new("m4a", "audio/x-m4a", &[(4, b"ftypM4A ")]),
    Signature::new("mov", "video/quicktime", &[(4, b"ftypqt  ")]),
    Signature::new("m4v", "video/x-m4v", &[(4, b"ftypM4V ")]),
    Signature::new("heic", "image/heic", &[(4, b"ftypheic")]),
    Signature::new("heif", "image/heif", &[(4, b"ftypmif1")]),
    Signature::new("heif", "image/heif", &[(4, b"ftypmsf1")]),
    Signature::new("avif", "image/avif", &[(4, b"ftypavif")]),
    Signature::new("3gp", "video/3gpp", &[(4, b"ftyp3gp")]),
    // Plain MP4 only for its own brands; other ISO media falls through.
    Signature::new("mp4", "video/mp4", &[(4, b"ftypisom")]),
    Signature::new("mp4", "video/mp4", &[(4, b"ftypiso2")]),
    Signature::new("mp4", "video/mp4", &[(4, b"ftypmp41")]),
    Signature::new("mp4", "video/mp4", &[(4, b"ftypmp42")]),
    Signature::new("mp4", "video/mp4", &[(4, b"ftypavc1")]),
    Signature::new("mp4", "video/mp4", &[(4, b"ftypdash")]),
    Signature::new("mkv", "video/x-matroska", &[(0, &[0x1A, 0x45, 0xDF, 0xA3])]),
    // Documents
    Signature::new("pdf", "application/pdf", &[(0, b"%PDF-")]),
    Signature::new("ps", "application/postscript", &[(0, b"%!PS")]),
    Signature::new("rtf", "application/rtf", &[(0, b"{\\rtf")]),
    Signature::new(
        "epub",
        "application/epub+zip",
        &[(0, PK_LOCAL), (30, b"mimetypeapplication/epub+zip")],
    ),
    Signature::new(
        "odt",
        "application/vnd.oasis.opendocument.text",
        &[(0, PK_LOCAL), (30, b"mimetypeapplication/vnd.oasis.opendocument.text")],
    ),
    Signature::new(
        "ods",
        "application/vnd.oasis.opendocument.spreadsheet",
        &[
            (0, PK_LOCAL),
            (30, b"mimetypeapplication/vnd.oasis.opendocument.spreadsheet"),
        ],
    ),
    Signature::new(
        "odp",
        "application/vnd.oasis.opendocument.presentation",
        &[
            (0, PK_LOCAL),
            (30, b"mimetypeapplication/vnd.oasis.opendocument.presentation"),
        ],
    ),
    Signature::new(
        "doc",
        "application/msword",
        &[(0, &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])],
    ),
    Signature::new("xml", "application/xml", &[(0, b"<?xml")]),
    // Archives
    Signature::new("zip", "application/zip", &[(0, PK_LOCAL)]),
    Signature::new("zip", "application/zip", &[(0, b"PK\x05\x06")]),
    Signature::new("zip", "application/zip", &[(0, b"PK\x07\x08")]),
    Signature::new("rar", "application/vnd.rar", &[(0, b"Rar!\x1A\x07")]),
    Signature::new(
        "7z",
        "application/x-7z-compressed",
        &[(0, &[b'7', b'z', 0xBC, 0xAF, 0x27, 0x1C])],
    ),
    Signature::new("gz", "application/gzip", &[(0, &[0x1F, 0x8B])]),
    Signature::new("bz2", "application/x-bzip2", &[(0, b"BZh")]),
    Signature::new(
        "xz",
        "application/x-xz",
        &[(0, &[0xFD, b'7', b'z', b'X', b'Z', 0x00])],
    ),
    // Fonts
    Signature::new("woff", "font/woff", &[(0, b"wOFF")]),
    Signature::new("woff2", "font/woff2", &[(0, b"wOF2")]),
    Signature::new("otf", "font/otf", &[(0, b"OTTO")]),
    Signature::new("ttf", "font/ttf", &[(0, &[0x00, 0x01, 0x00, 0x00, 0x00])]),
    // Executables and databases
    Signature::new("elf", "application/x-executable", &[(0, b"\x7FELF")]),
    Signature::new("wasm", "application/wasm", &[(0, b"\x00asm")]),
    Signature::new("class", "application/java-vm", &[(0, &[0xCA, 0xFE, 0xBA, 0xBE])]),
    Signature::new("sqlite", "application/vnd.sqlite3", &[(0, b"SQLite format 3\x00")]),
    Signature::new("exe", "application/vnd.microsoft.portable-executable", &[(0, b"MZ")]),
    // Two-byte signatures last; they collide easily with text.
    Signature::new("bmp", "image/bmp", &[(0, b"BM")]),
];

/// Errors that can occur while sniffing a file.
#[derive(Debug, Error)]
pub enum SniffError {
    /// The caller supplied an empty path.
    #[error("Invalid file path")]
    InvalidPath,
    /// The path does not exist.
    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },
    /// The file exists but could not be opened or read.
    #[error("Cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Classifies a byte prefix.
///
/// The signature table is consulted first, in order; `infer` is the
/// fallback for anything the table does not know.
pub fn sniff_bytes(data: &[u8]) -> TypeLabel {
    if let Some(signature) = SIGNATURES.iter().find(|s| s.matches(data)) {
        return signature.label();
    }

    match infer::get(data) {
        Some(kind) => TypeLabel::Known {
            extension: kind.extension(),
            mime: kind.mime_type(),
        },
        None => TypeLabel::Unknown,
    }
}

/// Detects file types from content.
pub struct TypeSniffer;

impl TypeSniffer {
    /// Reads up to [`SNIFF_LEN`] bytes of `path` and classifies them.
    ///
    /// Files shorter than a signature simply fail to match it; an empty or
    /// unrecognised file yields [`TypeLabel::Unknown`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use renamelog::type_sniffer::TypeSniffer;
    /// use std::path::Path;
    ///
    /// match TypeSniffer::detect(Path::new("photo")) {
    ///     Ok(label) => println!("The detected file extension is: {}", label),
    ///     Err(e) => eprintln!("{}", e),
    /// }
    /// ```
    pub fn detect(path: &Path) -> Result<TypeLabel, SniffError> {
        let path = trim_path(path);
        if path.as_os_str().is_empty() {
            return Err(SniffError::InvalidPath);
        }

        let prefix = Self::read_prefix(&path)?;
        let label = sniff_bytes(&prefix);
        debug!(path = %path.display(), bytes = prefix.len(), %label, "sniffed file");
        Ok(label)
    }

    fn read_prefix(path: &Path) -> Result<Vec<u8>, SniffError> {
        let classify = |source: io::Error| {
            if source.kind() == io::ErrorKind::NotFound {
                SniffError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                SniffError::Unreadable {
                    path: path.to_path_buf(),
                    source,
                }
            }
        };

        let file = File::open(path).map_err(classify)?;
        let mut prefix = Vec::with_capacity(SNIFF_LEN);
        file.take(SNIFF_LEN as u64)
            .read_to_end(&mut prefix)
            .map_err(classify)?;
        Ok(prefix)
    }
}
