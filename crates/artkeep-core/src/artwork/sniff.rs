//! Advisory media-type detection from magic bytes.
//!
//! Uploaded artwork has no file extension, so this is the only hint about
//! what a file holds. The result is informational and never used to decide
//! whether a file is listed or deleted.

use super::types::MediaType;
use std::io::Read;
use std::path::Path;

/// Magic bytes for the formats media servers store as artwork.
mod magic {
    pub const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
    pub const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
    pub const GIF87: &[u8] = b"GIF87a";
    pub const GIF89: &[u8] = b"GIF89a";
    pub const RIFF: &[u8] = b"RIFF";
    pub const WEBP: &[u8] = b"WEBP";
    pub const BMP: &[u8] = b"BM";
    pub const ID3: &[u8] = b"ID3";
    pub const OGG: &[u8] = b"OggS";
    pub const FLAC: &[u8] = b"fLaC";
}

/// Detect the media type from a file's first bytes.
///
/// Returns `None` if the file can't be read.
pub fn sniff_media_type(path: &Path) -> Option<MediaType> {
    let mut header = [0u8; 16];
    let mut file = std::fs::File::open(path).ok()?;
    let bytes_read = file.read(&mut header).ok()?;
    Some(detect_media_type(&header[..bytes_read]))
}

/// Detect the media type from a header buffer.
pub fn detect_media_type(header: &[u8]) -> MediaType {
    if header.starts_with(magic::JPEG) {
        return MediaType::Jpeg;
    }
    if header.starts_with(magic::PNG) {
        return MediaType::Png;
    }
    if header.starts_with(magic::GIF87) || header.starts_with(magic::GIF89) {
        return MediaType::Gif;
    }
    if header.len() >= 12 && header.starts_with(magic::RIFF) && &header[8..12] == magic::WEBP {
        return MediaType::Webp;
    }
    if header.starts_with(magic::BMP) {
        return MediaType::Bmp;
    }
    if header.starts_with(magic::ID3) {
        return MediaType::Mp3;
    }
    // MPEG audio frame sync without an ID3 tag
    if header.len() >= 2 && header[0] == 0xFF && (header[1] & 0xE0) == 0xE0 {
        return MediaType::Mp3;
    }
    if header.starts_with(magic::OGG) {
        return MediaType::Ogg;
    }
    if header.starts_with(magic::FLAC) {
        return MediaType::Flac;
    }
    MediaType::Unknown
}
