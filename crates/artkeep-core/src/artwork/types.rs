//! Artwork domain types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of artwork, one per subdirectory of an item's Uploads folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtworkKind {
    Poster,
    Art,
    Background,
    Banner,
    Theme,
}

impl ArtworkKind {
    /// All kinds, in the order results are reported.
    pub const ALL: [ArtworkKind; 5] = [
        ArtworkKind::Poster,
        ArtworkKind::Art,
        ArtworkKind::Background,
        ArtworkKind::Banner,
        ArtworkKind::Theme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtworkKind::Poster => "poster",
            ArtworkKind::Art => "art",
            ArtworkKind::Background => "background",
            ArtworkKind::Banner => "banner",
            ArtworkKind::Theme => "theme",
        }
    }

    /// Subdirectory name under `Uploads/`.
    pub fn dir_name(&self) -> &'static str {
        match self {
            ArtworkKind::Poster => "posters",
            ArtworkKind::Art => "art",
            ArtworkKind::Background => "backgrounds",
            ArtworkKind::Banner => "banners",
            ArtworkKind::Theme => "themes",
        }
    }

    /// Parse a kind name; singular and plural forms are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "poster" | "posters" => Some(ArtworkKind::Poster),
            "art" | "arts" => Some(ArtworkKind::Art),
            "background" | "backgrounds" => Some(ArtworkKind::Background),
            "banner" | "banners" => Some(ArtworkKind::Banner),
            "theme" | "themes" => Some(ArtworkKind::Theme),
            _ => None,
        }
    }

    /// Themes are audio; everything else is an image.
    pub fn expects_audio(&self) -> bool {
        matches!(self, ArtworkKind::Theme)
    }
}

impl fmt::Display for ArtworkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which kinds a reference addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KindFilter {
    All,
    Kind(ArtworkKind),
}

impl KindFilter {
    pub fn matches(&self, kind: ArtworkKind) -> bool {
        match self {
            KindFilter::All => true,
            KindFilter::Kind(k) => *k == kind,
        }
    }
}

/// Which of the resolved files a reference addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Selector {
    All,
    /// Zero-based position in the resolved, sorted file list.
    Index(usize),
}

/// Media type detected from a file's leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Jpeg,
    Png,
    Gif,
    Webp,
    Bmp,
    Mp3,
    Ogg,
    Flac,
    Unknown,
}

impl MediaType {
    pub fn is_image(&self) -> bool {
        matches!(
            self,
            MediaType::Jpeg | MediaType::Png | MediaType::Gif | MediaType::Webp | MediaType::Bmp
        )
    }

    pub fn is_audio(&self) -> bool {
        matches!(self, MediaType::Mp3 | MediaType::Ogg | MediaType::Flac)
    }

    pub fn mime(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Gif => "image/gif",
            MediaType::Webp => "image/webp",
            MediaType::Bmp => "image/bmp",
            MediaType::Mp3 => "audio/mpeg",
            MediaType::Ogg => "audio/ogg",
            MediaType::Flac => "audio/flac",
            MediaType::Unknown => "application/octet-stream",
        }
    }
}

/// A custom artwork file found on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtworkFile {
    pub path: PathBuf,
    pub kind: ArtworkKind,
    pub size_bytes: u64,
    /// Advisory; `None` when sniffing was skipped or the file was unreadable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type: Option<MediaType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_index: Option<u32>,
}

impl ArtworkFile {
    /// True when the sniffed content does not match what the kind's folder
    /// normally holds. Such files are still listed and deletable.
    pub fn is_unexpected_type(&self) -> bool {
        match self.media_type {
            None => false,
            Some(MediaType::Unknown) => true,
            Some(mt) if self.kind.expects_audio() => !mt.is_audio(),
            Some(mt) => !mt.is_image(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_roundtrip() {
        for kind in ArtworkKind::ALL {
            assert_eq!(ArtworkKind::parse(kind.as_str()), Some(kind));
            assert_eq!(ArtworkKind::parse(kind.dir_name()), Some(kind));
        }
        assert_eq!(ArtworkKind::parse("Posters"), Some(ArtworkKind::Poster));
        assert_eq!(ArtworkKind::parse("clearlogo"), None);
    }

    #[test]
    fn test_unexpected_type_flags() {
        let mut file = ArtworkFile {
            path: PathBuf::from("/m/Uploads/posters/abc"),
            kind: ArtworkKind::Poster,
            size_bytes: 10,
            media_type: Some(MediaType::Jpeg),
            season_index: None,
        };
        assert!(!file.is_unexpected_type());

        file.media_type = Some(MediaType::Mp3);
        assert!(file.is_unexpected_type());

        file.kind = ArtworkKind::Theme;
        assert!(!file.is_unexpected_type());

        file.media_type = None;
        assert!(!file.is_unexpected_type());
    }
}
