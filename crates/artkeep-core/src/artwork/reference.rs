//! Virtual artwork references.
//!
//! The UI addresses artwork as `"<ratingKey>/<kind|all>/<selector>"`. The
//! string is parsed once here; everything downstream works on
//! [`VirtualArtworkRef`].

use super::types::{ArtworkKind, KindFilter, Selector};
use crate::error::{ArtkeepError, Result};
use std::fmt;
use std::str::FromStr;

/// A parsed reference to one or more artwork files of a library item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VirtualArtworkRef {
    pub rating_key: String,
    pub kind: KindFilter,
    /// Only meaningful for posters: restricts to `posters/seasons/<n>/`.
    pub season_index: Option<u32>,
    pub selector: Selector,
}

impl VirtualArtworkRef {
    /// Reference to every custom file of an item.
    pub fn all(rating_key: impl Into<String>) -> Self {
        Self {
            rating_key: rating_key.into(),
            kind: KindFilter::All,
            season_index: None,
            selector: Selector::All,
        }
    }

    /// Reference to every custom file of one kind.
    pub fn kind(rating_key: impl Into<String>, kind: ArtworkKind) -> Self {
        Self {
            rating_key: rating_key.into(),
            kind: KindFilter::Kind(kind),
            season_index: None,
            selector: Selector::All,
        }
    }
}

fn invalid(value: &str, message: impl Into<String>) -> ArtkeepError {
    ArtkeepError::Validation {
        field: format!("path '{}'", value),
        message: message.into(),
    }
}

/// ASCII alphanumerics, `-` and `_`. Keys are interpolated into request
/// URLs and backup paths.
fn is_valid_rating_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

impl FromStr for VirtualArtworkRef {
    type Err = ArtkeepError;

    fn from_str(value: &str) -> Result<Self> {
        let parts: Vec<&str> = value.trim().split('/').collect();
        let (key, kind_part, selector_part) = match parts.as_slice() {
            [key, kind] => (*key, *kind, "all"),
            [key, kind, selector] => (*key, *kind, *selector),
            _ => {
                return Err(invalid(
                    value,
                    "expected <ratingKey>/<kind|all>/<selector>",
                ))
            }
        };

        if !is_valid_rating_key(key) {
            return Err(invalid(value, "rating key is empty or malformed"));
        }

        let (kind_name, season) = match kind_part.split_once(':') {
            Some((name, season)) => {
                let season = season
                    .parse::<u32>()
                    .map_err(|_| invalid(value, format!("bad season index '{}'", season)))?;
                (name, Some(season))
            }
            None => (kind_part, None),
        };

        let kind = if kind_name.eq_ignore_ascii_case("all") {
            KindFilter::All
        } else {
            let kind = ArtworkKind::parse(kind_name)
                .ok_or_else(|| invalid(value, format!("unknown artwork kind '{}'", kind_name)))?;
            KindFilter::Kind(kind)
        };

        if season.is_some() && kind != KindFilter::Kind(ArtworkKind::Poster) {
            return Err(invalid(value, "season index is only valid for posters"));
        }

        let selector = if selector_part.eq_ignore_ascii_case("all") {
            Selector::All
        } else {
            let index = selector_part
                .parse::<usize>()
                .map_err(|_| invalid(value, format!("bad selector '{}'", selector_part)))?;
            Selector::Index(index)
        };

        Ok(Self {
            rating_key: key.to_string(),
            kind,
            season_index: season,
            selector,
        })
    }
}

impl fmt::Display for VirtualArtworkRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/", self.rating_key)?;
        match self.kind {
            KindFilter::All => f.write_str("all")?,
            KindFilter::Kind(kind) => f.write_str(kind.as_str())?,
        }
        if let Some(season) = self.season_index {
            write!(f, ":{}", season)?;
        }
        match self.selector {
            Selector::All => f.write_str("/all"),
            Selector::Index(i) => write!(f, "/{}", i),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_all() {
        let r: VirtualArtworkRef = "70791/all/all".parse().unwrap();
        assert_eq!(r, VirtualArtworkRef::all("70791"));
    }

    #[test]
    fn test_parse_kind_and_index() {
        let r: VirtualArtworkRef = "70791/posters/2".parse().unwrap();
        assert_eq!(r.kind, KindFilter::Kind(ArtworkKind::Poster));
        assert_eq!(r.selector, Selector::Index(2));
        assert_eq!(r.season_index, None);
    }

    #[test]
    fn test_parse_season_poster() {
        let r: VirtualArtworkRef = "1200/poster:3/all".parse().unwrap();
        assert_eq!(r.season_index, Some(3));
        assert_eq!(r.to_string(), "1200/poster:3/all");
    }

    #[test]
    fn test_selector_defaults_to_all() {
        let r: VirtualArtworkRef = "55/banner".parse().unwrap();
        assert_eq!(r.selector, Selector::All);
    }

    #[test]
    fn test_rejects_malformed() {
        for bad in [
            "",
            "70791",
            "/all/all",
            "../all/all",
            "70791/clearlogo/all",
            "70791/art:2/all",
            "70791/all/first",
            "70791/all/all/extra",
        ] {
            let err = bad.parse::<VirtualArtworkRef>().unwrap_err();
            assert!(
                matches!(err, ArtkeepError::Validation { .. }),
                "{bad:?} should be a validation error"
            );
        }
    }

    #[test]
    fn test_rating_key_charset() {
        for bad in [
            "70791?x=1/all/all",
            "70791#f/all/all",
            "a b/all/all",
            "7%2F/all/all",
            "ä1/all/all",
        ] {
            assert!(bad.parse::<VirtualArtworkRef>().is_err(), "{bad:?} should be rejected");
        }
        let r: VirtualArtworkRef = "abc-12_x/posters/0".parse().unwrap();
        assert_eq!(r.rating_key, "abc-12_x");
    }
}
