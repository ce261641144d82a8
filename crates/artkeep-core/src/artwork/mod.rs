//! Artwork references, resolution and media-type sniffing.

mod reference;
mod resolver;
mod sniff;
mod types;

pub use reference::VirtualArtworkRef;
pub use resolver::{resolve_dir, PathResolver, Resolution, ResolverOptions};
pub use sniff::{detect_media_type, sniff_media_type};
pub use types::{ArtworkFile, ArtworkKind, KindFilter, MediaType, Selector};
