#[derive(Debug, thiserror::Error)]
pub enum SffError {
    #[error("Unrecognized SFF file, invalid header magic: {magic:?}")]
    UnknownMagic { magic: Vec<u8> },
    #[error("Unrecognized SFF version: {major}.{minor}.{revision}.{build}")]
    UnknownVersion {
        major: u8,
        minor: u8,
        revision: u8,
        build: u8,
    },
    #[error("Sprite {index} links to {link}, which is not a previously read sprite")]
    InvalidSpriteLink { index: usize, link: usize },
    #[error("Palette {index} links to {link}, which does not resolve to a palette")]
    InvalidPaletteLink { index: usize, link: usize },
    #[error("Unknown sprite format {tag} (sprite {group},{number})")]
    UnknownCodec { tag: u8, group: i16, number: i16 },
    #[error("Unknown color depth {depth} (sprite {group},{number})")]
    UnknownColorDepth { depth: u8, group: i16, number: i16 },
    #[error("Cannot decode embedded image (sprite {group},{number}): {message}")]
    ImageDecode {
        group: i16,
        number: i16,
        message: String,
    },
    #[error("Invalid PCX color depth: expected 8-bit, got {depth}")]
    PcxColorDepth { depth: u8 },
    #[error("Cannot read {what} at offset {offset:#x}: unexpected end of data")]
    ParseError { what: &'static str, offset: usize },
    #[error("Error opening archive: {source}")]
    IOError {
        #[from]
        source: std::io::Error,
    },
}

impl SffError {
    /// Codec failures only invalidate the sprite they came from.
    pub fn is_sprite_local(&self) -> bool {
        matches!(
            self,
            Self::UnknownCodec { .. } | Self::UnknownColorDepth { .. } | Self::ImageDecode { .. }
        )
    }

    pub fn is_link_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidSpriteLink { .. } | Self::InvalidPaletteLink { .. }
        )
    }
}
