//! Reader for LC-3 object images.
//!
//! An object image is a headerless stream of big-endian 16-bit words: the
//! first word is the load origin, the rest is the payload placed there.

use crate::errors::LoadImageError;
use crate::hardware::memory::MEMORY_SIZE;
use std::fs;

/// A parsed object image, already byte-swapped to host order.
#[derive(Debug)]
pub struct Image {
    pub origin: u16,
    pub words: Vec<u16>,
}

/// Reads and decodes one object image from disk.
///
/// # Errors
/// - Cannot read the file
/// - Image is malformed, see [`parse_image`]
pub fn read_image_file(path: &str) -> Result<Image, LoadImageError> {
    let bytes = fs::read(path).map_err(|e| LoadImageError::ImageNotLoadable {
        file: path.into(),
        message: e.to_string(),
    })?;
    parse_image(&bytes, path)
}

/// Decodes a big-endian word stream into origin and payload.
///
/// Byte-swapping to host order happens exactly once, here; the live memory
/// image is always host order.
///
/// # Errors
/// - Empty stream, so no origin word
/// - Odd number of bytes
/// - Payload does not fit between the origin and the end of memory
pub fn parse_image(bytes: &[u8], file: &str) -> Result<Image, LoadImageError> {
    if bytes.len() % 2 != 0 {
        return Err(LoadImageError::ImageNotEvenSize {
            file: file.into(),
            size: bytes.len(),
        });
    }
    let mut words = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
    let Some(origin) = words.next() else {
        return Err(LoadImageError::ImageMissingOriginHeader { file: file.into() });
    };
    let words: Vec<u16> = words.collect();
    let capacity = MEMORY_SIZE - usize::from(origin);
    if words.len() > capacity {
        return Err(LoadImageError::ImageExceedsMemory {
            origin,
            words: words.len(),
            capacity,
        });
    }
    Ok(Image { origin, words })
}
