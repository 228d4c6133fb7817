//! Copying strings and numeric arrays out of guest linear memory.
//!
//! Every function here takes the memory region as it is *right now* and
//! returns owned data. The region can be moved or resized whenever the guest
//! grows its memory, so nothing returned may borrow from it, and no size is
//! ever cached between calls.

use crate::{BridgeError, Result};
use std::mem::size_of;

/// Returns the `len` bytes starting at `offset`, checking them against the
/// current size of `memory`.
pub fn byte_range(memory: &[u8], offset: u32, len: u64) -> Result<&[u8]> {
    let out_of_bounds = || BridgeError::OutOfBounds {
        offset: offset.into(),
        len,
        size: memory.len(),
    };
    let end = u64::from(offset)
        .checked_add(len)
        .filter(|end| *end <= memory.len() as u64)
        .ok_or_else(out_of_bounds)?;
    Ok(&memory[offset as usize..end as usize])
}

/// Decodes `len` bytes at `offset` as strict UTF-8.
///
/// Malformed input fails with [`BridgeError::InvalidEncoding`]; nothing is
/// replaced with U+FFFD.
pub fn decode_utf8(memory: &[u8], offset: u32, len: u32) -> Result<String> {
    let bytes = byte_range(memory, offset, len.into())?;
    Ok(std::str::from_utf8(bytes)?.to_owned())
}

/// Decodes an optional string argument, where a zero `len` means "absent".
pub fn decode_optional(memory: &[u8], offset: u32, len: u32) -> Result<Option<String>> {
    if len == 0 {
        return Ok(None);
    }
    decode_utf8(memory, offset, len).map(Some)
}

/// A numeric type that can be copied out of little-endian guest memory.
pub trait Element: Copy + Send + Sync + 'static {
    /// Size of one element, in bytes.
    const SIZE: usize;

    /// Reads one element from exactly [`Element::SIZE`] bytes.
    fn from_le_slice(bytes: &[u8]) -> Self;
}

macro_rules! elements {
    ($($ty:ty)*) => {$(
        impl Element for $ty {
            const SIZE: usize = size_of::<$ty>();

            fn from_le_slice(bytes: &[u8]) -> Self {
                let mut buf = [0; size_of::<$ty>()];
                buf.copy_from_slice(bytes);
                <$ty>::from_le_bytes(buf)
            }
        }
    )*};
}

elements!(u8 i8 u16 i16 u32 i32 u64 i64 f32 f64);

/// Copies `count` elements of `T` starting at byte `offset` into a new vector.
///
/// The offset need not be aligned for `T`.
pub fn copy_numeric<T: Element>(memory: &[u8], offset: u32, count: u32) -> Result<Vec<T>> {
    let len = u64::from(count) * T::SIZE as u64;
    let bytes = byte_range(memory, offset, len)?;
    Ok(bytes.chunks_exact(T::SIZE).map(T::from_le_slice).collect())
}

#[cfg(test)]
mod test {
    use super::*;

    fn memory_with(offset: usize, bytes: &[u8]) -> Vec<u8> {
        let mut memory = vec![0; 64];
        memory[offset..offset + bytes.len()].copy_from_slice(bytes);
        memory
    }

    #[test]
    fn decode_round_trip() {
        for text in ["", "pos", "u_color", "héllo wörld", "\u{1F600} smile", "a\0b"] {
            let memory = memory_with(7, text.as_bytes());
            assert_eq!(
                decode_utf8(&memory, 7, text.len() as u32).unwrap(),
                text,
                "{text:?}"
            );
        }
    }

    #[test]
    fn decode_bounds() {
        let memory = memory_with(0, b"abcdef");
        assert_eq!(decode_utf8(&memory, 60, 4).unwrap(), "\0\0\0\0");
        assert_eq!(decode_utf8(&memory, 64, 0).unwrap(), "");
        assert_eq!(
            decode_utf8(&memory, 61, 4),
            Err(BridgeError::OutOfBounds {
                offset: 61,
                len: 4,
                size: 64
            })
        );
        assert!(matches!(
            decode_utf8(&memory, u32::MAX, 2),
            Err(BridgeError::OutOfBounds { .. })
        ));
        assert!(matches!(
            decode_utf8(&[], 0, 1),
            Err(BridgeError::OutOfBounds { size: 0, .. })
        ));
    }

    #[test]
    fn decode_is_strict() {
        let memory = memory_with(0, &[b'o', b'k', 0xff, 0xfe]);
        assert_eq!(decode_utf8(&memory, 0, 2).unwrap(), "ok");
        assert!(matches!(
            decode_utf8(&memory, 0, 4),
            Err(BridgeError::InvalidEncoding(_))
        ));
        // A truncated multi-byte sequence is malformed too.
        let memory = memory_with(0, "é".as_bytes());
        assert!(matches!(
            decode_utf8(&memory, 0, 1),
            Err(BridgeError::InvalidEncoding(_))
        ));
    }

    #[test]
    fn optional_strings() {
        let memory = memory_with(4, b"tag");
        assert_eq!(decode_optional(&memory, 4, 0).unwrap(), None);
        assert_eq!(decode_optional(&memory, 1000, 0).unwrap(), None);
        assert_eq!(decode_optional(&memory, 4, 3).unwrap().as_deref(), Some("tag"));
        assert!(decode_optional(&memory, 63, 3).is_err());
    }

    #[test]
    fn copies_floats() {
        let floats = [0.0f32, 0.5, -1.0, 1.0, 0.25, f32::MAX];
        let bytes = floats.iter().flat_map(|f| f.to_le_bytes()).collect::<Vec<_>>();
        // Deliberately unaligned.
        let memory = memory_with(3, &bytes);
        assert_eq!(copy_numeric::<f32>(&memory, 3, 6).unwrap(), floats);
        assert_eq!(copy_numeric::<f32>(&memory, 3, 2).unwrap(), &floats[..2]);
        assert_eq!(copy_numeric::<f32>(&memory, 3, 0).unwrap(), Vec::<f32>::new());
    }

    #[test]
    fn copies_integers() {
        let memory = memory_with(0, &[1, 0, 2, 0, 0xff, 0xff]);
        assert_eq!(copy_numeric::<u16>(&memory, 0, 3).unwrap(), [1, 2, 0xffff]);
        assert_eq!(copy_numeric::<i16>(&memory, 4, 1).unwrap(), [-1]);
        assert_eq!(copy_numeric::<u8>(&memory, 0, 2).unwrap(), [1, 0]);
    }

    #[test]
    fn copy_bounds() {
        let memory = vec![0; 16];
        assert!(copy_numeric::<f32>(&memory, 0, 4).is_ok());
        assert!(copy_numeric::<f32>(&memory, 12, 1).is_ok());
        assert_eq!(
            copy_numeric::<f32>(&memory, 13, 1),
            Err(BridgeError::OutOfBounds {
                offset: 13,
                len: 4,
                size: 16
            })
        );
        assert!(copy_numeric::<f64>(&memory, 0, u32::MAX).is_err());
    }
}
