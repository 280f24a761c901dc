use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rkyv::api::high::{HighDeserializer, HighSerializer, HighValidator};
use rkyv::bytecheck::CheckBytes;
use rkyv::rancor::Error;
use rkyv::ser::allocator::ArenaHandle;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize};

use crate::error::{PuzzleError, Result};

pub fn encode<T>(value: &T) -> Result<Vec<u8>>
where
    T: for<'a> Serialize<HighSerializer<AlignedVec, ArenaHandle<'a>, Error>>,
{
    rkyv::to_bytes::<Error>(value)
        .map(|bytes| bytes.into_vec())
        .map_err(|err| PuzzleError::Codec(err.to_string()))
}

pub fn decode<T>(bytes: &[u8]) -> Result<T>
where
    T: Archive,
    T::Archived:
        for<'a> CheckBytes<HighValidator<'a, Error>> + Deserialize<T, HighDeserializer<Error>>,
{
    // Archived data must be aligned; a borrowed slice carries no guarantee.
    let mut aligned = AlignedVec::<16>::with_capacity(bytes.len());
    aligned.extend_from_slice(bytes);
    rkyv::from_bytes::<T, Error>(&aligned).map_err(|err| PuzzleError::Codec(err.to_string()))
}

/// Archive plus base64, for hosts that persist into string-only storage.
pub fn encode_storage_string<T>(value: &T) -> Result<String>
where
    T: for<'a> Serialize<HighSerializer<AlignedVec, ArenaHandle<'a>, Error>>,
{
    encode(value).map(|bytes| STANDARD.encode(bytes))
}

pub fn decode_storage_string<T>(text: &str) -> Result<T>
where
    T: Archive,
    T::Archived:
        for<'a> CheckBytes<HighValidator<'a, Error>> + Deserialize<T, HighDeserializer<Error>>,
{
    let bytes = STANDARD
        .decode(text.trim())
        .map_err(|err| PuzzleError::Codec(err.to_string()))?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Difficulty;

    #[test]
    fn garbage_is_a_codec_error() {
        let err = decode::<Difficulty>(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, PuzzleError::Codec(_)));
        let err = decode_storage_string::<Difficulty>("not base64!").unwrap_err();
        assert!(matches!(err, PuzzleError::Codec(_)));
    }

    #[test]
    fn storage_string_is_plain_base64() {
        let difficulty = Difficulty::named("Easy", 4, 5);
        let text = encode_storage_string(&difficulty).expect("encode");
        assert!(text
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '+' | '/' | '=')));
        let back: Difficulty = decode_storage_string(&text).expect("decode");
        assert_eq!(back, difficulty);
    }
}
