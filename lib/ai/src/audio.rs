//! Audio payload checks.

use crate::error::VoiceError;
use touchline_core::Result;

/// Length of the RIFF/WAVE header prefix checked by [`is_wav`].
const WAV_HEADER_LEN: usize = 12;

/// Returns true if the payload starts with a RIFF container of type WAVE.
#[must_use]
pub fn is_wav(bytes: &[u8]) -> bool {
    bytes.len() >= WAV_HEADER_LEN && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE"
}

/// Rejects payloads that are not WAV.
///
/// # Errors
///
/// Returns `VoiceError::InvalidAudio` carrying the first bytes of the
/// payload.
pub fn ensure_wav(bytes: &[u8]) -> Result<(), VoiceError> {
    if is_wav(bytes) {
        return Ok(());
    }
    Err(VoiceError::InvalidAudio {
        header: bytes.iter().take(WAV_HEADER_LEN).copied().collect(),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_minimal_header() {
        assert!(is_wav(b"RIFF\0\0\0\0WAVE"));
        assert!(is_wav(b"RIFF$\x01\0\0WAVEfmt "));
    }

    #[test]
    fn rejects_short_payloads() {
        assert!(!is_wav(b""));
        assert!(!is_wav(b"RIFF\0\0\0\0WAV"));
    }

    #[test]
    fn rejects_other_containers() {
        assert!(!is_wav(b"OggS\0\0\0\0WAVE"));
        assert!(!is_wav(b"RIFF\0\0\0\0AVI "));
        assert!(!is_wav(b"ID3\x04\0\0\0\0\0\0\0\0"));
    }

    #[test]
    fn ensure_wav_reports_header() {
        let err = ensure_wav(b"OggS-not-a-wave-file").expect_err("should reject");
        match err.current_context() {
            VoiceError::InvalidAudio { header } => assert_eq!(header, b"OggS-not-a-w"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
