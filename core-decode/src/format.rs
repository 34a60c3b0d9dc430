//! # Audio Container Families
//!
//! The four input families the pipeline decodes, and magic-byte sniffing to
//! pick one when the caller does not know.

use crate::status::StatusFamily;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Input family of an encoded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioContainer {
    /// Native FLAC stream (lossless).
    Flac,
    /// Ogg container carrying Vorbis (transform codec).
    Vorbis,
    /// Raw MPEG audio frames, optionally behind an ID3v2 tag.
    Mp3,
    /// MPEG-4 container carrying AAC.
    Mp4a,
}

impl AudioContainer {
    pub const ALL: [AudioContainer; 4] = [
        AudioContainer::Flac,
        AudioContainer::Vorbis,
        AudioContainer::Mp3,
        AudioContainer::Mp4a,
    ];

    /// Status numbering used by this family's adapters.
    pub fn family(&self) -> StatusFamily {
        match self {
            AudioContainer::Flac | AudioContainer::Vorbis | AudioContainer::Mp3 => {
                StatusFamily::Simple
            }
            AudioContainer::Mp4a => StatusFamily::Container,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioContainer::Flac => "flac",
            AudioContainer::Vorbis => "ogg",
            AudioContainer::Mp3 => "mp3",
            AudioContainer::Mp4a => "m4a",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioContainer::Flac => "audio/flac",
            AudioContainer::Vorbis => "audio/ogg",
            AudioContainer::Mp3 => "audio/mpeg",
            AudioContainer::Mp4a => "audio/mp4",
        }
    }

    /// Magic bytes a stream of this family must start with.
    ///
    /// MP3 may carry leading junk or a tag and MP4 boxes are located by the
    /// reader, so neither has a fixed signature.
    pub fn signature(&self) -> Option<&'static [u8]> {
        match self {
            AudioContainer::Flac => Some(b"fLaC"),
            AudioContainer::Vorbis => Some(b"OggS"),
            AudioContainer::Mp3 | AudioContainer::Mp4a => None,
        }
    }

    /// Whether `input` starts with this family's signature. Families without
    /// one accept any leading bytes.
    pub fn has_leading_signature(&self, input: &[u8]) -> bool {
        self.signature().map_or(true, |magic| input.starts_with(magic))
    }
}

impl fmt::Display for AudioContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Identify the container family from leading magic bytes.
///
/// Recognizes `fLaC`, `OggS`, an `ftyp` box at offset 4, an `ID3` tag, and a
/// bare MPEG audio frame sync (layers I-III; ADTS has layer bits `00` and is
/// not matched).
pub fn sniff(input: &[u8]) -> Option<AudioContainer> {
    let detected = match input {
        [b'f', b'L', b'a', b'C', ..] => Some(AudioContainer::Flac),
        [b'O', b'g', b'g', b'S', ..] => Some(AudioContainer::Vorbis),
        [_, _, _, _, b'f', b't', b'y', b'p', ..] => Some(AudioContainer::Mp4a),
        [b'I', b'D', b'3', ..] => Some(AudioContainer::Mp3),
        [0xFF, second, ..] if second & 0xE0 == 0xE0 && second & 0x06 != 0 => {
            Some(AudioContainer::Mp3)
        }
        _ => None,
    };

    debug!("Sniffed {} input bytes as {:?}", input.len(), detected);
    detected
}
