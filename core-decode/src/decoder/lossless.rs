//! FLAC adapter over the shared symphonia primitive.

use crate::config::DecodeConfig;
use crate::decoder::symphonia::decode_entire;
use crate::decoder::{DecodeAll, DecodedAudio};
use crate::error::DecodeError;
use crate::format::AudioContainer;

/// Native FLAC streams, decoded in one pass by the bundled FLAC reader.
#[derive(Debug, Clone, Copy, Default)]
pub struct LosslessAdapter;

impl DecodeAll for LosslessAdapter {
    type Error = DecodeError;

    fn decode_all(&self, input: &[u8], config: &DecodeConfig) -> Result<DecodedAudio, DecodeError> {
        decode_entire(input, AudioContainer::Flac, config)
    }
}
