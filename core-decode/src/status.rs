//! # Status Model
//!
//! The uniform `{status, channel_count, sample_rate}` result contract.
//!
//! Status numbering is per adapter family and is part of the external
//! contract:
//!
//! | Code | Simple family (FLAC, Vorbis, MPEG frames) | Container family (MPEG-4 audio) |
//! |------|-------------------------------------------|---------------------------------|
//! | 0    | ok                                        | ok                              |
//! | 1    | invalid input                             | invalid input                   |
//! | 2    | decode failed                             | open failed                     |
//! | 3    | out of memory                             | stream/decoder open failed      |
//! | 4    | output too large                          | probe failed                    |
//! | 5    |                                           | output format negotiation failed|
//! | 6    |                                           | allocation failed               |
//! | 7    |                                           | read failed                     |
//! | 8    |                                           | empty result                    |
//! | 9    |                                           | temp file write failed          |
//! | 10   |                                           | output too large                |
//! | 100  | unsupported backend                       | unsupported backend             |

use serde::{Deserialize, Serialize};

/// Which numbering a status belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFamily {
    Simple,
    Container,
}

/// Status codes of the single-stage adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum SimpleStatus {
    Ok = 0,
    InvalidInput = 1,
    DecodeFailed = 2,
    OutOfMemory = 3,
    OutputTooLarge = 4,
    UnsupportedBackend = 100,
}

/// Status codes of the staged container-demuxer adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ContainerStatus {
    Ok = 0,
    InvalidInput = 1,
    OpenFailed = 2,
    OpenStreamFailed = 3,
    ProbeFailed = 4,
    NegotiateFailed = 5,
    AllocateFailed = 6,
    ReadFailed = 7,
    Empty = 8,
    TempFileWriteFailed = 9,
    OutputTooLarge = 10,
    UnsupportedBackend = 100,
}

/// A status in its family's numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Simple(SimpleStatus),
    Container(ContainerStatus),
}

impl StatusCode {
    /// The success status of a family.
    pub fn ok(family: StatusFamily) -> Self {
        match family {
            StatusFamily::Simple => StatusCode::Simple(SimpleStatus::Ok),
            StatusFamily::Container => StatusCode::Container(ContainerStatus::Ok),
        }
    }

    /// Numeric value written to `metadata_out[0]`.
    pub fn code(self) -> u32 {
        match self {
            StatusCode::Simple(status) => status as u32,
            StatusCode::Container(status) => status as u32,
        }
    }

    pub fn is_ok(self) -> bool {
        self.code() == 0
    }

    pub fn family(self) -> StatusFamily {
        match self {
            StatusCode::Simple(_) => StatusFamily::Simple,
            StatusCode::Container(_) => StatusFamily::Container,
        }
    }
}

/// Result metadata of one decode call.
///
/// `channels` and `sample_rate` are zero unless `status` is ok.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeMetadata {
    pub status: StatusCode,
    pub channels: u32,
    pub sample_rate: u32,
}

impl DecodeMetadata {
    pub fn success(family: StatusFamily, channels: u32, sample_rate: u32) -> Self {
        Self {
            status: StatusCode::ok(family),
            channels,
            sample_rate,
        }
    }

    pub fn failure(status: StatusCode) -> Self {
        Self {
            status,
            channels: 0,
            sample_rate: 0,
        }
    }

    /// Write into a caller-provided metadata array.
    ///
    /// Index 0 always receives the status; indices 1 and 2 receive channel
    /// count and sample rate only when the array has room for them. Every
    /// slot the array has is written, so stale caller values never survive.
    pub fn write_to(&self, out: &mut [u32]) {
        let values = [self.status.code(), self.channels, self.sample_rate];
        for (slot, value) in out.iter_mut().zip(values) {
            *slot = value;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_contract() {
        assert_eq!(StatusCode::Simple(SimpleStatus::DecodeFailed).code(), 2);
        assert_eq!(StatusCode::Simple(SimpleStatus::OutputTooLarge).code(), 4);
        assert_eq!(StatusCode::Simple(SimpleStatus::UnsupportedBackend).code(), 100);
        assert_eq!(StatusCode::Container(ContainerStatus::NegotiateFailed).code(), 5);
        assert_eq!(StatusCode::Container(ContainerStatus::Empty).code(), 8);
        assert_eq!(StatusCode::Container(ContainerStatus::TempFileWriteFailed).code(), 9);
        assert_eq!(StatusCode::Container(ContainerStatus::UnsupportedBackend).code(), 100);
    }

    #[test]
    fn test_ok_per_family() {
        assert!(StatusCode::ok(StatusFamily::Simple).is_ok());
        assert!(StatusCode::ok(StatusFamily::Container).is_ok());
        assert_eq!(
            StatusCode::ok(StatusFamily::Container).family(),
            StatusFamily::Container
        );
    }

    #[test]
    fn test_write_to_full_array() {
        let meta = DecodeMetadata::success(StatusFamily::Simple, 2, 44100);
        let mut out = [9u32; 3];
        meta.write_to(&mut out);
        assert_eq!(out, [0, 2, 44100]);
    }

    #[test]
    fn test_write_to_respects_short_arrays() {
        let meta = DecodeMetadata::success(StatusFamily::Simple, 2, 44100);

        let mut one = [9u32; 1];
        meta.write_to(&mut one);
        assert_eq!(one, [0]);

        let mut two = [9u32; 2];
        meta.write_to(&mut two);
        assert_eq!(two, [0, 2]);

        let mut none: [u32; 0] = [];
        meta.write_to(&mut none);
    }

    #[test]
    fn test_write_to_leaves_extra_slots() {
        let meta = DecodeMetadata::failure(StatusCode::Container(ContainerStatus::ReadFailed));
        let mut out = [9u32; 5];
        meta.write_to(&mut out);
        assert_eq!(out, [7, 0, 0, 9, 9]);
    }
}
