//! Fixture synthesis shared by the integration tests.

#![allow(dead_code)]

pub const FLAC_BLOCK: usize = 1000;

/// Deterministic stereo test signal. Values stay in 256..16256 so no byte
/// pair in the encoded frames can look like a FLAC frame sync.
pub fn stereo_signal(frames: usize) -> Vec<(i16, i16)> {
    (0..frames)
        .map(|i| {
            let left = 256 + ((i * 37) % 16000) as i16;
            let right = 256 + ((i * 53 + 5000) % 16000) as i16;
            (left, right)
        })
        .collect()
}

/// Interleave a stereo signal and encode it as little-endian bytes.
pub fn interleaved_le(signal: &[(i16, i16)]) -> Vec<u8> {
    signal
        .iter()
        .flat_map(|&(l, r)| {
            let mut pair = [0u8; 4];
            pair[..2].copy_from_slice(&l.to_le_bytes());
            pair[2..].copy_from_slice(&r.to_le_bytes());
            pair
        })
        .collect()
}

pub fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 { (crc << 1) ^ 0x07 } else { crc << 1 };
        }
    }
    crc
}

pub fn crc16(data: &[u8]) -> u16 {
    let mut crc = 0u16;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 { (crc << 1) ^ 0x8005 } else { crc << 1 };
        }
    }
    crc
}

/// `fLaC` marker plus a single (last) STREAMINFO block.
pub fn flac_header(block: u16, sample_rate: u32, channels: u8, bits: u8, total_frames: u64) -> Vec<u8> {
    let mut out = b"fLaC".to_vec();
    out.push(0x80); // last block, type STREAMINFO
    out.extend_from_slice(&[0x00, 0x00, 34]);
    out.extend_from_slice(&block.to_be_bytes());
    out.extend_from_slice(&block.to_be_bytes());
    out.extend_from_slice(&[0u8; 3]); // min frame size unknown
    out.extend_from_slice(&[0u8; 3]); // max frame size unknown

    let packed = (u64::from(sample_rate) << 44)
        | (u64::from(channels - 1) << 41)
        | (u64::from(bits - 1) << 36)
        | (total_frames & 0xF_FFFF_FFFF);
    out.extend_from_slice(&packed.to_be_bytes());
    out.extend_from_slice(&[0u8; 16]); // MD5 unset
    out
}

/// One fixed-blocksize frame with two verbatim 16-bit subframes at 44.1 kHz.
pub fn flac_frame(number: u8, block: &[(i16, i16)]) -> Vec<u8> {
    assert!(number < 0x80, "single-byte frame numbers only");

    let mut frame = vec![
        0xFF, 0xF8, // sync, fixed blocksize
        0x79, // blocksize from 16-bit field, 44.1 kHz
        0x18, // independent stereo, 16 bits per sample
        number,
    ];
    frame.extend_from_slice(&((block.len() - 1) as u16).to_be_bytes());
    frame.push(crc8(&frame));

    frame.push(0x02); // verbatim subframe, no wasted bits
    for &(left, _) in block {
        frame.extend_from_slice(&left.to_be_bytes());
    }
    frame.push(0x02);
    for &(_, right) in block {
        frame.extend_from_slice(&right.to_be_bytes());
    }

    let crc = crc16(&frame);
    frame.extend_from_slice(&crc.to_be_bytes());
    frame
}

/// Complete 2-channel 44.1 kHz 16-bit FLAC stream for `signal`.
pub fn flac_stereo(signal: &[(i16, i16)]) -> Vec<u8> {
    flac_stereo_declaring(signal.len() as u64, signal)
}

/// Like [`flac_stereo`], but STREAMINFO declares `total_frames` instead of
/// the real length.
pub fn flac_stereo_declaring(total_frames: u64, signal: &[(i16, i16)]) -> Vec<u8> {
    let mut out = flac_header(FLAC_BLOCK as u16, 44100, 2, 16, total_frames);
    for (number, block) in signal.chunks(FLAC_BLOCK).enumerate() {
        out.extend_from_slice(&flac_frame(number as u8, block));
    }
    out
}

/// MPEG-1 Layer III frames, 128 kbit/s, 44.1 kHz, stereo, all-zero payload.
pub fn silent_mp3(frames: usize) -> Vec<u8> {
    let mut frame = vec![0u8; 417];
    frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
    frame.repeat(frames)
}

/// Ogg Vorbis, 2 channels at 44.1 kHz: 40 silent short blocks behind
/// minimal identification, comment and setup headers.
pub const SILENCE_STEREO_OGG: &[u8] = include_bytes!("../fixtures/silence_stereo.ogg");

/// MPEG-4 audio, one AAC-LC track, mono at 44.1 kHz: 20 silent frames.
pub const SILENCE_MONO_M4A: &[u8] = include_bytes!("../fixtures/silence_mono.m4a");
