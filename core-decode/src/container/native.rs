//! AudioToolbox container backend (macOS).
//!
//! Reads the input through `AudioFileOpenWithCallbacks` straight from memory,
//! wraps it in an `ExtAudioFile`, asks for 16-bit signed packed interleaved
//! output at the source rate and channel count, and pulls fixed-size chunks
//! until a read returns zero frames.

#![allow(unsafe_code)]
#![allow(non_camel_case_types)]
#![allow(non_upper_case_globals)]
#![allow(non_snake_case)]

use crate::buffer::PcmBuffer;
use crate::chunks::{pull_chunks, Pull};
use crate::config::DecodeConfig;
use crate::decoder::DecodedAudio;
use crate::error::ContainerError;
use std::ffi::c_void;
use std::mem::size_of;
use std::ptr;
use tracing::{debug, warn};

type OSStatus = i32;
type AudioFileID = *mut c_void;
type ExtAudioFileRef = *mut c_void;
type AudioFileTypeID = u32;
type ExtAudioFilePropertyID = u32;
type AudioFormatID = u32;
type AudioFormatFlags = u32;
type UInt32 = u32;
type SInt64 = i64;
type Float64 = f64;
type Boolean = u8;

const noErr: OSStatus = 0;
const kAudio_ParamError: OSStatus = -50;

const kAudioFileM4AType: AudioFileTypeID = 0x6d346166; // 'm4af'
const kExtAudioFileProperty_FileDataFormat: ExtAudioFilePropertyID = 0x66666d74; // 'ffmt'
const kExtAudioFileProperty_ClientDataFormat: ExtAudioFilePropertyID = 0x63666d74; // 'cfmt'

const kAudioFormatLinearPCM: AudioFormatID = 0x6c70636d; // 'lpcm'
const kAudioFormatFlagIsSignedInteger: AudioFormatFlags = 1 << 2;
const kAudioFormatFlagIsPacked: AudioFormatFlags = 1 << 3;

#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct AudioStreamBasicDescription {
    mSampleRate: Float64,
    mFormatID: AudioFormatID,
    mFormatFlags: AudioFormatFlags,
    mBytesPerPacket: UInt32,
    mFramesPerPacket: UInt32,
    mBytesPerFrame: UInt32,
    mChannelsPerFrame: UInt32,
    mBitsPerChannel: UInt32,
    mReserved: UInt32,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
struct AudioBuffer {
    mNumberChannels: UInt32,
    mDataByteSize: UInt32,
    mData: *mut c_void,
}

#[repr(C)]
struct AudioBufferList {
    mNumberBuffers: UInt32,
    mBuffers: [AudioBuffer; 1],
}

type AudioFile_ReadProc = extern "C" fn(
    inClientData: *mut c_void,
    inPosition: SInt64,
    requestCount: UInt32,
    buffer: *mut c_void,
    actualCount: *mut UInt32,
) -> OSStatus;

type AudioFile_WriteProc = extern "C" fn(
    inClientData: *mut c_void,
    inPosition: SInt64,
    requestCount: UInt32,
    buffer: *const c_void,
    actualCount: *mut UInt32,
) -> OSStatus;

type AudioFile_GetSizeProc = extern "C" fn(inClientData: *mut c_void) -> SInt64;

type AudioFile_SetSizeProc = extern "C" fn(inClientData: *mut c_void, inSize: SInt64) -> OSStatus;

#[link(name = "AudioToolbox", kind = "framework")]
extern "C" {
    fn AudioFileOpenWithCallbacks(
        inClientData: *mut c_void,
        inReadFunc: AudioFile_ReadProc,
        inWriteFunc: Option<AudioFile_WriteProc>,
        inGetSizeFunc: AudioFile_GetSizeProc,
        inSetSizeFunc: Option<AudioFile_SetSizeProc>,
        inFileTypeHint: AudioFileTypeID,
        outAudioFile: *mut AudioFileID,
    ) -> OSStatus;

    fn AudioFileClose(inAudioFile: AudioFileID) -> OSStatus;

    fn ExtAudioFileWrapAudioFileID(
        inFileID: AudioFileID,
        inForWriting: Boolean,
        outExtAudioFile: *mut ExtAudioFileRef,
    ) -> OSStatus;

    fn ExtAudioFileGetProperty(
        inExtAudioFile: ExtAudioFileRef,
        inPropertyID: ExtAudioFilePropertyID,
        ioPropertyDataSize: *mut UInt32,
        outPropertyData: *mut c_void,
    ) -> OSStatus;

    fn ExtAudioFileSetProperty(
        inExtAudioFile: ExtAudioFileRef,
        inPropertyID: ExtAudioFilePropertyID,
        inPropertyDataSize: UInt32,
        inPropertyData: *const c_void,
    ) -> OSStatus;

    fn ExtAudioFileRead(
        inExtAudioFile: ExtAudioFileRef,
        ioNumberFrames: *mut UInt32,
        ioData: *mut AudioBufferList,
    ) -> OSStatus;

    fn ExtAudioFileDispose(inExtAudioFile: ExtAudioFileRef) -> OSStatus;
}

fn os_status_to_string(status: OSStatus) -> String {
    let bytes = status.to_be_bytes();
    if bytes.iter().all(|&b| b.is_ascii_graphic() || b == b' ') {
        let s: String = bytes.iter().map(|&b| b as char).collect();
        format!("'{}' ({})", s, status)
    } else {
        format!("{}", status)
    }
}

/// Read-only view of the input handed to AudioToolbox as client data.
struct MemoryFile<'a> {
    data: &'a [u8],
}

extern "C" fn read_proc(
    client_data: *mut c_void,
    position: SInt64,
    request_count: UInt32,
    buffer: *mut c_void,
    actual_count: *mut UInt32,
) -> OSStatus {
    if client_data.is_null() || buffer.is_null() || actual_count.is_null() {
        return kAudio_ParamError;
    }

    // SAFETY: client_data is the MemoryFile passed to AudioFileOpenWithCallbacks,
    // which outlives the AudioFileID; buffer holds request_count bytes.
    let file = unsafe { &*(client_data as *const MemoryFile<'_>) };
    let len = file.data.len() as u64;

    let to_copy = if position < 0 || position as u64 >= len {
        0
    } else {
        let available = len - position as u64;
        (request_count as u64).min(available) as usize
    };

    if to_copy > 0 {
        let start = position as usize;
        unsafe {
            ptr::copy_nonoverlapping(file.data[start..].as_ptr(), buffer as *mut u8, to_copy);
        }
    }

    unsafe {
        *actual_count = to_copy as UInt32;
    }
    noErr
}

extern "C" fn get_size_proc(client_data: *mut c_void) -> SInt64 {
    if client_data.is_null() {
        return 0;
    }
    // SAFETY: see read_proc.
    let file = unsafe { &*(client_data as *const MemoryFile<'_>) };
    file.data.len() as SInt64
}

/// Closes the `AudioFileID`. Disposing a wrapping `ExtAudioFile` does not.
struct AudioFileGuard(AudioFileID);

impl Drop for AudioFileGuard {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe {
                AudioFileClose(self.0);
            }
        }
    }
}

struct ExtAudioFileGuard(ExtAudioFileRef);

impl Drop for ExtAudioFileGuard {
    fn drop(&mut self) {
        if !self.0.is_null() {
            unsafe {
                ExtAudioFileDispose(self.0);
            }
        }
    }
}

fn open_with_hint(memory: &MemoryFile<'_>, hint: AudioFileTypeID) -> Result<AudioFileGuard, OSStatus> {
    let mut audio_file: AudioFileID = ptr::null_mut();
    let status = unsafe {
        AudioFileOpenWithCallbacks(
            memory as *const MemoryFile<'_> as *mut c_void,
            read_proc,
            None,
            get_size_proc,
            None,
            hint,
            &mut audio_file,
        )
    };

    if status != noErr || audio_file.is_null() {
        return Err(status);
    }
    Ok(AudioFileGuard(audio_file))
}

/// Decode MPEG-4 audio with AudioToolbox.
pub fn decode(input: &[u8], config: &DecodeConfig) -> Result<DecodedAudio, ContainerError> {
    let memory = MemoryFile { data: input };

    // Open as M4A first, then let AudioToolbox detect the type.
    let audio_file = open_with_hint(&memory, kAudioFileM4AType)
        .or_else(|status| {
            debug!(
                "M4A open failed ({}), retrying with type detection",
                os_status_to_string(status)
            );
            open_with_hint(&memory, 0)
        })
        .map_err(|status| {
            let err = os_status_to_string(status);
            warn!(status, err = %err, "AudioFileOpenWithCallbacks failed");
            ContainerError::Open(format!("AudioFileOpenWithCallbacks failed: {}", err))
        })?;

    let mut ext_ref: ExtAudioFileRef = ptr::null_mut();
    let status = unsafe { ExtAudioFileWrapAudioFileID(audio_file.0, 0, &mut ext_ref) };
    // Declared after audio_file so it is disposed first.
    let ext_file = ExtAudioFileGuard(ext_ref);
    if status != noErr || ext_ref.is_null() {
        let err = os_status_to_string(status);
        warn!(status, err = %err, "ExtAudioFileWrapAudioFileID failed");
        return Err(ContainerError::OpenStream(format!(
            "ExtAudioFileWrapAudioFileID failed: {}",
            err
        )));
    }

    let mut file_format = AudioStreamBasicDescription::default();
    let mut size = size_of::<AudioStreamBasicDescription>() as UInt32;
    let status = unsafe {
        ExtAudioFileGetProperty(
            ext_file.0,
            kExtAudioFileProperty_FileDataFormat,
            &mut size,
            &mut file_format as *mut AudioStreamBasicDescription as *mut c_void,
        )
    };
    if status != noErr || file_format.mChannelsPerFrame == 0 || file_format.mSampleRate <= 0.0 {
        warn!(
            status,
            channels = file_format.mChannelsPerFrame,
            rate = file_format.mSampleRate,
            "Failed to read source data format"
        );
        return Err(ContainerError::Probe(format!(
            "source format unavailable: {}",
            os_status_to_string(status)
        )));
    }

    let channels = file_format.mChannelsPerFrame;
    let bytes_per_frame = channels
        .checked_mul(size_of::<i16>() as u32)
        .ok_or_else(|| ContainerError::Negotiate(format!("{} channels", channels)))?;
    let client_format = AudioStreamBasicDescription {
        mSampleRate: file_format.mSampleRate,
        mFormatID: kAudioFormatLinearPCM,
        mFormatFlags: kAudioFormatFlagIsSignedInteger | kAudioFormatFlagIsPacked,
        mBytesPerPacket: bytes_per_frame,
        mFramesPerPacket: 1,
        mBytesPerFrame: bytes_per_frame,
        mChannelsPerFrame: channels,
        mBitsPerChannel: 16,
        mReserved: 0,
    };

    let status = unsafe {
        ExtAudioFileSetProperty(
            ext_file.0,
            kExtAudioFileProperty_ClientDataFormat,
            size_of::<AudioStreamBasicDescription>() as UInt32,
            &client_format as *const AudioStreamBasicDescription as *const c_void,
        )
    };
    if status != noErr {
        let err = os_status_to_string(status);
        warn!(status, err = %err, "Failed to set 16-bit client format");
        return Err(ContainerError::Negotiate(format!(
            "client format rejected: {}",
            err
        )));
    }

    let sample_rate = (file_format.mSampleRate + 0.5) as u32;
    debug!(
        "AudioToolbox output: {} channels @ {} Hz, {} frames per read",
        channels, sample_rate, config.chunk_frames
    );

    let chunk_samples = config.chunk_samples(channels);
    let frames_per_read = UInt32::try_from(config.chunk_frames).map_err(|_| ContainerError::Allocate)?;
    let chunk_bytes = chunk_samples
        .checked_mul(size_of::<i16>())
        .and_then(|bytes| UInt32::try_from(bytes).ok())
        .ok_or(ContainerError::Allocate)?;

    let mut scratch: Vec<i16> = Vec::new();
    scratch.try_reserve_exact(chunk_samples).map_err(|_| {
        warn!("Failed to allocate {} sample chunk buffer", chunk_samples);
        ContainerError::Allocate
    })?;

    let mut samples = PcmBuffer::with_limits(config.initial_capacity_samples, config.max_output_samples);

    pull_chunks(&mut samples, &mut scratch, |out: &mut Vec<i16>| {
        // Capacity was reserved up front; this does not allocate.
        out.resize(chunk_samples, 0);

        let mut frames = frames_per_read;
        let mut buffers = AudioBufferList {
            mNumberBuffers: 1,
            mBuffers: [AudioBuffer {
                mNumberChannels: channels,
                mDataByteSize: chunk_bytes,
                mData: out.as_mut_ptr() as *mut c_void,
            }],
        };

        let status = unsafe { ExtAudioFileRead(ext_file.0, &mut frames, &mut buffers) };
        if status != noErr {
            out.clear();
            let err = os_status_to_string(status);
            warn!(status, err = %err, "ExtAudioFileRead failed");
            return Err(ContainerError::Read(format!("ExtAudioFileRead failed: {}", err)));
        }

        if frames == 0 {
            out.clear();
            return Ok(Pull::End);
        }

        let produced = (frames as usize).saturating_mul(channels as usize).min(chunk_samples);
        out.truncate(produced);
        Ok(Pull::Chunk)
    })?;

    drop(ext_file);
    drop(audio_file);

    if samples.is_empty() {
        warn!("AudioToolbox decoded no samples");
        return Err(ContainerError::Empty);
    }

    Ok(DecodedAudio {
        samples,
        channels,
        sample_rate,
    })
}
