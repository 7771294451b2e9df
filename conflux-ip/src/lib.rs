//! Information-packet (IP) framing for the Conflux wire protocol.
//!
//! Every IP crossing a connection is a two-frame multipart message: a
//! 1-byte type tag followed by an opaque payload. Three tags exist —
//! data, open-bracket, close-bracket — and brackets always carry an
//! empty payload.

use thiserror::Error;

/// The three IP type tags, as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IpType {
    Data = 0x00,
    OpenBracket = 0x01,
    CloseBracket = 0x02,
}

impl IpType {
    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x00 => Some(IpType::Data),
            0x01 => Some(IpType::OpenBracket),
            0x02 => Some(IpType::CloseBracket),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IpError {
    #[error("information packet must have exactly 2 frames, got {0}")]
    WrongFrameCount(usize),
    #[error("information packet tag frame must be exactly 1 byte, got {0}")]
    WrongTagLength(usize),
    #[error("unknown information-packet type tag: {0:#04x}")]
    UnknownTag(u8),
}

/// A parsed, owned information packet: a type tag plus its payload frame.
///
/// `Ip` is the in-memory counterpart of the two wire frames `[tag, payload]`.
/// Bracket IPs carry an empty payload by construction; a non-empty payload
/// observed on a bracket frame from the wire is not an error (§4.1) and is
/// simply ignored by `payload()`/`into_payload()` callers that don't look at it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ip {
    ty: IpType,
    payload: Vec<u8>,
}

impl Ip {
    /// `new_packet(bytes) = [0x00, bytes]`
    pub fn new_packet(payload: impl Into<Vec<u8>>) -> Self {
        Ip {
            ty: IpType::Data,
            payload: payload.into(),
        }
    }

    /// `new_open() = [0x01, empty]`
    pub fn new_open() -> Self {
        Ip {
            ty: IpType::OpenBracket,
            payload: Vec::new(),
        }
    }

    /// `new_close() = [0x02, empty]`
    pub fn new_close() -> Self {
        Ip {
            ty: IpType::CloseBracket,
            payload: Vec::new(),
        }
    }

    pub fn ip_type(&self) -> IpType {
        self.ty
    }

    pub fn is_packet(&self) -> bool {
        self.ty == IpType::Data
    }

    pub fn is_open(&self) -> bool {
        self.ty == IpType::OpenBracket
    }

    pub fn is_close(&self) -> bool {
        self.ty == IpType::CloseBracket
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn into_payload(self) -> Vec<u8> {
        self.payload
    }

    /// Serialize to the two wire frames `[tag, payload]`.
    pub fn to_frames(&self) -> [Vec<u8>; 2] {
        [vec![self.ty as u8], self.payload.clone()]
    }

    /// Validate and decode two received wire frames into an `Ip`.
    ///
    /// A frame count other than 2, or a tag frame whose length is not
    /// exactly 1, makes the IP invalid. An unrecognized tag is likewise
    /// invalid and must be dropped by the receiver rather than surfaced
    /// as a different error — callers that need to distinguish "unknown
    /// tag" from "malformed frame" can still match on `IpError::UnknownTag`.
    pub fn from_frames(frames: &[Vec<u8>]) -> Result<Self, IpError> {
        if frames.len() != 2 {
            return Err(IpError::WrongFrameCount(frames.len()));
        }
        let tag_frame = &frames[0];
        if tag_frame.len() != 1 {
            return Err(IpError::WrongTagLength(tag_frame.len()));
        }
        let tag = tag_frame[0];
        let ty = IpType::from_tag(tag).ok_or(IpError::UnknownTag(tag))?;
        Ok(Ip {
            ty,
            payload: frames[1].clone(),
        })
    }

    /// `true` iff `frames` would decode as a well-formed IP (§4.1 "valid").
    pub fn is_valid_frames(frames: &[Vec<u8>]) -> bool {
        frames.len() == 2 && frames[0].len() == 1
    }
}
