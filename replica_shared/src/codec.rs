//! Binary wire codec.
//!
//! Goals:
//! - One fixed, byte-exact layout shared by every peer; nothing negotiated.
//! - A paired cursor reader/writer over a contiguous buffer; every advance
//!   is bounds-checked and fails instead of clamping.
//! - Floats travel as their IEEE-754 bit pattern (`f32::to_bits`), never as
//!   a numeric conversion, so NaN/Inf/-0.0 survive the trip.
//!
//! All multi-byte values are little-endian.

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    identity::PeerId,
    math::{Color32, Vec3},
};

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors raised while encoding or decoding a message.
///
/// A codec error is fatal to the message it occurred in, never to the
/// session: the dispatch layer logs it and drops the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A read or write would move the cursor past the buffer end.
    OutOfRange {
        /// Bytes requested by the operation.
        requested: usize,
        /// Bytes remaining in the buffer.
        available: usize,
    },
    /// A string field had an odd byte count or invalid UTF-16 content.
    InvalidString,
    /// An enumeration byte did not name a known variant.
    UnknownOrdinal {
        /// The wire byte.
        value: u8,
        /// The enumeration it was decoded as.
        kind: &'static str,
    },
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfRange {
                requested,
                available,
            } => write!(
                f,
                "attempt to access {requested} bytes with only {available} available"
            ),
            Self::InvalidString => write!(f, "malformed UTF-16 string field"),
            Self::UnknownOrdinal { value, kind } => {
                write!(f, "byte {value} is not a valid {kind} ordinal")
            }
        }
    }
}

impl std::error::Error for CodecError {}

/// An enumeration that travels as a single ordinal byte.
pub trait WireEnum: Sized {
    /// Name used in decode errors.
    const NAME: &'static str;

    fn ordinal(&self) -> u8;
    fn from_ordinal(value: u8) -> Option<Self>;
}

/// Cursor reader over a received message buffer.
///
/// Created per message and discarded once the message is consumed.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current cursor position in bytes.
    pub const fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Advances the cursor and returns the old position.
    fn advance(&mut self, amount: usize) -> CodecResult<usize> {
        if amount > self.remaining() {
            return Err(CodecError::OutOfRange {
                requested: amount,
                available: self.remaining(),
            });
        }
        let old = self.pos;
        self.pos += amount;
        Ok(old)
    }

    fn take(&mut self, amount: usize) -> CodecResult<&'a [u8]> {
        let start = self.advance(amount)?;
        Ok(&self.data[start..start + amount])
    }

    /// One byte; `0xFF` is true, anything else is false.
    pub fn bool(&mut self) -> CodecResult<bool> {
        Ok(self.byte()? == 0xFF)
    }

    /// Eight flags packed into one byte, bit `i` holding flag `i`.
    pub fn bools(&mut self) -> CodecResult<[bool; 8]> {
        let value = self.byte()?;
        let mut flags = [false; 8];
        for (i, flag) in flags.iter_mut().enumerate() {
            *flag = value & (1 << i) != 0;
        }
        Ok(flags)
    }

    pub fn byte(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn bytes(&mut self, amount: usize) -> CodecResult<&'a [u8]> {
        self.take(amount)
    }

    pub fn i32(&mut self) -> CodecResult<i32> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Reinterprets four wire bytes as an IEEE-754 float.
    pub fn f32(&mut self) -> CodecResult<f32> {
        let b = self.take(4)?;
        Ok(f32::from_bits(u32::from_le_bytes([b[0], b[1], b[2], b[3]])))
    }

    /// Length-prefixed UTF-16-LE string; the prefix counts bytes.
    pub fn string(&mut self) -> CodecResult<String> {
        let len = self.i32()?;
        if len < 0 || len % 2 != 0 {
            return Err(CodecError::InvalidString);
        }
        let bytes = self.take(len as usize)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|p| u16::from_le_bytes([p[0], p[1]]))
            .collect();
        String::from_utf16(&units).map_err(|_| CodecError::InvalidString)
    }

    pub fn vector(&mut self) -> CodecResult<Vec3> {
        Ok(Vec3::new(self.f32()?, self.f32()?, self.f32()?))
    }

    pub fn color(&mut self) -> CodecResult<Color32> {
        Ok(Color32 {
            r: self.byte()?,
            g: self.byte()?,
            b: self.byte()?,
            a: self.byte()?,
        })
    }

    /// Eight bytes interpreted as an opaque unsigned 64-bit identifier.
    pub fn u64(&mut self) -> CodecResult<u64> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// An identifier naming a session participant.
    pub fn id(&mut self) -> CodecResult<PeerId> {
        Ok(PeerId::from_u64(self.u64()?))
    }

    /// Single-byte enumeration ordinal.
    pub fn enum_of<T: WireEnum>(&mut self) -> CodecResult<T> {
        let value = self.byte()?;
        T::from_ordinal(value).ok_or(CodecError::UnknownOrdinal {
            value,
            kind: T::NAME,
        })
    }
}

/// Cursor writer producing a message buffer.
///
/// The capacity given at construction is a hard limit: a write that would
/// exceed it fails, mirroring the reader's bounds discipline.
#[derive(Debug)]
pub struct Writer {
    buf: BytesMut,
    limit: usize,
}

impl Writer {
    pub fn with_capacity(limit: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(limit),
            limit,
        }
    }

    /// Current cursor position in bytes.
    pub fn position(&self) -> usize {
        self.buf.len()
    }

    /// Runs `fill` against a fresh writer and returns the finished buffer.
    pub fn message(
        capacity: usize,
        fill: impl FnOnce(&mut Writer) -> CodecResult<()>,
    ) -> CodecResult<Bytes> {
        let mut w = Self::with_capacity(capacity);
        fill(&mut w)?;
        Ok(w.finish())
    }

    /// Freezes the written bytes for handoff to the transport.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }

    fn ensure(&mut self, amount: usize) -> CodecResult<()> {
        let available = self.limit - self.buf.len();
        if amount > available {
            return Err(CodecError::OutOfRange {
                requested: amount,
                available,
            });
        }
        Ok(())
    }

    pub fn bool(&mut self, value: bool) -> CodecResult<()> {
        self.byte(if value { 0xFF } else { 0x00 })
    }

    /// Packs eight flags into one byte, bit `i` holding flag `i`.
    pub fn bools(&mut self, flags: [bool; 8]) -> CodecResult<()> {
        let mut value = 0u8;
        for (i, flag) in flags.iter().enumerate() {
            if *flag {
                value |= 1 << i;
            }
        }
        self.byte(value)
    }

    pub fn byte(&mut self, value: u8) -> CodecResult<()> {
        self.ensure(1)?;
        self.buf.put_u8(value);
        Ok(())
    }

    pub fn bytes(&mut self, value: &[u8]) -> CodecResult<()> {
        self.ensure(value.len())?;
        self.buf.extend_from_slice(value);
        Ok(())
    }

    pub fn i32(&mut self, value: i32) -> CodecResult<()> {
        self.bytes(&value.to_le_bytes())
    }

    /// Writes the IEEE-754 bit pattern of the float.
    pub fn f32(&mut self, value: f32) -> CodecResult<()> {
        self.bytes(&value.to_bits().to_le_bytes())
    }

    /// Length-prefixed UTF-16-LE string; the prefix counts bytes.
    pub fn string(&mut self, value: &str) -> CodecResult<()> {
        let units: Vec<u16> = value.encode_utf16().collect();
        self.i32((units.len() * 2) as i32)?;
        for unit in units {
            self.bytes(&unit.to_le_bytes())?;
        }
        Ok(())
    }

    pub fn vector(&mut self, value: Vec3) -> CodecResult<()> {
        self.f32(value.x)?;
        self.f32(value.y)?;
        self.f32(value.z)
    }

    pub fn color(&mut self, value: Color32) -> CodecResult<()> {
        self.byte(value.r)?;
        self.byte(value.g)?;
        self.byte(value.b)?;
        self.byte(value.a)
    }

    /// Eight bytes; the identifier's 64-bit pattern, sign-agnostic.
    pub fn u64(&mut self, value: u64) -> CodecResult<()> {
        self.bytes(&value.to_le_bytes())
    }

    /// An identifier naming a session participant.
    pub fn id(&mut self, value: PeerId) -> CodecResult<()> {
        self.u64(value.as_u64())
    }

    /// Single-byte enumeration ordinal.
    pub fn enum_of<T: WireEnum>(&mut self, value: &T) -> CodecResult<()> {
        self.byte(value.ordinal())
    }
}
