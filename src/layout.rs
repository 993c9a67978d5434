//! Platform tcp_info layouts
//!
//! The decoder never casts the raw buffer to a struct. Instead each
//! supported platform describes its `tcp_info` structure as a table of
//! byte offsets ([`FieldTable`]) and the decoder reads every field through
//! bounds-checked accessors ([`RawTcpInfo`]).
//!
//! # Adding a platform
//!
//! 1. Create a submodule (see `linux.rs`)
//! 2. Define a unit type implementing [`TcpInfoLayout`]
//! 3. Fill in `SIZE` and `FIELDS` from the platform's kernel header
//!
//! The decoding algorithm itself stays untouched; only the table changes.
//!
//! # Byte Order
//!
//! `tcp_info` is written by the local kernel, so multi-byte fields are in
//! host byte order (`from_ne_bytes`).

use crate::error::Malformed;

pub mod linux;

pub use linux::LinuxLayout;

/// Layout selected at build time
///
/// Linux is the only layout modeled so far.
pub type DefaultLayout = LinuxLayout;

// ============================================================================
// FIELD DESCRIPTORS
// ============================================================================

/// One-byte field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteField {
    pub name: &'static str,
    pub offset: usize,
}

/// Four-byte unsigned field (host byte order)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WordField {
    pub name: &'static str,
    pub offset: usize,
}

/// Two 4-bit values packed into one byte
///
/// `local_shift` and `peer_shift` are the right-shift amounts applied
/// before masking with `0x0f`. Linux puts the local (receive) scale in
/// the high nibble and the peer (send) scale in the low nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NibblePair {
    pub byte: ByteField,
    pub local_shift: u32,
    pub peer_shift: u32,
}

impl NibblePair {
    pub const MASK: u8 = 0x0f;

    /// Splits a packed byte into `(local, peer)`
    pub fn split(&self, packed: u8) -> (u8, u8) {
        (
            (packed >> self.local_shift) & Self::MASK,
            (packed >> self.peer_shift) & Self::MASK,
        )
    }
}

/// Bits of the `tcpi_options` byte that the decoder looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptionBits {
    pub timestamps: u8,
    pub window_scale: u8,
}

/// Offsets of every field the decoder reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTable {
    // === State and options ===
    pub state: ByteField,
    pub ca_state: ByteField,
    pub options: ByteField,
    pub option_bits: OptionBits,
    pub wscale: NibblePair,

    // === Timers (μs) ===
    pub rto: WordField,
    pub ato: WordField,

    // === MSS ===
    pub snd_mss: WordField,
    pub rcv_mss: WordField,

    // === Segment counts ===
    pub unacked: WordField,
    pub sacked: WordField,
    pub lost: WordField,
    pub retrans: WordField,
    pub fackets: WordField,

    // === Elapsed times (ms) ===
    pub last_data_sent: WordField,
    pub last_data_recv: WordField,
    pub last_ack_recv: WordField,

    // === Congestion metrics ===
    pub rcv_ssthresh: WordField,
    pub rtt: WordField,    // μs
    pub rttvar: WordField, // μs
    pub snd_ssthresh: WordField,
    pub snd_cwnd: WordField,
    pub advmss: WordField,
    pub rcv_space: WordField,
}

impl FieldTable {
    /// Every word field in the table, for validation
    pub fn words(&self) -> [WordField; 19] {
        [
            self.rto,
            self.ato,
            self.snd_mss,
            self.rcv_mss,
            self.unacked,
            self.sacked,
            self.lost,
            self.retrans,
            self.fackets,
            self.last_data_sent,
            self.last_data_recv,
            self.last_ack_recv,
            self.rcv_ssthresh,
            self.rtt,
            self.rttvar,
            self.snd_ssthresh,
            self.snd_cwnd,
            self.advmss,
            self.rcv_space,
        ]
    }

    pub fn bytes(&self) -> [ByteField; 4] {
        [self.state, self.ca_state, self.options, self.wscale.byte]
    }

    /// One past the last byte any field touches
    pub fn extent(&self) -> usize {
        let words = self.words().iter().map(|f| f.offset + 4).max().unwrap_or(0);
        let bytes = self.bytes().iter().map(|f| f.offset + 1).max().unwrap_or(0);
        words.max(bytes)
    }
}

// ============================================================================
// LAYOUT TRAIT
// ============================================================================

/// A platform's fixed-size `tcp_info` structure
///
/// Implementors are unit types; everything is associated constants so the
/// layout is chosen at compile time.
pub trait TcpInfoLayout {
    /// Short name for diagnostics (`"linux"`)
    const NAME: &'static str;

    /// Exact size of the structure in bytes
    const SIZE: usize;

    /// Offsets of the decoded fields
    const FIELDS: FieldTable;
}

// ============================================================================
// CHECKED READER
// ============================================================================

/// Bounds-checked view over a raw tcp_info buffer
///
/// Every accessor returns `Malformed::FieldOutOfBounds` instead of
/// panicking when a field would run past the end of the buffer.
#[derive(Debug, Clone, Copy)]
pub struct RawTcpInfo<'a> {
    data: &'a [u8],
}

impl<'a> RawTcpInfo<'a> {
    /// Wraps `data` after checking it is exactly `L::SIZE` bytes long
    pub fn new<L: TcpInfoLayout>(data: &'a [u8]) -> Result<Self, Malformed> {
        if data.len() != L::SIZE {
            return Err(Malformed::LengthMismatch {
                expected: L::SIZE,
                actual: data.len(),
            });
        }
        Ok(Self { data })
    }

    pub fn byte(&self, field: ByteField) -> Result<u8, Malformed> {
        self.data
            .get(field.offset)
            .copied()
            .ok_or(Malformed::FieldOutOfBounds {
                field: field.name,
                offset: field.offset,
            })
    }

    pub fn word(&self, field: WordField) -> Result<u32, Malformed> {
        let out_of_bounds = Malformed::FieldOutOfBounds {
            field: field.name,
            offset: field.offset,
        };
        let end = field.offset.checked_add(4).ok_or(out_of_bounds.clone())?;
        let bytes: [u8; 4] = self
            .data
            .get(field.offset..end)
            .and_then(|s| s.try_into().ok())
            .ok_or(out_of_bounds)?;
        Ok(u32::from_ne_bytes(bytes))
    }

    /// Reads a packed nibble byte as `(local, peer)`
    pub fn nibbles(&self, pair: NibblePair) -> Result<(u8, u8), Malformed> {
        Ok(pair.split(self.byte(pair.byte)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tiny;

    impl TcpInfoLayout for Tiny {
        const NAME: &'static str = "tiny";
        const SIZE: usize = 8;
        const FIELDS: FieldTable = LinuxLayout::FIELDS;
    }

    #[test]
    fn test_nibble_split_high_is_local() {
        let pair = LinuxLayout::FIELDS.wscale;
        assert_eq!(pair.split(0x53), (5, 3));
        assert_eq!(pair.split(0xf0), (15, 0));
        assert_eq!(pair.split(0x0e), (0, 14));
    }

    #[test]
    fn test_reader_rejects_wrong_length() {
        let data = [0u8; 7];
        assert_eq!(
            RawTcpInfo::new::<Tiny>(&data).unwrap_err(),
            Malformed::LengthMismatch {
                expected: 8,
                actual: 7
            }
        );
    }

    #[test]
    fn test_reader_reports_field_past_end() {
        let data = [0u8; 8];
        let raw = RawTcpInfo::new::<Tiny>(&data).unwrap();

        // tcpi_rto sits at 8..12, one word past this layout's end
        let err = raw.word(Tiny::FIELDS.rto).unwrap_err();
        assert_eq!(
            err,
            Malformed::FieldOutOfBounds {
                field: "tcpi_rto",
                offset: 8
            }
        );
        assert_eq!(raw.byte(Tiny::FIELDS.state), Ok(0));
    }

    #[test]
    fn test_word_reads_native_endian() {
        let mut data = [0u8; 8];
        data[4..8].copy_from_slice(&0xdead_beefu32.to_ne_bytes());
        let raw = RawTcpInfo::new::<Tiny>(&data).unwrap();
        let field = WordField {
            name: "probe",
            offset: 4,
        };
        assert_eq!(raw.word(field), Ok(0xdead_beef));
    }

    #[test]
    fn test_word_offset_overflow_is_an_error() {
        let data = [0u8; 8];
        let raw = RawTcpInfo::new::<Tiny>(&data).unwrap();
        let field = WordField {
            name: "bogus",
            offset: usize::MAX - 1,
        };
        assert!(matches!(
            raw.word(field),
            Err(Malformed::FieldOutOfBounds { field: "bogus", .. })
        ));
    }
}
