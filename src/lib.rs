// ============================================================================
// TCP_INFO DECODER LIBRARY
// ============================================================================
// This library turns the kernel's per-connection `tcp_info` snapshot into a
// typed data model: named connection state, negotiated options, durations
// in real units, congestion-control and segment counters.
//
// === KEY FEATURES ===
// 1. Decode a raw `tcp_info` buffer with bounds-checked offset reads
// 2. Split the packed window-scale byte into local/peer shift values
// 3. Map the raw state index through a checked 12-entry table
// 4. Convert ms/μs fields into `std::time::Duration` exactly
// 5. Plug in any socket-option reader through `RawTcpInfoSource`
//
// === WHAT IS NOT HERE ===
// Opening sockets and calling getsockopt() belong to the caller. This crate
// starts from the bytes the OS returned.
//
// === THREAD SAFETY ===
// Decoding is a pure function of its input buffer. No globals, no caches,
// no locks: call it from as many threads as you like.

// === MODULE DECLARATIONS ===
pub mod acquire; // RawTcpInfoSource + fetch_info (acquire-then-decode)
pub mod error; // TcpInfoError / Malformed
pub mod layout; // Platform layouts (offset tables)
pub mod model; // Info, CongestionControl, SysInfo, ...
pub mod translate; // Raw buffer -> Info

// === PUBLIC RE-EXPORTS ===
// Users can write `use tcpinfo::{parse_tcp_info, Info};`
pub use acquire::{fetch_info, fetch_tcp_info, RawTcpInfoSource, SockoptKey};
pub use error::{Malformed, TcpInfoError};
pub use layout::{DefaultLayout, LinuxLayout, TcpInfoLayout};
pub use model::{
    CaState, CongestionControl, ConnectionState, Info, MaxSegSize, NegotiatedOption, OptionKind,
    SysInfo,
};
pub use translate::{parse_tcp_info, parse_tcp_info_with};
