//! Acquiring the raw tcp_info structure
//!
//! Reading `TCP_INFO` from a live socket is the caller's job. This module
//! only defines the interface the caller plugs in ([`RawTcpInfoSource`])
//! and the glue that runs acquire-then-decode ([`fetch_info`]).
//!
//! On Linux a source is typically a thin wrapper around:
//!
//! ```text
//! getsockopt(fd, IPPROTO_TCP, TCP_INFO, buf, &len)
//! ```
//!
//! with `len` written back as the number of bytes the kernel filled in.

use std::io;

use crate::error::{Malformed, TcpInfoError};
use crate::layout::{DefaultLayout, TcpInfoLayout};
use crate::model::Info;
use crate::translate::parse_tcp_info_with;

/// `(level, option)` pair of a socket-option read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SockoptKey {
    pub level: i32,
    pub name: i32,
}

impl SockoptKey {
    /// `IPPROTO_TCP` / `TCP_INFO`
    #[cfg(target_os = "linux")]
    pub const TCP_INFO: SockoptKey = SockoptKey {
        level: libc::IPPROTO_TCP,
        name: libc::TCP_INFO,
    };

    /// `IPPROTO_TCP` / `TCP_INFO`, Linux numbering
    #[cfg(not(target_os = "linux"))]
    pub const TCP_INFO: SockoptKey = SockoptKey { level: 6, name: 11 };
}

/// Something that can read the raw tcp_info bytes for one socket
pub trait RawTcpInfoSource {
    /// Fill `buf` with the structure named by `key`
    ///
    /// Returns how many bytes were written (the `optlen` the OS reported).
    fn read_raw(&self, key: SockoptKey, buf: &mut [u8]) -> io::Result<usize>;

    /// Name of the underlying OS operation, used in error messages
    fn operation(&self) -> &'static str {
        "getsockopt"
    }
}

/// Read and decode tcp_info for one socket using the default layout
pub fn fetch_tcp_info<S>(source: &S) -> Result<Info, TcpInfoError>
where
    S: RawTcpInfoSource + ?Sized,
{
    fetch_info::<DefaultLayout, S>(source)
}

/// Read and decode tcp_info for one socket using layout `L`
///
/// # Errors
///
/// - `AcquisitionFailure` if the source fails; the decoder is not run
/// - `MalformedInput` if the source returned a different number of bytes
///   than `L::SIZE`, or the bytes do not decode
pub fn fetch_info<L, S>(source: &S) -> Result<Info, TcpInfoError>
where
    L: TcpInfoLayout,
    S: RawTcpInfoSource + ?Sized,
{
    let mut buf = vec![0u8; L::SIZE];
    let len = source
        .read_raw(SockoptKey::TCP_INFO, &mut buf)
        .map_err(|err| TcpInfoError::acquisition(source.operation(), err))?;

    if len != L::SIZE {
        return Err(Malformed::LengthMismatch {
            expected: L::SIZE,
            actual: len,
        }
        .into());
    }

    parse_tcp_info_with::<L>(&buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LinuxLayout;
    use crate::model::ConnectionState;

    struct Fixed(Vec<u8>);

    impl RawTcpInfoSource for Fixed {
        fn read_raw(&self, key: SockoptKey, buf: &mut [u8]) -> io::Result<usize> {
            assert_eq!(key, SockoptKey::TCP_INFO);
            let n = self.0.len().min(buf.len());
            buf[..n].copy_from_slice(&self.0[..n]);
            Ok(self.0.len())
        }
    }

    struct Failing(io::ErrorKind);

    impl RawTcpInfoSource for Failing {
        fn read_raw(&self, _key: SockoptKey, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from(self.0))
        }
    }

    #[test]
    fn test_fetch_decodes_full_read() {
        let mut raw = vec![0u8; LinuxLayout::SIZE];
        raw[0] = 8;
        let info = fetch_info::<LinuxLayout, _>(&Fixed(raw)).unwrap();
        assert_eq!(info.state, ConnectionState::CloseWait);
    }

    #[test]
    fn test_fetch_wraps_os_error() {
        let err = fetch_info::<LinuxLayout, _>(&Failing(io::ErrorKind::NotFound)).unwrap_err();
        match err {
            TcpInfoError::AcquisitionFailure { operation, source } => {
                assert_eq!(operation, "getsockopt");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected AcquisitionFailure, got {other:?}"),
        }
    }

    #[test]
    fn test_fetch_short_read_is_malformed() {
        let raw = vec![0u8; 92];
        let err = fetch_info::<LinuxLayout, _>(&Fixed(raw)).unwrap_err();
        assert_eq!(
            err.malformed(),
            Some(&Malformed::LengthMismatch {
                expected: LinuxLayout::SIZE,
                actual: 92
            })
        );
    }

    #[test]
    fn test_fetch_long_read_is_malformed() {
        let raw = vec![0u8; 232];
        let err = fetch_info::<LinuxLayout, _>(&Fixed(raw)).unwrap_err();
        assert!(matches!(
            err.malformed(),
            Some(Malformed::LengthMismatch { actual: 232, .. })
        ));
    }

    #[test]
    fn test_fetch_through_trait_object() {
        let source: Box<dyn RawTcpInfoSource> = Box::new(Fixed(vec![0u8; LinuxLayout::SIZE]));
        let info = fetch_tcp_info(source.as_ref()).unwrap();
        assert_eq!(info.state, ConnectionState::Unknown);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_sockopt_key_values() {
        assert_eq!(SockoptKey::TCP_INFO, SockoptKey { level: 6, name: 11 });
    }
}
