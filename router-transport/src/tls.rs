//! The TLS session interface the connection actor calls against; TLS
//! session lifecycle itself is an external collaborator (spec §1
//! "Out of scope": "the core only calls `encrypt`, `decrypt`,
//! `has_output`, `is_secure`").

use router_error::BoxError;

/// What the actor needs from a TLS session, regardless of which TLS
/// implementation backs it.
pub trait TlsSession: Send {
    /// Encrypt `plaintext`, appending the resulting ciphertext (and any
    /// pending handshake bytes) to `out`.
    fn encrypt(&mut self, plaintext: &[u8], out: &mut Vec<u8>) -> Result<(), BoxError>;

    /// Decrypt `ciphertext`, appending the resulting plaintext to `out`.
    /// Handshake-only input yields no plaintext.
    fn decrypt(&mut self, ciphertext: &[u8], out: &mut Vec<u8>) -> Result<(), BoxError>;

    /// Whether there is buffered output (handshake or encrypted
    /// application data) waiting to be written to the raw connection.
    fn has_output(&self) -> bool;

    /// Whether the handshake has completed and the session is carrying
    /// encrypted traffic.
    fn is_secure(&self) -> bool;

    /// The peer's negotiated ALPN protocol, if any (spec §4.2 "ALPN").
    fn alpn_protocol(&self) -> Option<&[u8]>;
}

/// A no-op session used for plain (non-TLS) connections and in tests: it
/// is always "secure" in the sense that there is nothing left to
/// negotiate, and it passes bytes through unchanged.
#[derive(Debug, Default)]
pub struct PlainTextSession;

impl TlsSession for PlainTextSession {
    fn encrypt(&mut self, plaintext: &[u8], out: &mut Vec<u8>) -> Result<(), BoxError> {
        out.extend_from_slice(plaintext);
        Ok(())
    }

    fn decrypt(&mut self, ciphertext: &[u8], out: &mut Vec<u8>) -> Result<(), BoxError> {
        out.extend_from_slice(ciphertext);
        Ok(())
    }

    fn has_output(&self) -> bool {
        false
    }

    fn is_secure(&self) -> bool {
        false
    }

    fn alpn_protocol(&self) -> Option<&[u8]> {
        None
    }
}
