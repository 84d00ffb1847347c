//! Single-byte key input.
//!
//! Keys are read one byte at a time from any async reader. On a terminal in
//! canonical mode the bytes arrive once Enter is pressed; the newline is just
//! another ignored key.

use tokio::io::{AsyncRead, AsyncReadExt};

/// Space: grab and save a frame
pub const CAPTURE_KEY: u8 = b' ';

/// Escape: end the session
pub const EXIT_KEY: u8 = 0x1b;

/// What a key press means to a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Capture,
    Exit,
    Ignore,
}

impl KeyAction {
    pub fn from_byte(key: u8) -> Self {
        match key {
            CAPTURE_KEY => KeyAction::Capture,
            EXIT_KEY => KeyAction::Exit,
            _ => KeyAction::Ignore,
        }
    }
}

/// Blocking key source over an async reader
pub struct KeyReader<R> {
    inner: R,
}

impl<R: AsyncRead + Unpin> KeyReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }

    /// Wait for the next key; `None` at end of input
    pub async fn next_key(&mut self) -> std::io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        match self.inner.read(&mut buf).await? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }
}

impl KeyReader<tokio::io::Stdin> {
    /// Keys typed on the terminal
    pub fn stdin() -> Self {
        Self::new(tokio::io::stdin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_actions() {
        assert_eq!(KeyAction::from_byte(b' '), KeyAction::Capture);
        assert_eq!(KeyAction::from_byte(27), KeyAction::Exit);
        assert_eq!(KeyAction::from_byte(b'\n'), KeyAction::Ignore);
        assert_eq!(KeyAction::from_byte(b'q'), KeyAction::Ignore);
    }

    #[tokio::test]
    async fn test_reader_yields_bytes_then_eof() {
        let mut keys = KeyReader::new(&b" \x1b"[..]);

        assert_eq!(keys.next_key().await.unwrap(), Some(b' '));
        assert_eq!(keys.next_key().await.unwrap(), Some(0x1b));
        assert_eq!(keys.next_key().await.unwrap(), None);
    }
}
