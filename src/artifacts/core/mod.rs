//! Shared utilities

use minus::Pager;
use std::io::{self, Write};

/// `Write` adapter feeding the minus pager
///
/// Writes may split a multi-byte character; the incomplete tail is held back
/// until the rest of it arrives.
pub struct PagerWriter {
    pager: Pager,
    pending: Vec<u8>,
}

impl PagerWriter {
    pub fn new(pager: Pager) -> Self {
        PagerWriter {
            pager,
            pending: Vec::new(),
        }
    }
}

impl Write for PagerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);

        let valid_up_to = match std::str::from_utf8(&self.pending) {
            Ok(text) => text.len(),
            // an incomplete sequence at the end has no error length
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(e) => return Err(io::Error::new(io::ErrorKind::InvalidData, e)),
        };

        let complete = self.pending.drain(..valid_up_to).collect::<Vec<_>>();
        let text =
            std::str::from_utf8(&complete).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.pager.push_str(text).map_err(io::Error::other)?;

        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
