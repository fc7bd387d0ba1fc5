//! Serial Console
//!
//! Line editor for the programmer's UART. Terminals are expected to use
//! XON/XOFF flow control: the console sends XON while it waits for a line
//! and XOFF as soon as the line is complete, so a pasted N2CBU dump is held
//! back while the previous record is being written to the RAM.

use core::fmt;

use embedded_io::{Read, Write};
use heapless::String;

use crate::config::{LINE_CAPACITY, XOFF, XON};
use crate::protocol::LineSource;

/// Backspace
const BS: u8 = 0x08;

/// Delete, sent by most terminals for the backspace key
const DEL: u8 = 0x7F;

/// Line editor over a byte stream
pub struct Console<RX, TX> {
    rx: RX,
    tx: TX,
    line: String<LINE_CAPACITY>,
    after_cr: bool,
}

impl<RX, TX> Console<RX, TX>
where
    RX: Read,
    TX: Write<Error = RX::Error>,
{
    /// Create a console on a receive/transmit pair
    #[must_use]
    pub fn new(rx: RX, tx: TX) -> Self {
        Self {
            rx,
            tx,
            line: String::new(),
            after_cr: false,
        }
    }

    /// Give back the underlying halves
    pub fn into_parts(self) -> (RX, TX) {
        (self.rx, self.tx)
    }

    /// Borrow the transmit half
    pub fn tx(&self) -> &TX {
        &self.tx
    }

    /// Next input byte, None at end of stream
    fn next_byte(&mut self) -> Result<Option<u8>, RX::Error> {
        let mut byte = [0u8];
        match self.rx.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }

    /// Read and edit one line, echoing as it is typed
    ///
    /// Printable ASCII is kept up to the line capacity, BS/DEL erase, other
    /// control bytes are ignored. CR or LF ends the line; an LF right after
    /// a CR belongs to the same terminator. End of stream also ends the line.
    ///
    /// # Errors
    ///
    /// Returns the UART error if a read or the echo fails.
    pub fn edit_line(&mut self) -> Result<&str, RX::Error> {
        self.line.clear();
        self.tx.write_all(&[XON])?;

        while let Some(byte) = self.next_byte()? {
            let after_cr = core::mem::replace(&mut self.after_cr, byte == b'\r');
            match byte {
                b'\n' if after_cr => {}
                b'\r' | b'\n' => break,
                BS | DEL => {
                    if self.line.pop().is_some() {
                        self.tx.write_all(&[byte])?;
                    }
                }
                0x20..=0x7E => {
                    if self.line.push(char::from(byte)).is_ok() {
                        self.tx.write_all(&[byte])?;
                    }
                }
                _ => {}
            }
        }

        self.tx.write_all(&[XOFF])?;
        self.tx.write_all(b"\r\n")?;
        self.tx.flush()?;
        Ok(self.line.as_str())
    }
}

impl<RX, TX> LineSource for Console<RX, TX>
where
    RX: Read,
    TX: Write<Error = RX::Error>,
{
    type Error = RX::Error;

    fn read_line(&mut self) -> Result<&str, Self::Error> {
        self.edit_line()
    }
}

impl<RX, TX> fmt::Write for Console<RX, TX>
where
    TX: Write,
{
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.tx.write_all(s.as_bytes()).map_err(|_| fmt::Error)
    }
}
