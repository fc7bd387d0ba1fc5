//! Programmer Operations
//!
//! The four console commands and the dispatcher that runs them. Each
//! operation takes the memory for its whole duration: it configures the
//! bus, resets the address counter, walks, and releases the memory before
//! returning to the prompt. Nothing can interrupt a walk except the end of
//! the image or the blank line that ends a pasted dump.

use core::fmt::{self, Write};

use crate::config::DEFAULT_HEX_POLICY;
use crate::drivers::r71_memory::SequentialMemory;
use crate::hal::data_bus::BusDirection;
use crate::memory_map::{render_event, MemoryMap};
use crate::protocol::{
    program_records, verify_records, write_dump, LineSource, ProgramReport, VerifyReport,
};
use crate::types::{Command, HexPolicy};

/// Start-up banner
pub const BANNER: &str =
    "\r\nIC-R71 Programmer\r\nPlease connect with 57600 8-N-1 Xon/Xoff flow control.\r\n";

/// Command prompt
pub const PROMPT: &str = "Read, Program, Verify, List? ";

/// Request for N2CBU input
pub const PASTE_PROMPT: &str = "Paste N2CBU format IC-R71 RAM data, end with a blank line:\r\n";

/// Failure of a console operation
#[derive(Debug, PartialEq, Eq)]
pub enum SessionError<E> {
    /// Reading from the console failed
    Transport(E),
    /// Writing to the console failed
    Output,
}

impl<E> From<fmt::Error> for SessionError<E> {
    fn from(_: fmt::Error) -> Self {
        Self::Output
    }
}

impl<E: fmt::Debug> fmt::Display for SessionError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "console read failed: {e:?}"),
            Self::Output => f.write_str("console write failed"),
        }
    }
}

#[cfg(feature = "embedded")]
impl<E> defmt::Format for SessionError<E> {
    fn format(&self, f: defmt::Formatter) {
        match self {
            Self::Transport(_) => defmt::write!(f, "console read failed"),
            Self::Output => defmt::write!(f, "console write failed"),
        }
    }
}

/// Result of a console operation
pub type SessionResult<T, E> = Result<T, SessionError<E>>;

/// Command dispatcher owning the memory driver
pub struct Programmer<M> {
    memory: M,
    policy: HexPolicy,
}

impl<M: SequentialMemory> Programmer<M> {
    /// Create a programmer with the default hex policy
    #[must_use]
    pub fn new(memory: M) -> Self {
        Self::with_policy(memory, DEFAULT_HEX_POLICY)
    }

    /// Create a programmer with an explicit hex policy
    #[must_use]
    pub fn with_policy(memory: M, policy: HexPolicy) -> Self {
        Self { memory, policy }
    }

    /// Active hex policy
    #[must_use]
    pub const fn policy(&self) -> HexPolicy {
        self.policy
    }

    /// Borrow the memory driver
    #[must_use]
    pub const fn memory(&self) -> &M {
        &self.memory
    }

    /// Give back the memory driver
    #[must_use]
    pub fn into_inner(self) -> M {
        self.memory
    }

    /// Print the banner and the first prompt
    ///
    /// # Errors
    ///
    /// Propagates output errors.
    pub fn greet<W: Write>(&self, out: &mut W) -> fmt::Result {
        out.write_str(BANNER)?;
        out.write_str(PROMPT)
    }

    /// Read one command line, run it, and prompt again
    ///
    /// Lines that are not commands are ignored.
    ///
    /// # Errors
    ///
    /// Returns the first console failure; the memory is released either way.
    pub fn serve<C>(&mut self, console: &mut C) -> SessionResult<Option<Command>, C::Error>
    where
        C: LineSource + Write,
    {
        let line = console.read_line().map_err(SessionError::Transport)?;
        let command = Command::from_line(line);
        if let Some(command) = command {
            self.execute(command, console)?;
        }
        console.write_str(PROMPT)?;
        Ok(command)
    }

    /// Run one command to completion
    ///
    /// # Errors
    ///
    /// Returns the first console failure; the memory is released either way.
    pub fn execute<C>(&mut self, command: Command, console: &mut C) -> SessionResult<(), C::Error>
    where
        C: LineSource + Write,
    {
        info!("{=str}", command.name());
        write!(console, "{}\r\n", command.name())?;
        match command {
            Command::Read => self.read(console)?,
            Command::Program => {
                self.program(console)?;
            }
            Command::Verify => {
                self.verify(console)?;
            }
            Command::List => self.list(console)?,
        }
        Ok(())
    }

    /// Configure, reset, run `body`, release
    fn session<T>(&mut self, direction: BusDirection, body: impl FnOnce(&mut M) -> T) -> T {
        match direction {
            BusDirection::Input => self.memory.enter_read_mode(),
            BusDirection::Output => {
                self.memory.enter_write_mode();
                self.memory.set_write_protect(false);
            }
        }
        self.memory.reset();
        trace!("session start");
        let result = body(&mut self.memory);
        self.memory.release();
        trace!("session end");
        result
    }

    /// Dump the whole memory as N2CBU records
    ///
    /// # Errors
    ///
    /// Propagates output errors.
    pub fn read<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        self.session(BusDirection::Input, |memory| write_dump(memory, out))
    }

    /// Write pasted N2CBU records into the memory
    ///
    /// Prints a notice naming the last rejected record, if any.
    ///
    /// # Errors
    ///
    /// Returns the first console failure.
    pub fn program<C>(&mut self, console: &mut C) -> SessionResult<ProgramReport, C::Error>
    where
        C: LineSource + Write,
    {
        let policy = self.policy;
        let report = self.session(BusDirection::Output, |memory| -> SessionResult<_, C::Error> {
            console.write_str(PASTE_PROMPT)?;
            program_records(memory, console, policy).map_err(SessionError::Transport)
        })?;

        if let Some(address) = report.last_rejected {
            write!(
                console,
                "Program ERROR. {} lines rejected, last at {address}.\r\n",
                report.lines.rejected
            )?;
        }
        info!(
            "program: {} nibbles written, {} dropped, {} lines skipped, {} rejected",
            report.nibbles_written,
            report.nibbles_dropped,
            report.lines.skipped,
            report.lines.rejected
        );
        Ok(report)
    }

    /// Compare pasted N2CBU records against the memory
    ///
    /// Prints `Verify OK.` only when every record was compared and matched,
    /// otherwise the address of the last mismatch and any rejected lines.
    ///
    /// # Errors
    ///
    /// Returns the first console failure.
    pub fn verify<C>(&mut self, console: &mut C) -> SessionResult<VerifyReport, C::Error>
    where
        C: LineSource + Write,
    {
        let policy = self.policy;
        let report = self.session(BusDirection::Input, |memory| -> SessionResult<_, C::Error> {
            console.write_str(PASTE_PROMPT)?;
            verify_records(memory, console, policy).map_err(SessionError::Transport)
        })?;

        if report.is_ok() {
            console.write_str("Verify OK.\r\n")?;
        } else {
            match report.last_mismatch {
                Some(address) => {
                    warn!("verify mismatch, last at {}", address.as_u16());
                    write!(console, "Verify ERROR. Last error at {address}.\r\n")?;
                }
                None => console.write_str("Verify ERROR.\r\n")?,
            }
            if report.lines.rejected > 0 {
                write!(console, "{} lines rejected.\r\n", report.lines.rejected)?;
            }
        }
        info!(
            "verify: {} nibbles compared, {} lines skipped, {} rejected",
            report.nibbles_compared,
            report.lines.skipped,
            report.lines.rejected
        );
        Ok(report)
    }

    /// Decode and print offsets, band limits and channels
    ///
    /// # Errors
    ///
    /// Propagates output errors.
    pub fn list<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        self.session(BusDirection::Input, |memory| {
            MemoryMap::new().walk(memory, |event| render_event(out, event))
        })
    }
}
