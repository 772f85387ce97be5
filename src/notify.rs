use std::io::{self, Write};

/// The audible success alert, behind a trait so the poll loop can run in
/// tests without ringing anything.
pub trait Notifier {
    fn alert(&self) -> io::Result<()>;
}

/// Rings the terminal bell.
pub struct TerminalBell;

impl Notifier for TerminalBell {
    fn alert(&self) -> io::Result<()> {
        let mut stdout = io::stdout().lock();
        stdout.write_all(b"\x07")?;
        stdout.flush()
    }
}
