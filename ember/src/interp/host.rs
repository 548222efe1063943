//! Host services used by built-ins: an output sink and a timer

use std::borrow::Cow;
use std::io::{self, Write};
use std::time::Duration;

/// Outside world as seen by a running program
pub trait Host {
    /// Write program output
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Block the running program
    fn sleep(&mut self, duration: Duration);
}

/// Writes to stdout and sleeps the current thread
#[derive(Debug, Default)]
pub struct StdHost;

impl Host for StdHost {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(bytes)?;
        // `print` output without a newline must show up before a `sleep`
        out.flush()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Buffers output and records sleeps instead of performing them
#[derive(Debug, Default)]
pub struct CaptureHost {
    pub output: Vec<u8>,
    pub sleeps: Vec<Duration>,
}

impl CaptureHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Captured output as text
    pub fn output_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.output)
    }

    /// Total time the program asked to sleep
    pub fn slept(&self) -> Duration {
        self.sleeps.iter().sum()
    }
}

impl Host for CaptureHost {
    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.output.extend_from_slice(bytes);
        Ok(())
    }

    fn sleep(&mut self, duration: Duration) {
        self.sleeps.push(duration);
    }
}
