//! User-facing progress output.
//!
//! Progress lines are not logs: they describe what the tool is doing for the
//! operator and are silenced by `--quiet`. Workflows take the sink as a
//! parameter so the caller decides where (and whether) they go.

use std::io::Write;

/// Receives one progress line per workflow step.
pub trait Reporter {
    fn step(&mut self, message: &str);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl Reporter for SilentReporter {
    fn step(&mut self, _message: &str) {}
}

/// Writes `-> message` lines to any writer, typically stderr.
#[derive(Debug)]
pub struct StreamReporter<W: Write> {
    out: W,
}

impl<W: Write> StreamReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Reporter for StreamReporter<W> {
    fn step(&mut self, message: &str) {
        // Progress is best-effort; a closed stderr must not fail the operation
        let _ = writeln!(self.out, "-> {message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stream_reporter_format() {
        let mut reporter = StreamReporter::new(Vec::new());
        reporter.step("loading keystore from 'a.jceks'...");
        reporter.step("done");
        assert_eq!(
            String::from_utf8(reporter.into_inner()).unwrap(),
            "-> loading keystore from 'a.jceks'...\n-> done\n"
        );
    }
}
