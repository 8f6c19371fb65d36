//! Terminal rendering of a streamed reply.

use std::io::Write;

use cs_backend::StreamSink;

/// Writes chunks to `out` as they arrive and errors to `err`.
///
/// Chunks are flushed one by one so the reply appears incrementally. The
/// final text is not printed again; only a trailing newline is added.
pub struct TerminalSink<O: Write, E: Write> {
    out: O,
    err: E,
    printed_any: bool,
    failed: bool,
}

impl<O: Write, E: Write> TerminalSink<O, E> {
    pub fn new(out: O, err: E) -> Self {
        Self {
            out,
            err,
            printed_any: false,
            failed: false,
        }
    }

    /// Whether `on_error` was called.
    pub fn failed(&self) -> bool {
        self.failed
    }

    pub fn into_inner(self) -> (O, E) {
        (self.out, self.err)
    }
}

impl<O: Write, E: Write> StreamSink for TerminalSink<O, E> {
    fn on_chunk(&mut self, text: &str) {
        let _ = self.out.write_all(text.as_bytes());
        let _ = self.out.flush();
        self.printed_any = true;
    }

    fn on_complete(&mut self, text: &str) {
        // Server supplied a final text but streamed nothing.
        if !self.printed_any {
            let _ = self.out.write_all(text.as_bytes());
        }
        let _ = writeln!(self.out);
        let _ = self.out.flush();
    }

    fn on_error(&mut self, message: &str) {
        self.failed = true;
        if self.printed_any {
            let _ = writeln!(self.out);
            let _ = self.out.flush();
        }
        let _ = writeln!(self.err, "error: {message}");
    }
}
