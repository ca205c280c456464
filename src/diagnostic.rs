//! Non-fatal problems found while processing inbound frames.

use snafu::prelude::*;

use crate::ws::DecodeError;

/// A problem that is reported but does not affect the connection
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)), module(error), context(suffix(false)))]
pub enum Diagnostic {
    /// inbound frame can't be decoded
    #[snafu(display("decode inbound frame failed: {source}"))]
    Decode {
        /// source error
        source: DecodeError,
    },

    /// decoded operation has no dispatch entry
    #[snafu(display("unknown operation {op}"))]
    UnknownOperation {
        /// operation tag
        op: String,
    },
}

/// Receiver of [`Diagnostic`]s.
pub trait DiagnosticSink: Send + 'static {
    /// report one diagnostic
    fn report(&self, diagnostic: Diagnostic);
}

impl<F> DiagnosticSink for F
where
    F: Fn(Diagnostic) + Send + 'static,
{
    fn report(&self, diagnostic: Diagnostic) {
        self(diagnostic)
    }
}

/// Sink writing diagnostics to the error log.
#[derive(Debug, Default, Copy, Clone)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&self, diagnostic: Diagnostic) {
        log::error!("{}", diagnostic);
    }
}
