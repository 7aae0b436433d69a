use colored::*;

/// Shared logger handed around the pipeline. Writes to stderr so that
/// tabular output on stdout stays machine-readable.
#[derive(Clone, Copy)]
pub struct Logger;

impl Logger {
    pub fn information(&self, message: &str) {
        eprintln!("{}", message);
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{}", message.yellow());
    }

    pub fn error(&self, message: &str) {
        eprintln!("{}", message.red());
    }

    pub fn success(&self, message: &str) {
        eprintln!("{}", message.green());
    }
}
