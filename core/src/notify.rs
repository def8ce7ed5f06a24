use crate::Result;

/// Outbound notification contract. A synchronous best-effort call: no
/// retry, no queuing; failure is reported straight back to the caller.
pub trait Notifier: Send + Sync {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Notifier that logs outgoing messages instead of delivering them.
/// Stands in for a real mail transport in the CLI and in examples.
#[derive(Default)]
pub struct ConsoleNotifier;

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Notifier for ConsoleNotifier {
    fn send(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        log::info!("mail to {to}: {subject}");
        log::debug!("mail body:\n{body}");
        Ok(())
    }
}
