//! The server's notification collaborator.

use safecheck_core::resolve::{Notifier, NotifyError};

/// Records each resolution as a structured log event instead of delivering
/// a message. Swap in a real transport by implementing [`Notifier`].
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
  async fn send_resolved(&self, uid: &str, version_id: &str, note: &str) -> Result<(), NotifyError> {
    tracing::info!(
      target: "safecheck::notify",
      uid,
      version_id,
      note,
      "status resolved notification"
    );
    Ok(())
  }
}
