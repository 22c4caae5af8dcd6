//! User-facing notifications (toasts).

/// Fire-and-forget sink for error and success notices.
pub trait Notifier: Send + Sync {
    fn show_error(&self, title: &str, message: &str);

    fn show_success(&self, title: &str, message: &str);
}

/// Notifier that prints notices for an interactive terminal.
///
/// Notices are also logged, so they show up in traces of non-interactive runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn show_error(&self, title: &str, message: &str) {
        tracing::warn!(title, "{}", message);
        eprintln!("error: {}: {}", title, message);
    }

    fn show_success(&self, title: &str, message: &str) {
        tracing::info!(title, "{}", message);
        println!("{}: {}", title, message);
    }
}
