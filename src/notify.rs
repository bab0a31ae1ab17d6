//! User-facing notifications (toasts).
//!
//! With the `notify` feature, notices go to the desktop through
//! `org.freedesktop.Notifications` on the session bus. A tokio task owns the
//! D-Bus connection so callers never wait on it. Every notice is also logged.

use std::time::Duration;

use tracing::info;

use crate::detector::StopToken;

/// How long a notice stays up when no timeout is given
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(2000);

/// What happens once a notice has been shown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CloseAction {
    #[default]
    None,
    /// Shut the application down
    Exit,
}

/// A message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub timeout: Option<Duration>,
    pub on_close: CloseAction,
}

impl Notice {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timeout: None,
            on_close: CloseAction::None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn then_exit(mut self) -> Self {
        self.on_close = CloseAction::Exit;
        self
    }

    pub fn display_time(&self) -> Duration {
        self.timeout.unwrap_or(DEFAULT_TIMEOUT)
    }
}

/// Notification collaborator. Must not block.
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log only
pub struct LogNotifier {
    shutdown: StopToken,
}

impl LogNotifier {
    pub fn new(shutdown: StopToken) -> Self {
        Self { shutdown }
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        info!("{}", notice.message);
        if notice.on_close == CloseAction::Exit {
            self.shutdown.request();
        }
    }
}

/// Best notifier available in this build. Must be called inside a tokio
/// runtime.
pub fn spawn(shutdown: StopToken) -> std::sync::Arc<dyn Notifier> {
    #[cfg(feature = "notify")]
    {
        std::sync::Arc::new(desktop::DesktopNotifier::spawn(shutdown))
    }
    #[cfg(not(feature = "notify"))]
    {
        std::sync::Arc::new(LogNotifier::new(shutdown))
    }
}

#[cfg(feature = "notify")]
pub mod desktop {
    //! Desktop notifications over D-Bus.
    //!
    //! Bus name: `org.freedesktop.Notifications`
    //! Object path: `/org/freedesktop/Notifications`

    use std::collections::HashMap;

    use tokio::sync::mpsc;
    use tracing::{debug, info, warn};
    use zbus::zvariant::Value;

    use super::{CloseAction, Notice, Notifier};
    use crate::detector::StopToken;

    const APP_NAME: &str = "IR +";

    /// Forwards notices to a background task holding the D-Bus connection
    pub struct DesktopNotifier {
        tx: mpsc::UnboundedSender<Notice>,
    }

    impl DesktopNotifier {
        pub fn spawn(shutdown: StopToken) -> Self {
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(run(rx, shutdown));
            Self { tx }
        }
    }

    impl Notifier for DesktopNotifier {
        fn notify(&self, notice: Notice) {
            if let Err(mpsc::error::SendError(notice)) = self.tx.send(notice) {
                info!("{}", notice.message);
            }
        }
    }

    async fn run(mut rx: mpsc::UnboundedReceiver<Notice>, shutdown: StopToken) {
        let conn = match zbus::Connection::session().await {
            Ok(conn) => Some(conn),
            Err(e) => {
                warn!("No D-Bus session, notifications go to the log only: {}", e);
                None
            }
        };
        // Replace our previous toast instead of stacking them
        let mut last_id = 0u32;

        while let Some(notice) = rx.recv().await {
            info!("{}", notice.message);
            if let Some(conn) = &conn {
                match show(conn, &notice, last_id).await {
                    Ok(id) => last_id = id,
                    Err(e) => debug!("Notify call failed: {}", e),
                }
            }
            if notice.on_close == CloseAction::Exit {
                tokio::time::sleep(notice.display_time()).await;
                shutdown.request();
            }
        }
    }

    async fn show(conn: &zbus::Connection, notice: &Notice, replaces: u32) -> zbus::Result<u32> {
        let hints: HashMap<&str, Value<'_>> = HashMap::new();
        let timeout_ms = i32::try_from(notice.display_time().as_millis()).unwrap_or(i32::MAX);
        let reply = conn
            .call_method(
                Some("org.freedesktop.Notifications"),
                "/org/freedesktop/Notifications",
                Some("org.freedesktop.Notifications"),
                "Notify",
                &(
                    APP_NAME,
                    replaces,
                    "input-mouse",
                    APP_NAME,
                    notice.message.as_str(),
                    Vec::<&str>::new(),
                    hints,
                    timeout_ms,
                ),
            )
            .await?;
        let id: u32 = reply.body().deserialize()?;
        Ok(id)
    }
}
