use std::process::Stdio;

use anyhow::{Context, ensure};
use async_trait::async_trait;
use pillminder_models::permission::PermissionStatus;
use pillminder_scheduler::NotificationPlatform;
use tokio::process::Command;

/// Desktop notifications through a `notify-send` compatible command.
///
/// The command being runnable counts as permission being granted.
pub struct DesktopNotificationPlatform {
    command: String,
    initial_status: PermissionStatus,
}

impl DesktopNotificationPlatform {
    pub fn new(command: impl Into<String>, initial_status: PermissionStatus) -> Self {
        Self {
            command: command.into(),
            initial_status,
        }
    }
}

#[async_trait]
impl NotificationPlatform for DesktopNotificationPlatform {
    fn permission_status(&self) -> PermissionStatus {
        self.initial_status
    }

    async fn request_permission(&self) -> anyhow::Result<PermissionStatus> {
        let probe = Command::new(&self.command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        let status = match probe {
            Ok(exit) if exit.success() => PermissionStatus::Granted,
            Ok(exit) => {
                log::info!(
                    "Notification command is not usable. command = {}, exit = {exit}",
                    self.command
                );
                PermissionStatus::Denied
            }
            Err(error) => {
                log::info!(
                    "Notification command not found. command = {}, error = {error}",
                    self.command
                );
                PermissionStatus::Denied
            }
        };

        Ok(status)
    }

    async fn show_notification(&self, title: &str, body: &str) -> anyhow::Result<()> {
        let exit = Command::new(&self.command)
            .arg("--app-name=pillminder")
            .arg(title)
            .arg(body)
            .stdout(Stdio::null())
            .status()
            .await
            .with_context(|| format!("Failed to run {}", self.command))?;

        ensure!(exit.success(), "{} exited with {exit}", self.command);
        Ok(())
    }
}
