use std::sync::Arc;

use chrono::{DateTime, Utc};
use pillminder_models::{
    alert::InAppAlert, permission::PermissionStatus, reminder::ReminderRule, user::OwnerId,
};
use pillminder_storage::PrescriptionStore;
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::{self, JoinHandle},
    time::Instant,
};
use tokio_util::sync::CancellationToken;

use crate::{
    clock::{Clock, ReminderTimeZone, SystemClock},
    platform::{NotificationPlatform, NotificationTemplate},
    target::get_target_datetime,
};

pub struct SchedulerOptions {
    pub clock: Arc<dyn Clock>,
    pub zone: ReminderTimeZone,
    pub owner: Option<OwnerId>,
    pub template: NotificationTemplate,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            zone: ReminderTimeZone::default(),
            owner: None,
            template: NotificationTemplate::default(),
        }
    }
}

#[derive(Debug)]
enum SchedulerMessage {
    Rebuild {
        done: oneshot::Sender<()>,
    },
    SetOwner {
        owner: Option<OwnerId>,
        done: oneshot::Sender<()>,
    },
    Fired {
        timer_id: u64,
    },
    PendingFireTimes {
        reply: oneshot::Sender<Vec<DateTime<Utc>>>,
    },
}

struct ScheduledTimer {
    id: u64,
    rule: Arc<ReminderRule>,
    fire_at: DateTime<Utc>,
    deadline: Instant,
    task: JoinHandle<()>,
    cancellation_token: CancellationToken,
}

impl ScheduledTimer {
    /// Due once either the wall clock or the timer's own deadline has passed.
    fn is_due(&self, now: DateTime<Utc>, elapsed: Instant) -> bool {
        self.fire_at <= now || self.deadline <= elapsed
    }

    /// No-op for a timer that already fired.
    fn cancel(self) {
        self.cancellation_token.cancel();
    }

    fn is_pending(&self) -> bool {
        !self.task.is_finished()
    }
}

/// Handle to the reminder manager task.
///
/// All rebuilds go through one channel, so the manager task is the only
/// place the timer collection is touched. The task stops, cancelling every
/// timer, once the last handle is dropped.
#[derive(Clone)]
pub struct ReminderScheduler {
    sender: mpsc::Sender<SchedulerMessage>,
    permission: Arc<watch::Sender<PermissionStatus>>,
    alert: Arc<watch::Sender<Option<InAppAlert>>>,
    platform: Arc<dyn NotificationPlatform>,
}

impl ReminderScheduler {
    /// Spawns the manager task and performs the first rebuild with the
    /// platform's current permission status.
    pub fn create(
        store: Arc<dyn PrescriptionStore>,
        platform: Arc<dyn NotificationPlatform>,
        options: SchedulerOptions,
    ) -> Self {
        let (sender, receiver) = mpsc::channel(64);
        let (permission, _) = watch::channel(platform.permission_status());
        let (alert, _) = watch::channel(None);
        let permission = Arc::new(permission);
        let alert = Arc::new(alert);

        let manager = ReminderManager {
            store,
            platform: Arc::clone(&platform),
            clock: options.clock,
            zone: options.zone,
            owner: options.owner,
            template: options.template,
            permission: Arc::clone(&permission),
            alert: Arc::clone(&alert),
            timers: Vec::new(),
            next_timer_id: 0,
            sender: sender.downgrade(),
        };

        log::info!(
            "Starting reminder scheduler. [permission = {}]",
            *permission.borrow()
        );
        task::spawn(manager.run(receiver));

        Self {
            sender,
            permission,
            alert,
            platform,
        }
    }

    /// Cancels every timer and rebuilds them from the current rules.
    /// Returns once the rebuild is complete.
    pub async fn schedule_reminders(&self) {
        let (done, wait) = oneshot::channel();
        self.send(SchedulerMessage::Rebuild { done }).await;
        let _ = wait.await;
    }

    /// Switches the rule source to `owner` and rebuilds.
    pub async fn set_owner(&self, owner: Option<OwnerId>) {
        let (done, wait) = oneshot::channel();
        self.send(SchedulerMessage::SetOwner { owner, done }).await;
        let _ = wait.await;
    }

    /// Asks the platform for permission when it has not been asked yet. A
    /// changed status rebuilds the schedule before this returns.
    pub async fn request_permission(&self) -> PermissionStatus {
        let current = self.permission_status();
        if current != PermissionStatus::Default {
            log::debug!("Notification permission already decided. [permission = {current}]");
            return current;
        }

        let status = match self.platform.request_permission().await {
            Ok(status) => status,
            Err(error) => {
                log::warn!("Could not request notification permission. error = {error:#}");
                return current;
            }
        };

        let changed = self.permission.send_if_modified(|value| {
            if *value == status {
                return false;
            }
            *value = status;
            true
        });

        if changed {
            log::info!("Notification permission changed. [permission = {status}]");
            self.schedule_reminders().await;
        }

        status
    }

    pub fn permission_status(&self) -> PermissionStatus {
        *self.permission.borrow()
    }

    pub fn subscribe_permission(&self) -> watch::Receiver<PermissionStatus> {
        self.permission.subscribe()
    }

    pub fn active_in_app_alert(&self) -> Option<InAppAlert> {
        self.alert.borrow().clone()
    }

    pub fn subscribe_in_app_alert(&self) -> watch::Receiver<Option<InAppAlert>> {
        self.alert.subscribe()
    }

    pub fn dismiss_in_app_alert(&self) {
        self.alert.send_if_modified(|alert| alert.take().is_some());
    }

    /// Fire instants of the live timers, earliest first.
    pub async fn pending_fire_times(&self) -> Vec<DateTime<Utc>> {
        let (reply, wait) = oneshot::channel();
        self.send(SchedulerMessage::PendingFireTimes { reply }).await;
        wait.await.unwrap_or_default()
    }

    async fn send(&self, message: SchedulerMessage) {
        if let Err(error) = self.sender.send(message).await {
            log::error!("Reminder manager is not running. message = {:?}", error.0);
        }
    }
}

struct ReminderManager {
    store: Arc<dyn PrescriptionStore>,
    platform: Arc<dyn NotificationPlatform>,
    clock: Arc<dyn Clock>,
    zone: ReminderTimeZone,
    owner: Option<OwnerId>,
    template: NotificationTemplate,
    permission: Arc<watch::Sender<PermissionStatus>>,
    alert: Arc<watch::Sender<Option<InAppAlert>>>,
    timers: Vec<ScheduledTimer>,
    next_timer_id: u64,
    // Weak so that pending timers do not keep the manager alive.
    sender: mpsc::WeakSender<SchedulerMessage>,
}

impl ReminderManager {
    async fn run(mut self, mut receiver: mpsc::Receiver<SchedulerMessage>) {
        self.rebuild(self.clock.now()).await;

        while let Some(msg) = receiver.recv().await {
            match msg {
                SchedulerMessage::Rebuild { done } => {
                    self.rebuild(self.clock.now()).await;
                    let _ = done.send(());
                }
                SchedulerMessage::SetOwner { owner, done } => {
                    log::info!("Switching reminder owner. [owner = {owner:?}]");
                    self.owner = owner;
                    self.rebuild(self.clock.now()).await;
                    let _ = done.send(());
                }
                SchedulerMessage::Fired { timer_id } => {
                    let Some(fire_at) = self
                        .timers
                        .iter()
                        .find(|timer| timer.id == timer_id)
                        .map(|timer| timer.fire_at)
                    else {
                        log::debug!("[FIRED] Timer {timer_id} was already handled");
                        continue;
                    };
                    // The wall clock may trail the timer slightly; never
                    // schedule the rule that just fired for today again.
                    let now = self.clock.now().max(fire_at);
                    self.rebuild(now).await;
                }
                SchedulerMessage::PendingFireTimes { reply } => {
                    let mut fire_times: Vec<_> = self
                        .timers
                        .iter()
                        .filter(|timer| timer.is_pending())
                        .map(|timer| timer.fire_at)
                        .collect();
                    fire_times.sort();
                    let _ = reply.send(fire_times);
                }
            }
        }

        self.cancel_all();
        log::info!("Reminder manager shutting down");
    }

    async fn fire(&self, rule: &ReminderRule) {
        log::info!(
            "[FIRED] Reminder for {} ({}). [doctor = {}]",
            rule.drug_name,
            rule.dosage,
            rule.prescribing_doctor
        );
        self.alert.send_replace(Some(InAppAlert::from(rule)));

        let permission = *self.permission.borrow();
        if permission.is_granted() {
            let (title, body) = self.template.render(rule);
            if let Err(error) = self.platform.show_notification(&title, &body).await {
                log::warn!(
                    "Could not show notification, in-app alert only. drug = {}, error = {error:#}",
                    rule.drug_name
                );
            }
        }
    }

    /// Fires every due timer, earliest first, and removes it from the
    /// collection. Timers due at the same instant all fire here, whichever
    /// of them woke the manager.
    async fn fire_due_timers(&mut self, now: DateTime<Utc>) {
        let elapsed = Instant::now();
        let (mut due, pending): (Vec<_>, Vec<_>) = self
            .timers
            .drain(..)
            .partition(|timer| timer.is_due(now, elapsed));
        self.timers = pending;

        due.sort_by_key(|timer| timer.fire_at);
        for timer in due {
            self.fire(&timer.rule).await;
            timer.cancel();
        }
    }

    async fn rebuild(&mut self, now: DateTime<Utc>) {
        self.fire_due_timers(now).await;
        self.cancel_all();

        let permission = *self.permission.borrow();
        if !permission.is_granted() {
            log::info!("[REBUILD] No reminders scheduled. [permission = {permission}]");
            return;
        }

        let rules = match self
            .store
            .fetch_active_reminder_rules(self.owner.as_ref())
            .await
        {
            Ok(rules) => rules,
            Err(error) => {
                log::error!(
                    "[REBUILD] Failed to load prescriptions for reminders. error = {error}"
                );
                return;
            }
        };

        let started = Instant::now();
        for rule in rules.into_iter().filter(|rule| rule.enabled) {
            if rule.drug_name.trim().is_empty() {
                log::warn!("[REBUILD] Skipping reminder rule without drug name");
                continue;
            }

            let rule = Arc::new(rule);
            for (raw, parsed) in rule.fire_times() {
                let fire_time = match parsed {
                    Ok(fire_time) => fire_time,
                    Err(error) => {
                        log::warn!("[REBUILD] Skipping {}. {error}", rule.drug_name);
                        continue;
                    }
                };

                let Some(fire_at) = get_target_datetime(&fire_time, now, &self.zone) else {
                    log::warn!(
                        "[REBUILD] No upcoming occurrence of {raw} for {}",
                        rule.drug_name
                    );
                    continue;
                };

                let deadline = started + (fire_at - now).to_std().unwrap_or_default();
                let timer = self.spawn_timer(Arc::clone(&rule), fire_at, deadline);
                self.timers.push(timer);
            }
        }

        log::info!(
            "[REBUILD] Scheduled {} reminder timers. [owner = {:?}]",
            self.timers.len(),
            self.owner
        );
    }

    fn spawn_timer(
        &mut self,
        rule: Arc<ReminderRule>,
        fire_at: DateTime<Utc>,
        deadline: Instant,
    ) -> ScheduledTimer {
        let id = self.next_timer_id;
        self.next_timer_id += 1;

        let cancellation_token = CancellationToken::new();
        let task_cancellation_token = cancellation_token.child_token();
        let sender = self.sender.clone();

        log::debug!(
            "[SCHEDULE] Sleeping for {:?} delay. drug = {}, fire_at = {}, timer = {}",
            deadline.saturating_duration_since(Instant::now()),
            rule.drug_name,
            fire_at,
            id
        );

        let task = task::spawn(async move {
            tokio::select! {
                biased;
                _ = task_cancellation_token.cancelled() => {
                    log::debug!("Timer {id} was cancelled");
                }
                _ = tokio::time::sleep_until(deadline) => {
                    if let Some(sender) = sender.upgrade() {
                        let _ = sender.send(SchedulerMessage::Fired { timer_id: id }).await;
                    }
                }
            }
        });

        ScheduledTimer {
            id,
            rule,
            fire_at,
            deadline,
            task,
            cancellation_token,
        }
    }

    fn cancel_all(&mut self) {
        let cancelled = self.timers.len();
        self.timers.drain(..).for_each(ScheduledTimer::cancel);
        if cancelled > 0 {
            log::debug!("Cancelled {cancelled} reminder timers");
        }
    }
}
