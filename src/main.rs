mod appsettings;
mod console;
mod desktop_platform;

use std::{sync::Arc, time::Duration};

use appsettings::AppSettings;
use console::Console;
use desktop_platform::DesktopNotificationPlatform;
use pillminder_scheduler::{
    NotificationTemplate, ReminderScheduler, ReminderTimeZone, SchedulerOptions, SystemClock,
};
use pillminder_storage::{LocalPrescriptionCache, SessionPrescriptionStore, SqlitePrescriptionStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::formatted_timed_builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let settings = AppSettings::load()?;
    log::info!("Starting pillminder");

    let pool = pillminder_storage::sqlite::connect(&settings.storage.database_url).await?;
    let store = Arc::new(SessionPrescriptionStore::new(
        SqlitePrescriptionStore::new(pool),
        LocalPrescriptionCache::new(&settings.storage.local_cache_path),
        Duration::from_secs(settings.storage.fetch_timeout_secs),
    ));

    let platform = Arc::new(DesktopNotificationPlatform::new(
        settings.notifications.command.clone(),
        settings.notifications.permission,
    ));

    let zone = settings
        .schedule
        .timezone
        .map(ReminderTimeZone::Named)
        .unwrap_or_default();

    let defaults = NotificationTemplate::default();
    let template = NotificationTemplate {
        title: settings.notifications.title.clone().unwrap_or(defaults.title),
        body: settings.notifications.body.clone().unwrap_or(defaults.body),
    };

    let owner = settings.session.owner_id.clone();
    let scheduler = ReminderScheduler::create(
        store.clone(),
        platform,
        SchedulerOptions {
            clock: Arc::new(SystemClock),
            zone,
            owner: owner.clone(),
            template,
        },
    );

    Console::new(scheduler, store, zone, owner).run().await
}
