use std::{str::FromStr, sync::Arc};

use anyhow::{Context, bail};
use chrono::Local;
use pillminder_models::{
    prescription::{NewDrug, NewPrescription, Prescription, PrescriptionId},
    user::OwnerId,
};
use pillminder_scheduler::{ReminderScheduler, ReminderTimeZone};
use pillminder_storage::SessionPrescriptionStore;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Commands:
  allow                                       ask for notification permission
  reload                                      rebuild reminder timers
  timers                                      show upcoming reminders
  list                                        show prescriptions
  add <doctor>;<drug>;<dosage>;<HH:MM,...>    add a prescription
  delete <id>                                 delete a prescription
  login <owner>                               use the database as <owner>
  logout                                      use the local cache
  dismiss                                     dismiss the in-app alert
  help                                        show this message
  quit                                        exit";

#[derive(Debug, PartialEq, Eq)]
pub enum ConsoleCommand {
    Allow,
    Reload,
    Timers,
    List,
    Add(NewPrescription),
    Delete(PrescriptionId),
    Login(OwnerId),
    Logout,
    Dismiss,
    Help,
    Quit,
}

impl FromStr for ConsoleCommand {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (name, args) = line.split_once(' ').unwrap_or((line, ""));
        let args = args.trim();

        let command = match name {
            "allow" => ConsoleCommand::Allow,
            "reload" => ConsoleCommand::Reload,
            "timers" => ConsoleCommand::Timers,
            "list" => ConsoleCommand::List,
            "add" => ConsoleCommand::Add(parse_prescription(args)?),
            "delete" => ConsoleCommand::Delete(
                args.parse()
                    .with_context(|| format!("'{args}' is not a prescription id"))?,
            ),
            "login" if !args.is_empty() => ConsoleCommand::Login(args.to_owned()),
            "login" => bail!("login needs an owner id"),
            "logout" => ConsoleCommand::Logout,
            "dismiss" => ConsoleCommand::Dismiss,
            "help" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => bail!("Unknown command '{other}'"),
        };

        Ok(command)
    }
}

fn parse_prescription(args: &str) -> anyhow::Result<NewPrescription> {
    let parts: Vec<&str> = args.split(';').map(str::trim).collect();
    let [doctor, drug, dosage, times] = parts.as_slice() else {
        bail!("Expected <doctor>;<drug>;<dosage>;<HH:MM,...>");
    };

    if drug.is_empty() {
        bail!("Drug name is required");
    }

    let reminder_times: Vec<String> = times
        .split(',')
        .map(str::trim)
        .filter(|time| !time.is_empty())
        .map(str::to_owned)
        .collect();

    Ok(NewPrescription {
        doctor: doctor.to_string(),
        issue_date: Local::now().date_naive(),
        drugs: vec![NewDrug {
            name: drug.to_string(),
            dosage: dosage.to_string(),
            reminder_enabled: !reminder_times.is_empty(),
            reminder_times,
        }],
        file_data: None,
        file_type: None,
    })
}

pub struct Console {
    scheduler: ReminderScheduler,
    store: Arc<SessionPrescriptionStore>,
    zone: ReminderTimeZone,
    owner: Option<OwnerId>,
}

impl Console {
    pub fn new(
        scheduler: ReminderScheduler,
        store: Arc<SessionPrescriptionStore>,
        zone: ReminderTimeZone,
        owner: Option<OwnerId>,
    ) -> Self {
        Self {
            scheduler,
            store,
            zone,
            owner,
        }
    }

    /// Reads commands from stdin until `quit`, end of input or Ctrl+C.
    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut alerts = self.scheduler.subscribe_in_app_alert();

        println!("{HELP}");

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<ConsoleCommand>() {
                        Ok(ConsoleCommand::Quit) => break,
                        Ok(command) => self.execute(command).await,
                        Err(error) => println!("{error:#}"),
                    }
                }
                changed = alerts.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    if let Some(alert) = alerts.borrow_and_update().clone() {
                        println!(
                            ">>> Take {} ({}), prescribed by {}. Type 'dismiss' to clear.",
                            alert.drug_name, alert.dosage, alert.doctor
                        );
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        log::info!("Console closed");
        Ok(())
    }

    async fn execute(&mut self, command: ConsoleCommand) {
        if let Err(error) = self.try_execute(command).await {
            log::error!("Command failed. error = {error:#}");
            println!("Error: {error:#}");
        }
    }

    async fn try_execute(&mut self, command: ConsoleCommand) -> anyhow::Result<()> {
        match command {
            ConsoleCommand::Allow => {
                let status = self.scheduler.request_permission().await;
                println!("Notification permission: {status}");
            }
            ConsoleCommand::Reload => {
                self.scheduler.schedule_reminders().await;
                self.print_timers().await;
            }
            ConsoleCommand::Timers => self.print_timers().await,
            ConsoleCommand::List => {
                let prescriptions = self.store.list_prescriptions(self.owner.as_ref()).await?;
                if prescriptions.is_empty() {
                    println!("No prescriptions");
                }
                prescriptions.iter().for_each(print_prescription);
            }
            ConsoleCommand::Add(prescription) => {
                let added = self
                    .store
                    .add_prescription(self.owner.as_ref(), prescription)
                    .await?;
                println!("Added prescription #{}", added.id);
                self.scheduler.schedule_reminders().await;
            }
            ConsoleCommand::Delete(id) => {
                self.store
                    .delete_prescription(self.owner.as_ref(), id)
                    .await?;
                println!("Deleted prescription #{id}");
                self.scheduler.schedule_reminders().await;
            }
            ConsoleCommand::Login(owner) => {
                println!("Signed in as {owner}");
                self.owner = Some(owner);
                self.scheduler.set_owner(self.owner.clone()).await;
            }
            ConsoleCommand::Logout => {
                self.owner = None;
                println!("Signed out, using the local cache");
                self.scheduler.set_owner(None).await;
            }
            ConsoleCommand::Dismiss => self.scheduler.dismiss_in_app_alert(),
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Quit => {}
        }

        Ok(())
    }

    async fn print_timers(&self) {
        let fire_times = self.scheduler.pending_fire_times().await;
        if fire_times.is_empty() {
            println!(
                "No reminders scheduled. [permission = {}]",
                self.scheduler.permission_status()
            );
            return;
        }

        for fire_at in fire_times {
            println!("  {}", self.zone.format(fire_at));
        }
    }
}

fn print_prescription(prescription: &Prescription) {
    println!(
        "#{} {} ({})",
        prescription.id, prescription.doctor, prescription.issue_date
    );
    for drug in &prescription.drugs {
        let reminders = if drug.reminder_enabled {
            drug.reminder_times.join(", ")
        } else {
            "off".to_owned()
        };
        println!("    {} {} [reminders: {reminders}]", drug.name, drug.dosage);
    }
}
