use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use slot_scheduler::utils::{logger, validation::Validate};
use slot_scheduler::{
    BookingRequest, Cli, Command, JsonFileStore, Outcome, Scheduler, SchedulerConfig,
    SchedulingError, ServiceDetails, TracingNotifier,
};
use std::path::PathBuf;
use std::sync::Arc;

type CliScheduler = Scheduler<JsonFileStore, TracingNotifier>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => SchedulerConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => SchedulerConfig::default(),
    };

    if cli.json_logs || config.scheduler.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }
    if cli.verbose {
        tracing::debug!("CLI arguments: {:?}", cli);
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ {}", e);
        std::process::exit(2);
    }

    let data_file = cli
        .data
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.scheduler.data_file));
    let store = JsonFileStore::open(&data_file)
        .await
        .with_context(|| format!("failed to open store {}", data_file.display()))?;

    let scheduler = Scheduler::new(Arc::new(store), TracingNotifier, config.settings());

    if !run(&scheduler, &config, cli.command).await? {
        std::process::exit(1);
    }

    Ok(())
}

/// Prints the `{success, ...}` document and reports whether it succeeded.
fn emit<T: Serialize>(result: slot_scheduler::Result<T>) -> anyhow::Result<bool> {
    if let Err(e) = &result {
        tracing::error!("❌ {} (category: {:?})", e, e.category());
    }
    let outcome = Outcome::from(result);
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(outcome.is_success())
}

async fn run(
    scheduler: &CliScheduler,
    config: &SchedulerConfig,
    command: Command,
) -> anyhow::Result<bool> {
    match command {
        Command::OpenDay { business, date } => {
            let result = match config.business(&business) {
                Some(business) => scheduler.open_day(business, date).await,
                None => Err(SchedulingError::ConfigError {
                    message: format!("business {} is not configured", business),
                }),
            };
            emit(result)
        }

        Command::Slots {
            business,
            date,
            duration,
        } => {
            let available = scheduler.find_available_slots(&business, date, duration).await;
            emit(Ok(available.to_listing()))
        }

        Command::Book {
            business,
            customer,
            service,
            date,
            start,
            duration,
            slots,
            service_name,
            price,
        } => {
            let slot_indexes = if slots.is_empty() {
                let label = start.format("%H:%M").to_string();
                let candidate = scheduler
                    .find_available_slots(&business, date, duration)
                    .await
                    .iter()
                    .find(|candidate| candidate.time == label);
                match candidate {
                    Some(candidate) => candidate.slot_indexes,
                    None => {
                        return emit::<()>(Err(SchedulingError::InvalidRequest {
                            message: format!(
                                "no free run of slots starts at {} on {}",
                                label, date
                            ),
                        }))
                    }
                }
            } else {
                slots
            };

            let request = BookingRequest {
                business_id: business,
                customer_id: customer,
                service_id: service,
                date,
                start_time: date.and_time(start),
                slot_indexes,
                service_duration_minutes: duration,
                service: ServiceDetails {
                    name: service_name,
                    price,
                },
            };
            emit(scheduler.book_appointment(request).await)
        }

        Command::Cancel {
            business,
            appointment,
            date,
        } => emit(scheduler.cancel_appointment(&business, &appointment, date).await),

        Command::Approve {
            business,
            appointment,
        } => emit(scheduler.approve_appointment(&business, &appointment).await),

        Command::Reject {
            business,
            appointment,
            reason,
        } => emit(
            scheduler
                .reject_appointment(&business, &appointment, &reason)
                .await,
        ),

        Command::Show { appointment } => emit(scheduler.get_appointment(&appointment).await),
    }
}
