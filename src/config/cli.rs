use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "slot-scheduler")]
#[command(about = "Publish slot grids, book appointments and process owner decisions")]
pub struct Cli {
    /// TOML configuration with scheduler defaults and business hours
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// JSON store file; overrides `scheduler.data_file`
    #[arg(long, global = true)]
    pub data: Option<PathBuf>,

    #[arg(long, short, global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, global = true, help = "Emit logs as JSON")]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Publish the slot grid for a configured business on a date
    OpenDay {
        #[arg(long)]
        business: String,
        #[arg(long)]
        date: NaiveDate,
    },

    /// List bookable start times for a service duration
    Slots {
        #[arg(long)]
        business: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value = "30")]
        duration: u32,
    },

    /// Book a pending appointment
    Book {
        #[arg(long)]
        business: String,
        #[arg(long)]
        customer: String,
        #[arg(long)]
        service: String,
        #[arg(long)]
        date: NaiveDate,
        /// Start time, e.g. 09:30
        #[arg(long, value_parser = parse_clock_time)]
        start: NaiveTime,
        #[arg(long)]
        duration: u32,
        /// Slot indexes to reserve; derived from availability when omitted
        #[arg(long, value_delimiter = ',')]
        slots: Vec<u32>,
        #[arg(long)]
        service_name: String,
        #[arg(long, default_value = "0")]
        price: f64,
    },

    /// Cancel an appointment and release its slots
    Cancel {
        #[arg(long)]
        business: String,
        #[arg(long)]
        appointment: String,
        #[arg(long)]
        date: NaiveDate,
    },

    /// Confirm a pending appointment
    Approve {
        #[arg(long)]
        business: String,
        #[arg(long)]
        appointment: String,
    },

    /// Reject a pending appointment
    Reject {
        #[arg(long)]
        business: String,
        #[arg(long)]
        appointment: String,
        #[arg(long)]
        reason: String,
    },

    /// Print a stored appointment
    Show {
        #[arg(long)]
        appointment: String,
    },
}

fn parse_clock_time(raw: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|e| format!("expected HH:MM, got {:?}: {}", raw, e))
}
