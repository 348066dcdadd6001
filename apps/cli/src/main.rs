//! Console front end for the day collection: the terminal stands in
//! for the web UI, with one "visible" day printed on every switch.

use std::sync::{
    atomic::{AtomicU32, Ordering},
    Arc, Mutex,
};

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use client_core::{
    AttractionView, AttractionViewFactory, DayCollection, DayView, DayViewFactory, HttpDaysBackend,
};
use shared::{
    domain::DayNumber,
    protocol::{AttractionRecord, DayRecord},
};

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load the itinerary and show the current day
    List,
    /// Append a new day to the itinerary
    Add,
    /// Remove a day (the current day unless --day is given)
    Remove {
        #[arg(long)]
        day: Option<u32>,
    },
}

struct ConsoleAttraction {
    record: AttractionRecord,
}

impl AttractionView for ConsoleAttraction {
    fn record(&self) -> &AttractionRecord {
        &self.record
    }
}

struct ConsoleAttractionFactory;

impl AttractionViewFactory for ConsoleAttractionFactory {
    fn create(&self, record: &AttractionRecord) -> Arc<dyn AttractionView> {
        Arc::new(ConsoleAttraction {
            record: record.clone(),
        })
    }
}

struct ConsoleDay {
    number: AtomicU32,
    attractions: Mutex<Vec<Arc<dyn AttractionView>>>,
}

impl DayView for ConsoleDay {
    fn number(&self) -> DayNumber {
        DayNumber(self.number.load(Ordering::SeqCst))
    }

    fn set_number(&self, number: DayNumber) {
        self.number.store(number.0, Ordering::SeqCst);
    }

    fn show(&self) {
        println!("day {}", self.number());
        let attractions = self.attractions.lock().expect("attraction list poisoned");
        if attractions.is_empty() {
            println!("  (nothing planned)");
        }
        for attraction in attractions.iter() {
            let record = attraction.record();
            println!("  {}: {}", record.kind.as_str(), record.name);
        }
    }

    fn hide(&self) {}

    fn hide_remove_button(&self) {}

    fn add_attraction(&self, attraction: Arc<dyn AttractionView>) {
        self.attractions
            .lock()
            .expect("attraction list poisoned")
            .push(attraction);
    }

    fn remove_attraction(&self, attraction: &Arc<dyn AttractionView>) {
        self.attractions
            .lock()
            .expect("attraction list poisoned")
            .retain(|existing| !Arc::ptr_eq(existing, attraction));
    }
}

struct ConsoleDayFactory;

impl DayViewFactory for ConsoleDayFactory {
    fn create(&self, record: &DayRecord) -> Arc<dyn DayView> {
        Arc::new(ConsoleDay {
            number: AtomicU32::new(record.number.0),
            attractions: Mutex::new(Vec::new()),
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let collection = DayCollection::new(
        Arc::new(HttpDaysBackend::new(args.server_url)),
        Arc::new(ConsoleDayFactory),
        Arc::new(ConsoleAttractionFactory),
    );
    collection.load().await?;

    match args.command {
        Command::List => {}
        Command::Add => {
            collection.add_day().await?;
            println!("added day {}", collection.day_count().await);
        }
        Command::Remove { day } => {
            if let Some(number) = day {
                let days = collection.days().await;
                let target = days
                    .iter()
                    .find(|candidate| candidate.number() == DayNumber(number))
                    .cloned()
                    .ok_or_else(|| anyhow!("no day numbered {number}"))?;
                collection.switch_to(target).await;
            }
            collection.delete_current_day().await?;
        }
    }

    let numbers: Vec<String> = collection
        .day_numbers()
        .await
        .iter()
        .map(|number| number.to_string())
        .collect();
    let current = collection
        .current_number()
        .await
        .map(|number| number.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "itinerary: {} day(s) [{}], current = {current}",
        numbers.len(),
        numbers.join(" ")
    );
    Ok(())
}
