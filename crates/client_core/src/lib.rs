//! Client-side management of the itinerary's day collection.
//!
//! Days live in an ordered list with a reference to the current day.
//! Adding a day either asks the backend to allocate the next slot
//! (empty-add) or hydrates one locally from an already-persisted
//! record (bulk load). Removing the current day is the involved path:
//! the delete is confirmed by the backend first, then the day is
//! spliced out, every survivor is renumbered to its 1-based position,
//! and currency moves to the day that shifted into the freed slot.
//!
//! Rendering is not this crate's concern: days, attractions, and the
//! add/remove controls are reached only through the trait seams below,
//! which the UI layer implements.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use shared::{
    domain::DayNumber,
    protocol::{AttractionRecord, CreateDayRequest, DayRecord, DeleteDayRequest},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{error, warn};

/// An attraction collaborator. Constructed from its wire record; the
/// collection manager depends on no behavior beyond its existence.
pub trait AttractionView: Send + Sync {
    fn record(&self) -> &AttractionRecord;
}

/// A day collaborator as the manager drives it: visibility switches,
/// renumbering after a delete, and attraction attachment.
pub trait DayView: Send + Sync {
    fn number(&self) -> DayNumber;
    fn set_number(&self, number: DayNumber);
    fn show(&self);
    fn hide(&self);
    /// Hides the day's own remove trigger once the day is gone.
    fn hide_remove_button(&self);
    fn add_attraction(&self, attraction: Arc<dyn AttractionView>);
    fn remove_attraction(&self, attraction: &Arc<dyn AttractionView>);
}

pub trait DayViewFactory: Send + Sync {
    fn create(&self, record: &DayRecord) -> Arc<dyn DayView>;
}

pub trait AttractionViewFactory: Send + Sync {
    fn create(&self, record: &AttractionRecord) -> Arc<dyn AttractionView>;
}

/// The add/remove click sources. Each mutating operation runs exactly
/// one disable/enable cycle on its triggering control.
pub trait ItineraryControls: Send + Sync {
    fn set_add_enabled(&self, enabled: bool);
    fn set_remove_enabled(&self, enabled: bool);
}

/// No-op controls for headless use (tests, CLI).
pub struct DetachedControls;

impl ItineraryControls for DetachedControls {
    fn set_add_enabled(&self, _enabled: bool) {}
    fn set_remove_enabled(&self, _enabled: bool) {}
}

/// The persistence API the manager synchronizes against.
#[async_trait]
pub trait DaysBackend: Send + Sync {
    async fn list_days(&self) -> Result<Vec<DayRecord>>;
    async fn create_day(&self, number: DayNumber) -> Result<DayRecord>;
    async fn delete_day(&self, number: DayNumber) -> Result<()>;
}

pub struct MissingDaysBackend;

#[async_trait]
impl DaysBackend for MissingDaysBackend {
    async fn list_days(&self) -> Result<Vec<DayRecord>> {
        Err(anyhow!("days backend unavailable"))
    }

    async fn create_day(&self, number: DayNumber) -> Result<DayRecord> {
        Err(anyhow!("days backend unavailable for day {number}"))
    }

    async fn delete_day(&self, number: DayNumber) -> Result<()> {
        Err(anyhow!("days backend unavailable for day {number}"))
    }
}

/// REST implementation of [`DaysBackend`].
pub struct HttpDaysBackend {
    http: Client,
    server_url: String,
}

impl HttpDaysBackend {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            server_url: server_url.into(),
        }
    }
}

#[async_trait]
impl DaysBackend for HttpDaysBackend {
    async fn list_days(&self) -> Result<Vec<DayRecord>> {
        let records = self
            .http
            .get(format!("{}/api/days/", self.server_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(records)
    }

    async fn create_day(&self, number: DayNumber) -> Result<DayRecord> {
        let record = self
            .http
            .post(format!("{}/api/days/addDay", self.server_url))
            .json(&CreateDayRequest { number })
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(record)
    }

    async fn delete_day(&self, number: DayNumber) -> Result<()> {
        self.http
            .delete(format!("{}/api/days/deleteDay", self.server_url))
            .json(&DeleteDayRequest { number })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum ItineraryEvent {
    DayAdded { number: DayNumber },
    DayRemoved { number: DayNumber },
    CurrentDayChanged { number: DayNumber },
    OperationRejected { reason: String },
    BackendError { operation: &'static str, message: String },
}

#[derive(Debug, Error)]
pub enum ItineraryError {
    #[error("cannot remove the only remaining day")]
    LastDay,
    #[error("no current day selected")]
    NoCurrentDay,
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

struct CollectionState {
    days: Vec<Arc<dyn DayView>>,
    current: Option<Arc<dyn DayView>>,
}

/// Owner of the ordered day list and the current-day reference.
///
/// All mutation happens under one state mutex that is held across the
/// operation's request await point, so add/delete are genuinely
/// mutually exclusive; the control disable/enable cycle is kept as the
/// UI-visible convention on top of that.
///
/// Invariant after every structural change: `days[i].number() == i + 1`.
pub struct DayCollection {
    backend: Arc<dyn DaysBackend>,
    day_factory: Arc<dyn DayViewFactory>,
    attraction_factory: Arc<dyn AttractionViewFactory>,
    controls: Arc<dyn ItineraryControls>,
    inner: Mutex<CollectionState>,
    events: broadcast::Sender<ItineraryEvent>,
}

impl DayCollection {
    pub fn new(
        backend: Arc<dyn DaysBackend>,
        day_factory: Arc<dyn DayViewFactory>,
        attraction_factory: Arc<dyn AttractionViewFactory>,
    ) -> Arc<Self> {
        Self::new_with_controls(
            backend,
            day_factory,
            attraction_factory,
            Arc::new(DetachedControls),
        )
    }

    pub fn new_with_controls(
        backend: Arc<dyn DaysBackend>,
        day_factory: Arc<dyn DayViewFactory>,
        attraction_factory: Arc<dyn AttractionViewFactory>,
        controls: Arc<dyn ItineraryControls>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            backend,
            day_factory,
            attraction_factory,
            controls,
            inner: Mutex::new(CollectionState {
                days: Vec::new(),
                current: None,
            }),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ItineraryEvent> {
        self.events.subscribe()
    }

    /// Populates the collection from the backend. A backend with zero
    /// persisted days is bootstrapped to exactly one via an empty-add;
    /// otherwise every record is hydrated in the order the backend
    /// returned it (the backend is trusted to return ascending numbers;
    /// no sorting happens here). Afterwards the collection is non-empty
    /// and the first day added is current.
    pub async fn load(&self) -> Result<(), ItineraryError> {
        let records = match self.backend.list_days().await {
            Ok(records) => records,
            Err(err) => {
                error!(error = %err, "listing days failed");
                let _ = self.events.send(ItineraryEvent::BackendError {
                    operation: "list",
                    message: err.to_string(),
                });
                return Err(ItineraryError::Backend(err));
            }
        };
        if records.is_empty() {
            self.add_day().await?;
        } else {
            for record in &records {
                self.hydrate_day(record).await;
            }
        }
        Ok(())
    }

    /// Empty-add: asks the backend to allocate the next day slot and
    /// appends the day it returns. The first day ever added becomes
    /// current and is shown. On failure the collection is unchanged and
    /// the add control is re-enabled.
    pub async fn add_day(&self) -> Result<(), ItineraryError> {
        let mut state = self.inner.lock().await;
        self.controls.set_add_enabled(false);
        let number = DayNumber(state.days.len() as u32 + 1);
        let record = match self.backend.create_day(number).await {
            Ok(record) => record,
            Err(err) => {
                error!(%number, error = %err, "creating day failed");
                let _ = self.events.send(ItineraryEvent::BackendError {
                    operation: "create",
                    message: err.to_string(),
                });
                self.controls.set_add_enabled(true);
                return Err(ItineraryError::Backend(err));
            }
        };
        let number = record.number;
        let day = self.build_day(&record);
        self.append_day(&mut state, day);
        self.controls.set_add_enabled(true);
        let _ = self.events.send(ItineraryEvent::DayAdded { number });
        Ok(())
    }

    /// Hydrate-add: constructs a day (and its attractions) from an
    /// already-persisted record without touching the backend. Callers
    /// must feed records in contiguous-number order; only [`load`]'s
    /// bulk path is expected to use this.
    ///
    /// [`load`]: DayCollection::load
    pub async fn hydrate_day(&self, record: &DayRecord) {
        let mut state = self.inner.lock().await;
        // same control cycle as the empty-add even though no request occurs
        self.controls.set_add_enabled(false);
        let day = self.build_day(record);
        self.append_day(&mut state, day);
        self.controls.set_add_enabled(true);
        let _ = self.events.send(ItineraryEvent::DayAdded {
            number: record.number,
        });
    }

    /// Removes the current day. Guard violations (single remaining day,
    /// uninitialized currency) are reported instead of silently
    /// ignored, and the collection is only mutated once the backend has
    /// confirmed the delete: on failure local state still matches
    /// backend truth.
    pub async fn delete_current_day(&self) -> Result<(), ItineraryError> {
        let mut state = self.inner.lock().await;
        self.controls.set_remove_enabled(false);
        if state.days.len() < 2 {
            return Err(self.reject_delete(ItineraryError::LastDay));
        }
        let Some(current) = state.current.clone() else {
            return Err(self.reject_delete(ItineraryError::NoCurrentDay));
        };
        let Some(index) = state.days.iter().position(|day| Arc::ptr_eq(day, &current)) else {
            return Err(self.reject_delete(ItineraryError::NoCurrentDay));
        };

        let number = current.number();
        if let Err(err) = self.backend.delete_day(number).await {
            error!(%number, error = %err, "deleting day failed");
            let _ = self.events.send(ItineraryEvent::BackendError {
                operation: "delete",
                message: err.to_string(),
            });
            self.controls.set_remove_enabled(true);
            return Err(ItineraryError::Backend(err));
        }

        // The day that shifts into the freed slot takes over currency;
        // when the last day was removed, the new last day does.
        let new_current = if index + 1 < state.days.len() {
            Arc::clone(&state.days[index + 1])
        } else {
            Arc::clone(&state.days[index - 1])
        };
        let removed = state.days.remove(index);
        for (i, day) in state.days.iter().enumerate() {
            day.set_number(DayNumber(i as u32 + 1));
        }
        // Currency still names the removed day here, so the hide fired
        // by the switch targets it: hidden exactly once, at the moment
        // of confirmed deletion.
        self.switch_to_locked(&mut state, new_current);
        removed.hide_remove_button();
        self.controls.set_remove_enabled(true);
        let _ = self.events.send(ItineraryEvent::DayRemoved { number });
        Ok(())
    }

    /// Hides the present current day (if any) and shows the new one.
    /// Purely a local visibility transition.
    pub async fn switch_to(&self, new_current: Arc<dyn DayView>) {
        let mut state = self.inner.lock().await;
        self.switch_to_locked(&mut state, new_current);
    }

    pub async fn add_to_current(
        &self,
        attraction: Arc<dyn AttractionView>,
    ) -> Result<(), ItineraryError> {
        let state = self.inner.lock().await;
        let current = state.current.as_ref().ok_or(ItineraryError::NoCurrentDay)?;
        current.add_attraction(attraction);
        Ok(())
    }

    pub async fn remove_from_current(
        &self,
        attraction: &Arc<dyn AttractionView>,
    ) -> Result<(), ItineraryError> {
        let state = self.inner.lock().await;
        let current = state.current.as_ref().ok_or(ItineraryError::NoCurrentDay)?;
        current.remove_attraction(attraction);
        Ok(())
    }

    pub async fn days(&self) -> Vec<Arc<dyn DayView>> {
        self.inner.lock().await.days.clone()
    }

    pub async fn day_count(&self) -> usize {
        self.inner.lock().await.days.len()
    }

    pub async fn day_numbers(&self) -> Vec<DayNumber> {
        let state = self.inner.lock().await;
        state.days.iter().map(|day| day.number()).collect()
    }

    pub async fn current_day(&self) -> Option<Arc<dyn DayView>> {
        self.inner.lock().await.current.clone()
    }

    pub async fn current_number(&self) -> Option<DayNumber> {
        let state = self.inner.lock().await;
        state.current.as_ref().map(|day| day.number())
    }

    fn build_day(&self, record: &DayRecord) -> Arc<dyn DayView> {
        let day = self.day_factory.create(record);
        if let Some(hotel) = &record.hotel {
            day.add_attraction(self.attraction_factory.create(hotel));
        }
        for restaurant in &record.restaurant {
            day.add_attraction(self.attraction_factory.create(restaurant));
        }
        for activity in &record.activity {
            day.add_attraction(self.attraction_factory.create(activity));
        }
        day
    }

    fn append_day(&self, state: &mut CollectionState, day: Arc<dyn DayView>) {
        state.days.push(Arc::clone(&day));
        if state.days.len() == 1 {
            self.switch_to_locked(state, day);
        }
    }

    fn switch_to_locked(&self, state: &mut CollectionState, new_current: Arc<dyn DayView>) {
        if let Some(previous) = state.current.take() {
            previous.hide();
        }
        new_current.show();
        let _ = self.events.send(ItineraryEvent::CurrentDayChanged {
            number: new_current.number(),
        });
        state.current = Some(new_current);
    }

    fn reject_delete(&self, err: ItineraryError) -> ItineraryError {
        warn!(reason = %err, "delete rejected");
        let _ = self.events.send(ItineraryEvent::OperationRejected {
            reason: err.to_string(),
        });
        self.controls.set_remove_enabled(true);
        err
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
