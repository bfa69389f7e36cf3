use chrono::NaiveDateTime;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use super::aggregate::Reservation;
use super::commands::ReservationCommand;
use super::errors::ReservationError;
use super::events::{ReservationDraft, ReservationEvent};
use super::value_objects::{DinnerType, ReservationStatus};
use crate::clock::Clock;
use crate::domain::catalog::CatalogStore;
use crate::domain::order::Actor;
use crate::event_sourcing::{Aggregate, CommitContext, Repository};
use crate::metrics::Metrics;
use crate::notifications::{Notification, Notifier, Recipient, Topic};
use crate::utils::{CodeSequence, KeyedLocks};

// ============================================================================
// Reservation Service
// ============================================================================
//
// Creation holds the business lock across the slot check and the insert, so
// two requests for the same time cannot both pass. Status changes take the
// reservation's own lock.
//
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ReservationRequest {
    pub partner_id: Uuid,
    pub business_id: Uuid,
    pub date_time: NaiveDateTime,
    pub guests: u32,
    pub dinner_type: DinnerType,
    #[serde(default)]
    pub note: Option<String>,
}

pub struct ReservationService {
    reservations: Arc<Repository<Reservation>>,
    catalog: Arc<dyn CatalogStore>,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    metrics: Arc<Metrics>,
    sequence: CodeSequence,
    business_locks: KeyedLocks<Uuid>,
}

impl ReservationService {
    pub async fn new(
        reservations: Arc<Repository<Reservation>>,
        catalog: Arc<dyn CatalogStore>,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        metrics: Arc<Metrics>,
    ) -> Result<Self, ReservationError> {
        let last = reservations
            .list()
            .await?
            .iter()
            .map(|r| r.request_number)
            .max()
            .unwrap_or(0);

        Ok(Self {
            reservations,
            catalog,
            clock,
            notifier,
            metrics,
            sequence: CodeSequence::starting_after(last),
            business_locks: KeyedLocks::new(),
        })
    }

    pub async fn create(&self, user_id: Uuid, request: ReservationRequest) -> Result<Reservation, ReservationError> {
        if !self.catalog.partner_exists(request.partner_id).await? {
            return Err(ReservationError::PartnerNotFound(request.partner_id));
        }
        let business = self
            .catalog
            .business(request.business_id)
            .await?
            .ok_or(ReservationError::BusinessNotFound(request.business_id))?;

        let _guard = self.business_locks.acquire(&business.id).await;

        let existing: Vec<Reservation> = self
            .reservations
            .list()
            .await?
            .into_iter()
            .filter(|r| r.business_id == business.id)
            .collect();

        let now = self.clock.now();
        let draft = ReservationDraft {
            id: Uuid::new_v4(),
            request_number: self.sequence.next(),
            user_id,
            partner_id: request.partner_id,
            business_id: business.id,
            date_time: request.date_time,
            guests: request.guests,
            dinner_type: request.dinner_type,
            note: request.note,
        };

        let event = match Reservation::request(draft, &business, &existing, now) {
            Ok(event) => event,
            Err(err) => {
                tracing::debug!(
                    business_id = %business.id,
                    date_time = %request.date_time,
                    error = %err,
                    "Reservation request refused"
                );
                self.metrics.record_reservation(err.code_label());
                return Err(err);
            }
        };

        let mut reservation = Reservation::apply_first_event(&event)?;
        self.reservations
            .commit(&mut reservation, vec![event], &CommitContext::new(Some(user_id), now))
            .await?;

        tracing::info!(
            reservation_id = %reservation.id,
            request_number = reservation.request_number,
            business_id = %reservation.business_id,
            date_time = %reservation.date_time,
            guests = reservation.guests,
            "Reservation requested"
        );
        self.metrics.record_reservation("requested");
        self.notifier.notify(Notification::new(
            Recipient::Partner(reservation.partner_id),
            Topic::ReservationRequested,
            format!("New table request #{}", reservation.request_number),
            format!(
                "{} guests on {} ({:?}).",
                reservation.guests, reservation.date_time, reservation.dinner_type
            ),
        ));
        Ok(reservation)
    }

    pub async fn update_status(
        &self,
        reservation_id: Uuid,
        to: ReservationStatus,
        by: Actor,
    ) -> Result<Reservation, ReservationError> {
        let _guard = self.reservations.lock(reservation_id).await;

        let mut reservation = self
            .reservations
            .load(reservation_id)
            .await?
            .ok_or(ReservationError::NotFound(reservation_id))?;

        let now = self.clock.now();
        let events = match reservation.execute(&ReservationCommand::UpdateStatus { to, by, now }) {
            Ok(events) => events,
            Err(err) => {
                tracing::debug!(
                    reservation_id = %reservation_id,
                    status = %reservation.status,
                    requested = %to,
                    error = %err,
                    "Reservation status change rejected"
                );
                return Err(err);
            }
        };

        self.reservations
            .commit(&mut reservation, events.clone(), &CommitContext::new(by.id(), now))
            .await?;

        tracing::info!(
            reservation_id = %reservation.id,
            status = %reservation.status,
            booking_id = ?reservation.booking_id,
            "Reservation status changed"
        );
        self.metrics.record_reservation(reservation.status.as_str());

        for event in &events {
            let body = match event {
                ReservationEvent::Accepted { booking_id, .. } => {
                    format!("Your table for {} is confirmed. Booking id {}.", reservation.date_time, booking_id)
                }
                ReservationEvent::Rejected { .. } => {
                    format!("Your table request for {} was declined.", reservation.date_time)
                }
                ReservationEvent::Requested { .. } => continue,
            };
            self.notifier.notify(Notification::new(
                Recipient::User(reservation.user_id),
                Topic::ReservationDecided,
                format!("Reservation #{} {}", reservation.request_number, reservation.status),
                body,
            ));
        }
        Ok(reservation)
    }

    /// Visible to the requester, the business's partner and admins.
    pub async fn get(&self, reservation_id: Uuid, viewer: Actor) -> Result<Reservation, ReservationError> {
        let reservation = self
            .reservations
            .load(reservation_id)
            .await?
            .ok_or(ReservationError::NotFound(reservation_id))?;

        let allowed = match viewer {
            Actor::Customer(id) => id == reservation.user_id,
            Actor::Partner(id) => id == reservation.partner_id,
            Actor::Admin(_) | Actor::Scheduler => true,
        };
        if !allowed {
            return Err(ReservationError::Unauthorized);
        }
        Ok(reservation)
    }

    /// Soonest first.
    pub async fn list_for_business(
        &self,
        business_id: Uuid,
        status: Option<ReservationStatus>,
        viewer: Actor,
    ) -> Result<Vec<Reservation>, ReservationError> {
        let business = self
            .catalog
            .business(business_id)
            .await?
            .ok_or(ReservationError::BusinessNotFound(business_id))?;
        let allowed = match viewer {
            Actor::Partner(id) => id == business.partner_id,
            Actor::Admin(_) => true,
            Actor::Customer(_) | Actor::Scheduler => false,
        };
        if !allowed {
            return Err(ReservationError::Unauthorized);
        }

        let mut reservations: Vec<Reservation> = self
            .reservations
            .list()
            .await?
            .into_iter()
            .filter(|r| r.business_id == business_id && status.map_or(true, |s| r.status == s))
            .collect();
        reservations.sort_by_key(|r| r.date_time);
        Ok(reservations)
    }
}

impl ReservationError {
    /// Lower-case metric label for refused creations.
    fn code_label(&self) -> &'static str {
        match self {
            ReservationError::SlotTaken(_) => "slot_taken",
            ReservationError::OutsideHours(_) => "outside_hours",
            ReservationError::FeatureDisabled => "feature_disabled",
            _ => "invalid",
        }
    }
}
