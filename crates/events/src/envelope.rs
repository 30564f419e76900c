use serde::{Deserialize, Serialize};
use uuid::Uuid;

use ecosmart_core::UserId;

use crate::event::Event;

/// Messages that belong to exactly one shopper.
pub trait UserScoped {
    fn user_id(&self) -> UserId;
}

/// Envelope for an event published on the bus.
///
/// `sequence_number` is the aggregate version after the event was applied, so
/// it increases monotonically per user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    user_id: UserId,
    sequence_number: u64,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(event_id: Uuid, user_id: UserId, sequence_number: u64, payload: E) -> Self {
        Self {
            event_id,
            user_id,
            sequence_number,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl<E: Event> EventEnvelope<E> {
    /// Wrap an event with a fresh time-ordered id.
    pub fn wrap(user_id: UserId, sequence_number: u64, payload: E) -> Self {
        Self::new(Uuid::now_v7(), user_id, sequence_number, payload)
    }

    pub fn event_type(&self) -> &'static str {
        self.payload.event_type()
    }
}

impl<E> UserScoped for EventEnvelope<E> {
    fn user_id(&self) -> UserId {
        self.user_id
    }
}
