//! Topic-based event bus implementation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use battle_core::{BattleEvent, DamageTicket, EventCategory};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Phase changes and the battle outcome
    Phase,
    /// Round, turn and action lifecycle
    Turn,
    /// Damage, effects and cooldowns
    Combat,
}

impl Topic {
    pub const ALL: [Topic; 3] = [Topic::Phase, Topic::Turn, Topic::Combat];
}

impl From<EventCategory> for Topic {
    fn from(category: EventCategory) -> Self {
        match category {
            EventCategory::Phase => Topic::Phase,
            EventCategory::Turn => Topic::Turn,
            EventCategory::Combat => Topic::Combat,
        }
    }
}

/// Event wrapper published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Engine notification drained after a command.
    Battle(BattleEvent),
    /// The worker armed a real-time timer for a suspended action.
    TimerScheduled { serial: u64, delay: Duration },
    /// The worker finished a damage presentation step on the receiver's behalf.
    DamagePresented { ticket: DamageTicket },
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Battle(event) => event.category().into(),
            Event::TimerScheduled { .. } => Topic::Turn,
            Event::DamagePresented { .. } => Topic::Combat,
        }
    }

    pub fn as_battle(&self) -> Option<&BattleEvent> {
        match self {
            Event::Battle(event) => Some(event),
            _ => None,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Every topic channel exists from construction on.
pub struct EventBus {
    channels: Arc<HashMap<Topic, broadcast::Sender<Event>>>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(256)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let channels = Topic::ALL
            .into_iter()
            .map(|topic| (topic, broadcast::channel(capacity.max(1)).0))
            .collect();

        Self {
            channels: Arc::new(channels),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: Event) {
        let topic = event.topic();
        if let Some(tx) = self.channels.get(&topic)
            && tx.send(event).is_err()
        {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!(target: "runtime::events", ?topic, "no subscribers");
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        match self.channels.get(&topic) {
            Some(tx) => tx.subscribe(),
            // Unreachable while every topic is created up front; a detached
            // receiver simply never yields.
            None => broadcast::channel(1).1,
        }
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            channels: Arc::clone(&self.channels),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use battle_core::{BattlePhase, BattleStatus, SquadId};

    use super::*;

    #[test]
    fn battle_events_route_by_category() {
        let phase = Event::Battle(BattleEvent::BattleFinished {
            status: BattleStatus::Victory,
        });
        let turn = Event::Battle(BattleEvent::TurnSkipped { squad: SquadId(0) });
        let timer = Event::TimerScheduled {
            serial: 1,
            delay: Duration::from_millis(600),
        };

        assert_eq!(phase.topic(), Topic::Phase);
        assert_eq!(turn.topic(), Topic::Turn);
        assert_eq!(timer.topic(), Topic::Turn);
        assert_eq!(Event::DamagePresented { ticket: DamageTicket(3) }.topic(), Topic::Combat);
    }

    #[tokio::test]
    async fn subscribers_only_see_their_topic() {
        let bus = EventBus::with_capacity(8);
        let mut phase_rx = bus.subscribe(Topic::Phase);
        let mut combat_rx = bus.subscribe(Topic::Combat);

        bus.publish(Event::Battle(BattleEvent::TurnEnded { squad: SquadId(1) }));
        bus.publish(Event::Battle(BattleEvent::PhaseChanged {
            from: BattlePhase::Loading,
            to: BattlePhase::Tactics,
        }));

        let received = phase_rx.recv().await.unwrap();
        assert!(matches!(
            received.as_battle(),
            Some(BattleEvent::PhaseChanged { to: BattlePhase::Tactics, .. })
        ));
        assert!(combat_rx.try_recv().is_err());
    }
}
