//! Notifications from a session to presentation and audio collaborators.
//!
//! Delivery is fire-and-forget: the session never reads anything back from a sink.

use crate::graph::NodeId;

use serde::Serialize;

/// Something that happened during a session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SessionEvent {
    SessionStarted {
        level: u32,
        time_limit: f32,
    },
    /// A new puzzle is ready to be shown
    PuzzleStarted {
        level: u32,
        layout: String,
        color_count: u8,
        target_color: u8,
    },
    NodeActivated {
        node: NodeId,
        solved: bool,
    },
    PuzzleSolved {
        earned: u32,
        combo_streak: u32,
    },
    /// The streak ended without a solve
    ComboBroken {
        streak: u32,
    },
    TimedOut,
    SessionEnded {
        final_score: u32,
    },
}

/// Receiver of session events
pub trait EventSink {
    fn emit(&mut self, event: &SessionEvent);
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &SessionEvent) {}
}

/// Keeps every event in order
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<SessionEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    pub fn take(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn count(&self, pred: impl Fn(&SessionEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for EventLog {
    fn emit(&mut self, event: &SessionEvent) {
        self.events.push(event.clone());
    }
}

impl<F: FnMut(&SessionEvent)> EventSink for F {
    fn emit(&mut self, event: &SessionEvent) {
        self(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_log_records_in_order() {
        let mut log = EventLog::new();
        log.emit(&SessionEvent::TimedOut);
        log.emit(&SessionEvent::SessionEnded { final_score: 10 });

        assert_eq!(
            log.events(),
            &[
                SessionEvent::TimedOut,
                SessionEvent::SessionEnded { final_score: 10 }
            ]
        );
        assert_eq!(
            log.count(|e| matches!(e, SessionEvent::SessionEnded { .. })),
            1
        );

        assert_eq!(log.take().len(), 2);
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_closure_sink() {
        let mut solved = 0;
        {
            let mut sink = |event: &SessionEvent| {
                if let SessionEvent::PuzzleSolved { .. } = event {
                    solved += 1;
                }
            };
            sink.emit(&SessionEvent::PuzzleSolved {
                earned: 100,
                combo_streak: 1,
            });
            sink.emit(&SessionEvent::TimedOut);
        }
        assert_eq!(solved, 1);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let json = serde_json::to_string(&SessionEvent::NodeActivated {
            node: NodeId(2),
            solved: false,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"NodeActivated","node":2,"solved":false}"#);
    }
}
