//! Stdout JSON envelopes and progress events
//!
//! Every command ends with exactly one envelope. Long-running commands write
//! progress events as JSON lines before it.

use std::io::Write;
use std::sync::Mutex;

use arena_core::{GameType, Move, PokerAction, RoundOutcome};
use serde::Serialize;
use serde_json::Value;

use crate::error::ArenaError;

/// Final document of a command
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    Success { ok: bool, data: Value },
    Failure { ok: bool, error: String, code: String },
}

impl Envelope {
    pub fn success(data: Value) -> Self {
        Self::Success { ok: true, data }
    }

    pub fn failure(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self::Failure { ok: false, error: error.into(), code: code.into() }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Process exit code for this envelope
    pub fn exit_code(&self) -> i32 {
        if self.is_ok() {
            0
        } else {
            1
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"ok":false,"error":"failed to encode output: {}","code":"DECODE_ERROR"}}"#, e)
        })
    }
}

impl From<&ArenaError> for Envelope {
    fn from(err: &ArenaError) -> Self {
        Self::failure(err.code(), err.to_string())
    }
}

/// Our result for one RPS round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundResult {
    Won,
    Lost,
    Draw,
}

impl RoundResult {
    /// Outcome as seen from `mine`
    pub fn from_outcome(outcome: RoundOutcome, mine: RoundOutcome) -> Self {
        match outcome {
            RoundOutcome::Draw => Self::Draw,
            o if o == mine => Self::Won,
            _ => Self::Lost,
        }
    }
}

/// Intermediate progress written while a game is played
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ProgressEvent {
    MatchAccepted {
        match_id: u64,
        tx: String,
    },
    GameCreated {
        game_type: GameType,
        game_id: u64,
        match_id: u64,
        tx: String,
    },
    GameFound {
        game_type: GameType,
        game_id: u64,
        match_id: u64,
    },
    PhaseChanged {
        game_type: GameType,
        game_id: u64,
        phase: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        round: Option<u64>,
    },
    Committed {
        game_type: GameType,
        game_id: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        round: Option<u64>,
        tx: String,
    },
    Revealed {
        game_type: GameType,
        game_id: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        round: Option<u64>,
        value: String,
        tx: String,
    },
    Round {
        game_id: u64,
        round: u64,
        my_move: Move,
        opponent_move: Move,
        result: RoundResult,
        my_score: u32,
        opponent_score: u32,
    },
    Action {
        game_id: u64,
        action: PokerAction,
        value: String,
        tx: String,
    },
    TimeoutClaimed {
        game_type: GameType,
        game_id: u64,
        tx: String,
    },
    Settled {
        game_type: GameType,
        game_id: u64,
    },
}

/// Destination for progress events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

/// JSON lines on stdout
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl EventSink for StdoutSink {
    fn emit(&self, event: ProgressEvent) {
        if let Ok(line) = serde_json::to_string(&event) {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{}", line);
            let _ = out.flush();
        }
    }
}

/// Collects events in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelopes() {
        let ok = Envelope::success(json!({ "matchId": 4 }));
        assert_eq!(ok.to_json(), r#"{"ok":true,"data":{"matchId":4}}"#);
        assert_eq!(ok.exit_code(), 0);

        let err = Envelope::from(&ArenaError::MissingPrivateKey);
        let value: Value = serde_json::from_str(&err.to_json()).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["code"], "MISSING_PRIVATE_KEY");
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_event_shape() {
        let event = ProgressEvent::Committed {
            game_type: GameType::Rps,
            game_id: 2,
            round: Some(0),
            tx: "0xab".into(),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "event": "committed", "gameType": "rps", "gameId": 2, "round": 0, "tx": "0xab" })
        );

        let settled = ProgressEvent::Settled { game_type: GameType::Auction, game_id: 1 };
        assert_eq!(serde_json::to_string(&settled).unwrap(), r#"{"event":"settled","gameType":"auction","gameId":1}"#);
    }

    #[test]
    fn test_round_result_perspective() {
        assert_eq!(RoundResult::from_outcome(RoundOutcome::Player1, RoundOutcome::Player1), RoundResult::Won);
        assert_eq!(RoundResult::from_outcome(RoundOutcome::Player1, RoundOutcome::Player2), RoundResult::Lost);
        assert_eq!(RoundResult::from_outcome(RoundOutcome::Draw, RoundOutcome::Player2), RoundResult::Draw);
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        sink.emit(ProgressEvent::MatchAccepted { match_id: 1, tx: "0x01".into() });
        assert_eq!(sink.events().len(), 1);
    }
}
