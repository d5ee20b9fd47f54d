//! Arena Wire Protocol Types
//!
//! This crate defines the shared event types used on the bidirectional
//! channel between a connected client and the orchestration core. Events are
//! JSON objects of the form `{"event": ..., "data": ...}` with snake_case
//! event names, matching the protocol the browser client speaks.
//!
//! # Event Categories
//!
//! - **Lobby** — `join_lobby`, `update_lobby_state`, `search_for_game`,
//!   `searching_started`, `cancel_search`, `search_cancelled`
//! - **Match** — `game_started`, `player_input`, `game_update`, `game_over`,
//!   `player_disconnected`
//! - **Errors** — `error`, carrying a human-readable message for state
//!   conflicts; protocol violations are dropped server-side and never acked.

#![deny(unsafe_code)]

use serde::{Deserialize, Serialize};

// ============================================================================
// Grid Types
// ============================================================================

/// A grid cell as it travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl From<arena_sim::Cell> for Cell {
    fn from(c: arena_sim::Cell) -> Self {
        Self { x: c.x, y: c.y }
    }
}

impl From<Cell> for arena_sim::Cell {
    fn from(c: Cell) -> Self {
        Self { x: c.x, y: c.y }
    }
}

/// Cardinal direction as sent by the client. Serializes as a lowercase
/// string (`"up"`, `"down"`, `"left"`, `"right"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl From<Direction> for arena_sim::Direction {
    fn from(d: Direction) -> Self {
        match d {
            Direction::Up => Self::Up,
            Direction::Down => Self::Down,
            Direction::Left => Self::Left,
            Direction::Right => Self::Right,
        }
    }
}

impl From<arena_sim::Direction> for Direction {
    fn from(d: arena_sim::Direction) -> Self {
        match d {
            arena_sim::Direction::Up => Self::Up,
            arena_sim::Direction::Down => Self::Down,
            arena_sim::Direction::Left => Self::Left,
            arena_sim::Direction::Right => Self::Right,
        }
    }
}

// ============================================================================
// Lobby Payloads
// ============================================================================

/// One session as shown in the lobby: display glyph and reward-points
/// balance. Connection identifiers never appear on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyPlayer {
    pub glyph: String,
    pub points: u32,
}

/// Two sessions fighting in the same match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatPair {
    pub player1: LobbyPlayer,
    pub player2: LobbyPlayer,
}

/// The aggregated lobby view, pushed in full to every connected session on
/// every membership change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LobbySnapshot {
    pub searching: Vec<LobbyPlayer>,
    pub in_combat: Vec<CombatPair>,
    pub spectators: Vec<LobbyPlayer>,
}

// ============================================================================
// Match Payloads
// ============================================================================

/// One participant's snake as broadcast per tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub glyph: String,
    /// Occupied cells, head first.
    pub snake: Vec<Cell>,
    pub alive: bool,
    pub score: u32,
}

/// Full match state for `game_started` and `game_update`.
///
/// The `players` order is mirrored per recipient: each participant sees
/// itself first. Cell data is identical for all recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub players: Vec<PlayerView>,
    pub food: Cell,
}

// ============================================================================
// Events
// ============================================================================

/// Messages from client to core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Register (or re-activate) a session under a display glyph.
    JoinLobby { glyph: String },
    /// Enter the matchmaking queue.
    SearchForGame,
    /// Leave the matchmaking queue.
    CancelSearch,
    /// Latest-direction buffer update for the running match.
    PlayerInput { direction: Direction },
}

/// Messages from core to client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Full lobby snapshot, sent on every membership change.
    UpdateLobbyState(LobbySnapshot),
    /// Ack: the session entered the matchmaking queue.
    SearchingStarted,
    /// Ack: the session left the matchmaking queue.
    SearchCancelled,
    /// The session's match entered its running phase.
    GameStarted(GameState),
    /// Per-tick state broadcast.
    GameUpdate(GameState),
    /// Terminal notification. `winner` is absent on a draw; `points_won`
    /// carries the reward amount credited to the winner.
    GameOver {
        winner: Option<String>,
        players: Vec<PlayerView>,
        #[serde(skip_serializing_if = "Option::is_none")]
        points_won: Option<u32>,
    },
    /// The opponent's connection dropped; the match is resolved as a win
    /// for the recipient. Distinct from `game_over`.
    PlayerDisconnected,
    /// A state conflict the client can surface to the user.
    Error { message: String },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_client_event_names_match_observed_protocol() {
        let join: Value =
            serde_json::to_value(ClientEvent::JoinLobby { glyph: "🦊".into() }).unwrap();
        assert_eq!(join["event"], "join_lobby");
        assert_eq!(join["data"]["glyph"], "🦊");

        let search: Value = serde_json::to_value(ClientEvent::SearchForGame).unwrap();
        assert_eq!(search, json!({ "event": "search_for_game" }));

        let cancel: Value = serde_json::to_value(ClientEvent::CancelSearch).unwrap();
        assert_eq!(cancel, json!({ "event": "cancel_search" }));

        let input: Value = serde_json::to_value(ClientEvent::PlayerInput {
            direction: Direction::Up,
        })
        .unwrap();
        assert_eq!(input, json!({ "event": "player_input", "data": { "direction": "up" } }));
    }

    #[test]
    fn test_directions_serialize_lowercase() {
        for (dir, name) in [
            (Direction::Up, "up"),
            (Direction::Down, "down"),
            (Direction::Left, "left"),
            (Direction::Right, "right"),
        ] {
            assert_eq!(serde_json::to_value(dir).unwrap(), json!(name));
        }
    }

    #[test]
    fn test_client_event_parses_from_raw_json() {
        let event: ClientEvent = serde_json::from_str(
            r#"{ "event": "player_input", "data": { "direction": "left" } }"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::PlayerInput {
                direction: Direction::Left
            }
        );

        let event: ClientEvent =
            serde_json::from_str(r#"{ "event": "search_for_game" }"#).unwrap();
        assert_eq!(event, ClientEvent::SearchForGame);
    }

    #[test]
    fn test_malformed_direction_is_an_error_not_a_panic() {
        let result: Result<ClientEvent, _> = serde_json::from_str(
            r#"{ "event": "player_input", "data": { "direction": "diagonal" } }"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_game_over_omits_absent_winner_points() {
        let over = ServerEvent::GameOver {
            winner: None,
            players: vec![],
            points_won: None,
        };
        let value = serde_json::to_value(&over).unwrap();
        assert_eq!(value["event"], "game_over");
        assert!(value["data"].get("points_won").is_none());
    }

    #[test]
    fn test_server_event_roundtrip() {
        let snapshot = ServerEvent::UpdateLobbyState(LobbySnapshot {
            searching: vec![LobbyPlayer {
                glyph: "🚀".into(),
                points: 12,
            }],
            in_combat: vec![CombatPair {
                player1: LobbyPlayer {
                    glyph: "🦊".into(),
                    points: 3,
                },
                player2: LobbyPlayer {
                    glyph: "👾".into(),
                    points: 0,
                },
            }],
            spectators: vec![],
        });
        let encoded = serde_json::to_string(&snapshot).unwrap();
        let decoded: ServerEvent = serde_json::from_str(&encoded).unwrap();
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn test_direction_conversion_roundtrip() {
        for dir in [
            Direction::Up,
            Direction::Down,
            Direction::Left,
            Direction::Right,
        ] {
            let sim: arena_sim::Direction = dir.into();
            assert_eq!(Direction::from(sim), dir);
        }
    }
}
