use crate::types::*;
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    Join {
        #[serde(default)]
        room_id: String,
        #[serde(default)]
        name: String,
        #[serde(default)]
        is_moderator: bool,
    },
    /// Moderator forces the first round open
    StartRound,
    Answer {
        round_id: RoundId,
        selected_index: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        server_now: String,
    },
    /// Sent only to the participant who joined
    Joined {
        participant_id: ParticipantId,
        room_id: RoomId,
        name: String,
        is_moderator: bool,
    },
    ParticipantsUpdate {
        participants: Vec<ParticipantInfo>,
    },
    Leaderboard {
        entries: Vec<LeaderboardEntry>,
    },
    StartRound {
        round_id: RoundId,
        round_no: u32,
        total_rounds: u32,
        question: QuestionInfo,
        time_limit_secs: u64,
        server_now: String,
    },
    PlayerAnswered {
        round_id: RoundId,
        participant_id: ParticipantId,
        correct: bool,
        points: u32,
        elapsed_ms: u64,
    },
    RoundResult {
        round_id: RoundId,
        correct_index: usize,
        resolved_by: ResolveTrigger,
        answers: Vec<AnswerInfo>,
    },
    GameOver {
        outcome: GameOutcome,
        message: String,
        leaderboard: Vec<LeaderboardEntry>,
    },
    ErrorMsg {
        code: String,
        msg: String,
    },
}

impl From<crate::error::GameError> for ServerMessage {
    fn from(e: crate::error::GameError) -> Self {
        ServerMessage::ErrorMsg {
            code: e.code().to_string(),
            msg: e.to_string(),
        }
    }
}

/// Roster entry for `participants_update`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParticipantInfo {
    pub id: ParticipantId,
    pub name: String,
    pub score: u32,
    pub is_moderator: bool,
}

impl From<&Participant> for ParticipantInfo {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            score: p.score,
            is_moderator: p.is_moderator,
        }
    }
}

/// Public question view (no correct index until the round resolves)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuestionInfo {
    pub id: QuestionId,
    pub text: String,
    pub choices: Vec<String>,
}

impl From<&Question> for QuestionInfo {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            text: q.text.clone(),
            choices: q.choices.clone(),
        }
    }
}

/// Per-participant line in `round_result`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnswerInfo {
    pub participant_id: ParticipantId,
    pub selected_index: usize,
    pub correct: bool,
    pub points: u32,
    pub elapsed_ms: u64,
}

impl From<(ParticipantId, AnswerRecord)> for AnswerInfo {
    fn from((participant_id, record): (ParticipantId, AnswerRecord)) -> Self {
        Self {
            participant_id,
            selected_index: record.selected_index,
            correct: record.is_correct,
            points: record.points,
            elapsed_ms: record.elapsed.as_millis() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_client_messages_parse_from_wire() {
        let join: ClientMessage =
            serde_json::from_str(r#"{"t":"join","room_id":"r1","name":"Alice","is_moderator":true}"#)
                .unwrap();
        assert!(matches!(
            join,
            ClientMessage::Join { ref room_id, is_moderator: true, .. } if room_id == "r1"
        ));

        let start: ClientMessage = serde_json::from_str(r#"{"t":"start_round"}"#).unwrap();
        assert!(matches!(start, ClientMessage::StartRound));

        let answer: ClientMessage =
            serde_json::from_str(r#"{"t":"answer","round_id":"01R","selected_index":2}"#).unwrap();
        match answer {
            ClientMessage::Answer {
                round_id,
                selected_index,
            } => {
                assert_eq!(round_id.as_str(), "01R");
                assert_eq!(selected_index, 2);
            }
            other => panic!("Expected answer, got {:?}", other),
        }
    }

    #[test]
    fn test_join_defaults() {
        let join: ClientMessage = serde_json::from_str(r#"{"t":"join"}"#).unwrap();
        match join {
            ClientMessage::Join {
                room_id,
                name,
                is_moderator,
            } => {
                assert!(room_id.is_empty());
                assert!(name.is_empty());
                assert!(!is_moderator);
            }
            other => panic!("Expected join, got {:?}", other),
        }
    }

    #[test]
    fn test_question_info_hides_correct_index() {
        let question = Question {
            id: QuestionId::from("q"),
            text: "Pick one".to_string(),
            choices: vec!["a".to_string(), "b".to_string()],
            correct_index: 1,
        };
        let json = serde_json::to_value(QuestionInfo::from(&question)).unwrap();
        assert!(json.get("correct_index").is_none());
        assert_eq!(json["text"], "Pick one");
    }

    #[test]
    fn test_server_event_names() {
        let msg = ServerMessage::PlayerAnswered {
            round_id: RoundId::from("r"),
            participant_id: ParticipantId::from("p"),
            correct: true,
            points: 5,
            elapsed_ms: 1200,
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["t"], "player_answered");

        let err: ServerMessage = crate::error::GameError::DuplicateAnswer.into();
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["t"], "error_msg");
        assert_eq!(json["code"], "DUPLICATE_ANSWER");
    }

    #[test]
    fn test_answer_info_from_record() {
        let info = AnswerInfo::from((
            ParticipantId::from("p"),
            AnswerRecord {
                selected_index: 1,
                elapsed: Duration::from_millis(2500),
                is_correct: true,
                points: 5,
            },
        ));
        assert_eq!(info.elapsed_ms, 2500);
        assert!(info.correct);
    }
}
