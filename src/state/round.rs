//! Round engine
//!
//! A round is `Open` from creation until exactly one resolve call flips it to
//! resolved. Everything here is synchronous and operates on the round value
//! alone; timers and broadcasts live in the orchestrator.

use std::collections::{HashMap, HashSet};
use tokio::time::Instant;

use crate::error::GameError;
use crate::scoring;
use crate::types::*;

#[derive(Debug, Clone)]
pub struct Round {
    pub id: RoundId,
    /// 1-based position within the game
    pub number: u32,
    pub question: Question,
    pub started_at: Instant,
    /// Participants present when the round opened; the all-answered quorum
    pub eligible: HashSet<ParticipantId>,
    pub answers: HashMap<ParticipantId, AnswerRecord>,
    resolved_by: Option<ResolveTrigger>,
}

/// One-time result handed back by the resolve that won
#[derive(Debug, Clone)]
pub struct RoundSummary {
    pub round_id: RoundId,
    pub question_id: QuestionId,
    pub correct_index: usize,
    pub resolved_by: ResolveTrigger,
    pub answers: Vec<(ParticipantId, AnswerRecord)>,
}

impl Round {
    pub fn open(
        number: u32,
        question: Question,
        eligible: HashSet<ParticipantId>,
        now: Instant,
    ) -> Self {
        Self {
            id: RoundId::generate(),
            number,
            question,
            started_at: now,
            eligible,
            answers: HashMap::new(),
            resolved_by: None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved_by.is_some()
    }

    pub fn resolved_by(&self) -> Option<ResolveTrigger> {
        self.resolved_by
    }

    /// Record an answer and score it against the time since the round opened.
    ///
    /// Rejections leave the round untouched.
    pub fn submit_answer(
        &mut self,
        round_id: &RoundId,
        participant_id: &ParticipantId,
        selected_index: usize,
        now: Instant,
    ) -> Result<AnswerRecord, GameError> {
        if *round_id != self.id {
            return Err(GameError::StaleRound(round_id.clone()));
        }
        if self.is_resolved() {
            return Err(GameError::AlreadyResolved);
        }
        if !self.eligible.contains(participant_id) {
            return Err(GameError::NotEligible);
        }
        if self.answers.contains_key(participant_id) {
            return Err(GameError::DuplicateAnswer);
        }

        let elapsed = now.saturating_duration_since(self.started_at);
        let is_correct = selected_index == self.question.correct_index;
        let record = AnswerRecord {
            selected_index,
            elapsed,
            is_correct,
            points: scoring::score(elapsed, is_correct),
        };

        self.answers.insert(participant_id.clone(), record.clone());
        Ok(record)
    }

    /// Every eligible participant has answered
    pub fn all_answered(&self) -> bool {
        self.answers.len() >= self.eligible.len()
    }

    /// The resolve guard: only the first caller gets a summary, every later
    /// caller gets `None`.
    pub fn try_resolve(&mut self, trigger: ResolveTrigger) -> Option<RoundSummary> {
        if self.resolved_by.is_some() {
            return None;
        }
        self.resolved_by = Some(trigger);

        let mut answers: Vec<_> = self
            .answers
            .iter()
            .map(|(id, record)| (id.clone(), record.clone()))
            .collect();
        answers.sort_by_key(|(_, record)| record.elapsed);

        Some(RoundSummary {
            round_id: self.id.clone(),
            question_id: self.question.id.clone(),
            correct_index: self.question.correct_index,
            resolved_by: trigger,
            answers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn question() -> Question {
        Question {
            id: QuestionId::from("q1"),
            text: "Which is the standard SAP programming language?".to_string(),
            choices: vec![
                "Java".to_string(),
                "C++".to_string(),
                "ABAP".to_string(),
                "Python".to_string(),
            ],
            correct_index: 2,
        }
    }

    fn open_round(names: &[&str]) -> (Round, Vec<ParticipantId>, Instant) {
        let ids: Vec<_> = names.iter().map(|n| ParticipantId::from(*n)).collect();
        let now = Instant::now();
        let round = Round::open(1, question(), ids.iter().cloned().collect(), now);
        (round, ids, now)
    }

    #[test]
    fn test_answers_are_scored_by_elapsed_time() {
        let (mut round, ids, t0) = open_round(&["p1", "p2"]);
        let round_id = round.id.clone();

        let fast = round
            .submit_answer(&round_id, &ids[0], 2, t0 + Duration::from_secs(2))
            .unwrap();
        assert!(fast.is_correct);
        assert_eq!(fast.points, 5);

        let wrong = round
            .submit_answer(&round_id, &ids[1], 0, t0 + Duration::from_secs(6))
            .unwrap();
        assert!(!wrong.is_correct);
        assert_eq!(wrong.points, 0);
        assert_eq!(wrong.elapsed, Duration::from_secs(6));
    }

    #[test]
    fn test_duplicate_answer_is_rejected_without_effect() {
        let (mut round, ids, t0) = open_round(&["p1", "p2"]);
        let round_id = round.id.clone();

        round.submit_answer(&round_id, &ids[0], 0, t0).unwrap();
        let err = round
            .submit_answer(&round_id, &ids[0], 2, t0 + Duration::from_secs(1))
            .unwrap_err();

        assert_eq!(err, GameError::DuplicateAnswer);
        assert_eq!(round.answers[&ids[0]].selected_index, 0);
        assert_eq!(round.answers.len(), 1);
    }

    #[test]
    fn test_stale_round_id_is_rejected() {
        let (mut round, ids, t0) = open_round(&["p1"]);
        let stale = RoundId::from("not-this-round");

        let err = round.submit_answer(&stale, &ids[0], 2, t0).unwrap_err();
        assert_eq!(err, GameError::StaleRound(stale));
        assert!(round.answers.is_empty());
    }

    #[test]
    fn test_late_joiner_cannot_answer() {
        let (mut round, _, t0) = open_round(&["p1"]);
        let round_id = round.id.clone();

        let err = round
            .submit_answer(&round_id, &ParticipantId::from("newcomer"), 2, t0)
            .unwrap_err();
        assert_eq!(err, GameError::NotEligible);
    }

    #[test]
    fn test_all_answered_tracks_quorum() {
        let (mut round, ids, t0) = open_round(&["p1", "p2"]);
        let round_id = round.id.clone();

        round.submit_answer(&round_id, &ids[0], 2, t0).unwrap();
        assert!(!round.all_answered());
        round.submit_answer(&round_id, &ids[1], 2, t0).unwrap();
        assert!(round.all_answered());
    }

    #[test]
    fn test_resolve_happens_exactly_once() {
        let (mut round, ids, t0) = open_round(&["p1"]);
        let round_id = round.id.clone();
        round.submit_answer(&round_id, &ids[0], 2, t0).unwrap();

        let first = round.try_resolve(ResolveTrigger::AllAnswered);
        let second = round.try_resolve(ResolveTrigger::Timeout);

        let summary = first.expect("first resolve should win");
        assert_eq!(summary.resolved_by, ResolveTrigger::AllAnswered);
        assert_eq!(summary.correct_index, 2);
        assert_eq!(summary.answers.len(), 1);
        assert!(second.is_none());
        assert_eq!(round.resolved_by(), Some(ResolveTrigger::AllAnswered));
    }

    #[test]
    fn test_no_answers_after_resolution() {
        let (mut round, ids, t0) = open_round(&["p1", "p2"]);
        let round_id = round.id.clone();
        round.try_resolve(ResolveTrigger::Timeout);

        let err = round.submit_answer(&round_id, &ids[0], 2, t0).unwrap_err();
        assert_eq!(err, GameError::AlreadyResolved);
    }
}
