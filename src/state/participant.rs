use std::collections::{HashMap, HashSet};

use crate::protocol::ParticipantInfo;
use crate::types::*;

/// Who is in a room, with their scores and moderator flags
#[derive(Debug, Clone, Default)]
pub struct ParticipantRegistry {
    participants: HashMap<ParticipantId, Participant>,
    next_seq: u64,
}

impl ParticipantRegistry {
    /// Add a participant with a fresh id and a zero score
    pub fn join(&mut self, name: String, is_moderator: bool) -> Participant {
        let participant = Participant {
            id: ParticipantId::generate(),
            name,
            score: 0,
            is_moderator,
            seq: self.next_seq,
        };
        self.next_seq += 1;

        self.participants
            .insert(participant.id.clone(), participant.clone());
        participant
    }

    /// Remove a participant. Removing someone who is already gone is a no-op.
    pub fn leave(&mut self, id: &ParticipantId) -> Option<Participant> {
        self.participants.remove(id)
    }

    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    pub fn is_moderator(&self, id: &ParticipantId) -> bool {
        self.participants
            .get(id)
            .map(|p| p.is_moderator)
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn ids(&self) -> HashSet<ParticipantId> {
        self.participants.keys().cloned().collect()
    }

    /// Add points to a participant's score. Ignored if they already left.
    pub fn credit(&mut self, id: &ParticipantId, points: u32) {
        if let Some(p) = self.participants.get_mut(id) {
            p.score += points;
        }
    }

    pub fn reset_scores(&mut self) {
        for p in self.participants.values_mut() {
            p.score = 0;
        }
    }

    fn in_join_order(&self) -> Vec<&Participant> {
        let mut list: Vec<_> = self.participants.values().collect();
        list.sort_by_key(|p| p.seq);
        list
    }

    /// Score descending, ties in join order
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        let mut list = self.in_join_order();
        // stable: equal scores keep join order
        list.sort_by(|a, b| b.score.cmp(&a.score));

        list.into_iter()
            .map(|p| LeaderboardEntry {
                id: p.id.clone(),
                name: p.name.clone(),
                score: p.score,
            })
            .collect()
    }

    /// Full roster in join order
    pub fn roster(&self) -> Vec<ParticipantInfo> {
        self.in_join_order()
            .into_iter()
            .map(ParticipantInfo::from)
            .collect()
    }
}
