use serde::{Deserialize, Serialize};

/// Server-owned snapshot of one live shoot.
///
/// The client never patches a snapshot field by field; every confirmed update replaces
/// the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shoot {
    /// Short code identifying the shoot.
    pub code: String,
    /// Participants in server order.
    #[serde(default)]
    pub participants: Vec<Participant>,
    /// Optional display title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Name of the archer who created the shoot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    /// Creation timestamp as reported by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last server-side modification timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

/// An archer's live entry within a shoot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    /// Display name, unique within a shoot.
    pub archer_name: String,
    /// Running total.
    #[serde(default)]
    pub total_score: u32,
    /// Round being shot.
    pub round_name: String,
    /// Arrows counted so far.
    #[serde(default)]
    pub arrows_shot: u32,
    /// Classification reached, if computed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
    /// Per-end subtotals, when the archer shares them.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_scores: Option<Vec<u32>>,
    /// Set once the archer has finished the round.
    #[serde(default)]
    pub finished: bool,
    /// Server timestamp of the join.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joined_at: Option<String>,
    /// Server timestamp of the latest score.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl Shoot {
    /// Build an empty shoot for `code`.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            participants: Vec::new(),
            title: None,
            created_by: None,
            created_at: None,
            last_updated: None,
        }
    }

    /// Look up a participant by archer name.
    pub fn participant(&self, archer_name: &str) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|participant| participant.archer_name == archer_name)
    }

    /// Whether `archer_name` is listed among the participants.
    pub fn has_participant(&self, archer_name: &str) -> bool {
        self.participant(archer_name).is_some()
    }

    /// Participant with the highest total; ties keep the earliest entry.
    pub fn leader(&self) -> Option<&Participant> {
        self.participants
            .iter()
            .fold(None, |best: Option<&Participant>, candidate| match best {
                Some(current) if current.total_score >= candidate.total_score => Some(current),
                _ => Some(candidate),
            })
    }
}

impl Participant {
    /// Build a participant that has not shot yet.
    pub fn new(archer_name: impl Into<String>, round_name: impl Into<String>) -> Self {
        Self {
            archer_name: archer_name.into(),
            total_score: 0,
            round_name: round_name.into(),
            arrows_shot: 0,
            classification: None,
            end_scores: None,
            finished: false,
            joined_at: None,
            last_updated: None,
        }
    }

    /// Set the running total and arrow count.
    pub fn with_score(mut self, total_score: u32, arrows_shot: u32) -> Self {
        self.total_score = total_score;
        self.arrows_shot = arrows_shot;
        self
    }

    /// Mark the participant as finished.
    pub fn finished(mut self) -> Self {
        self.finished = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_server_payload_with_missing_optionals() {
        let payload = r#"{
            "code": "AB12",
            "participants": [
                {"archerName": "Alice", "totalScore": 312, "roundName": "national", "arrowsShot": 36},
                {"archerName": "Bob", "roundName": "national", "finished": true, "endScores": [48, 50]}
            ],
            "createdBy": "Alice"
        }"#;

        let shoot: Shoot = serde_json::from_str(payload).unwrap();
        assert_eq!(shoot.code, "AB12");
        assert_eq!(shoot.title, None);
        assert_eq!(shoot.created_by.as_deref(), Some("Alice"));
        assert_eq!(shoot.participants[0].total_score, 312);
        assert!(!shoot.participants[0].finished);
        assert_eq!(shoot.participants[1].total_score, 0);
        assert_eq!(shoot.participants[1].end_scores, Some(vec![48, 50]));
        assert!(shoot.participants[1].finished);
    }

    #[test]
    fn leader_prefers_earliest_on_tie() {
        let mut shoot = Shoot::new("AB12");
        shoot.participants = vec![
            Participant::new("Alice", "national").with_score(100, 12),
            Participant::new("Bob", "national").with_score(120, 12),
            Participant::new("Cara", "national").with_score(120, 12),
        ];

        assert_eq!(shoot.leader().unwrap().archer_name, "Bob");
        assert!(Shoot::new("EMPTY").leader().is_none());
    }

    #[test]
    fn participant_lookup_is_exact() {
        let mut shoot = Shoot::new("AB12");
        shoot.participants = vec![Participant::new("Alice", "national")];
        assert!(shoot.has_participant("Alice"));
        assert!(!shoot.has_participant("alice"));
    }
}
