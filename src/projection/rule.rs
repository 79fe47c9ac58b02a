use std::fmt;
use std::str::FromStr;

use crate::model::{Id, Question};
use crate::store::Record;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ProjectionRule {
    /// Newest first by `created_at`.
    #[default]
    ByRecency,
    /// Highest `votes_score` first.
    ByScore,
    /// Only questions with no answers, in canonical order.
    UnansweredOnly,
}

impl ProjectionRule {
    /// Ids of `questions` under this rule.
    ///
    /// Sorting is stable: questions that compare equal keep their canonical
    /// relative order.
    pub fn apply(self, questions: &[Question]) -> Vec<Id> {
        match self {
            ProjectionRule::ByRecency => {
                let mut ordered: Vec<&Question> = questions.iter().collect();
                ordered.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                ordered.into_iter().map(Record::id).collect()
            }
            ProjectionRule::ByScore => {
                let mut ordered: Vec<&Question> = questions.iter().collect();
                ordered.sort_by(|a, b| b.votes_score.cmp(&a.votes_score));
                ordered.into_iter().map(Record::id).collect()
            }
            ProjectionRule::UnansweredOnly => questions
                .iter()
                .filter(|q| q.is_unanswered())
                .map(Record::id)
                .collect(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectionRule::ByRecency => "newest",
            ProjectionRule::ByScore => "score",
            ProjectionRule::UnansweredOnly => "unanswered",
        }
    }
}

impl fmt::Display for ProjectionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRuleError(pub String);

impl fmt::Display for ParseRuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown projection rule '{}' (expected newest, score or unanswered)",
            self.0
        )
    }
}

impl std::error::Error for ParseRuleError {}

impl FromStr for ProjectionRule {
    type Err = ParseRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" | "recency" | "by_recency" => Ok(ProjectionRule::ByRecency),
            "score" | "by_score" => Ok(ProjectionRule::ByScore),
            "unanswered" | "unanswered_only" => Ok(ProjectionRule::UnansweredOnly),
            _ => Err(ParseRuleError(s.to_string())),
        }
    }
}
