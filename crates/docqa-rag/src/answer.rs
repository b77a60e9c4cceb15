use serde::Serialize;

/// A generated answer split into a headline and supporting points.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub question: String,
    pub answer_raw: String,
    pub summary: String,
    pub points: Vec<String>,
    pub sources: Vec<String>,
}

impl Answer {
    pub fn from_raw(question: &str, raw: String, sources: Vec<String>) -> Self {
        let mut lines = answer_lines(&raw).into_iter();
        let summary = lines.next().unwrap_or_else(|| raw.clone());
        Self { question: question.to_string(), summary, points: lines.collect(), answer_raw: raw, sources }
    }
}

/// Result for one question of a multi-question query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum QuestionOutcome {
    Answered(Answer),
    Failed { question: String, error: String },
}

impl QuestionOutcome {
    pub fn question(&self) -> &str {
        match self {
            Self::Answered(a) => &a.question,
            Self::Failed { question, .. } => question,
        }
    }

    pub fn answer(&self) -> Option<&Answer> {
        match self {
            Self::Answered(a) => Some(a),
            Self::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MultiAnswer {
    pub original_query: String,
    pub total_questions: usize,
    pub answers: Vec<QuestionOutcome>,
}

const BULLETS: &[char] = &['-', '*', '•'];

/// Non-empty lines of `raw` with bullet markers and padding removed.
pub fn answer_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| line.trim().trim_start_matches(|c: char| BULLETS.contains(&c) || c.is_whitespace()).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
