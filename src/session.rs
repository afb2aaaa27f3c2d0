//! In-memory session transcript. Owned by the orchestrator for the process
//! lifetime and discarded at exit; there is deliberately no persistence.

use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct Turn {
    pub user: String,
    pub agent: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeDecision {
    Approved,
    Rejected,
}

#[derive(Debug, Clone)]
pub struct ScopeRecord {
    pub description: String,
    pub decision: ScopeDecision,
    pub at: DateTime<Utc>,
}

/// A summary produced by a sub-agent, kept so later turns (notably article
/// drafting) can build on what the session already gathered.
#[derive(Debug, Clone)]
pub struct GatheredSource {
    pub agent: String,
    pub source: String,
    pub summary: String,
}

#[derive(Debug, Default)]
pub struct Session {
    pub id: String,
    pub turns: Vec<Turn>,
    pub scope_records: Vec<ScopeRecord>,
    pub gathered: Vec<GatheredSource>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn record_turn(&mut self, user: impl Into<String>, agent: impl Into<String>) {
        self.turns.push(Turn {
            user: user.into(),
            agent: agent.into(),
            at: Utc::now(),
        });
    }

    pub fn record_scope(&mut self, description: impl Into<String>, decision: ScopeDecision) {
        self.scope_records.push(ScopeRecord {
            description: description.into(),
            decision,
            at: Utc::now(),
        });
    }

    pub fn record_gathered(
        &mut self,
        agent: impl Into<String>,
        source: impl Into<String>,
        summary: impl Into<String>,
    ) {
        self.gathered.push(GatheredSource {
            agent: agent.into(),
            source: source.into(),
            summary: summary.into(),
        });
    }

    /// Digest of gathered material for the article writer, capped in chars
    /// so it fits a single prompt. An oversized first entry is truncated
    /// rather than dropped.
    pub fn gathered_digest(&self, max_chars: usize) -> String {
        if self.gathered.is_empty() {
            return "No material has been gathered in this session yet.".to_string();
        }

        let mut out = String::new();
        let mut used = 0;
        for (index, source) in self.gathered.iter().enumerate() {
            let entry = format!(
                "[{}] {} ({})\n{}\n\n",
                index + 1,
                source.source,
                source.agent,
                source.summary
            );
            let entry_chars = entry.chars().count();
            if used + entry_chars > max_chars {
                if out.is_empty() {
                    out = entry.chars().take(max_chars).collect();
                }
                break;
            }
            used += entry_chars;
            out.push_str(&entry);
        }
        out.trim_end().to_string()
    }

    pub fn transcript(&self) -> String {
        if self.turns.is_empty() {
            return "No turns recorded in this session.".to_string();
        }

        let mut out = String::new();
        for turn in &self.turns {
            out.push_str(&format!(
                "[{}]\nyou> {}\nagent> {}\n\n",
                turn.at.to_rfc3339(),
                turn.user,
                turn.agent
            ));
        }
        out.trim_end().to_string()
    }
}
