//! Observable pipeline status.
//!
//! `Idle → Processing → {Completed | Errored}`, and from either terminal
//! state back to `Processing` for the next run. Stage changes inside
//! `Processing` are allowed in any order; they only carry progress.

use std::fmt;

use crate::pipeline::RunSummary;

/// Where a running pipeline currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum Stage {
    Resolving,
    Scraping { current: usize, total: usize },
    Composing,
    Rendering,
    Translating { current: usize, total: usize },
    Persisting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolving => write!(f, "Resolving URLs"),
            Self::Scraping { current, total } => write!(f, "Scraping {current}/{total}"),
            Self::Composing => write!(f, "Composing assignment"),
            Self::Rendering => write!(f, "Rendering document"),
            Self::Translating { current, total } => write!(f, "Translating {current}/{total}"),
            Self::Persisting => write!(f, "Saving files"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PipelineState {
    #[default]
    Idle,
    Processing {
        topic: String,
        stage: Stage,
    },
    Completed(RunSummary),
    Errored {
        topic: String,
        message: String,
    },
}

/// A transition the state machine does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} while {from}")]
pub struct InvalidTransition {
    pub from: &'static str,
    pub action: &'static str,
}

impl PipelineState {
    /// Start a run. Allowed from every state except `Processing`.
    pub fn begin(&self, topic: &str) -> Result<Self, InvalidTransition> {
        if self.is_processing() {
            return Err(self.reject("begin a run"));
        }
        Ok(Self::Processing {
            topic: topic.to_string(),
            stage: Stage::Resolving,
        })
    }

    pub fn advance(&self, stage: Stage) -> Result<Self, InvalidTransition> {
        match self {
            Self::Processing { topic, .. } => Ok(Self::Processing {
                topic: topic.clone(),
                stage,
            }),
            _ => Err(self.reject("advance a stage")),
        }
    }

    pub fn complete(&self, summary: RunSummary) -> Result<Self, InvalidTransition> {
        match self {
            Self::Processing { .. } => Ok(Self::Completed(summary)),
            _ => Err(self.reject("complete")),
        }
    }

    pub fn fail(&self, message: impl Into<String>) -> Result<Self, InvalidTransition> {
        match self {
            Self::Processing { topic, .. } => Ok(Self::Errored {
                topic: topic.clone(),
                message: message.into(),
            }),
            _ => Err(self.reject("fail")),
        }
    }

    pub fn is_processing(&self) -> bool {
        matches!(self, Self::Processing { .. })
    }

    /// Short status word, as shown by the status line.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Processing { .. } => "Processing…",
            Self::Completed(_) => "Completed",
            Self::Errored { .. } => "Errored",
        }
    }

    fn reject(&self, action: &'static str) -> InvalidTransition {
        InvalidTransition {
            from: self.label(),
            action,
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Processing { topic, stage } => write!(f, "Processing \"{topic}\": {stage}"),
            Self::Errored { message, .. } => write!(f, "Errored: {message}"),
            other => f.write_str(other.label()),
        }
    }
}
