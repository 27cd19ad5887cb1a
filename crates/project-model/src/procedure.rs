//! Procedure types produced by the external procedure generator.
//!
//! The generator returns one complete JSON document per video. Optional
//! parts (`frames` on a step, `token_usage`) default to empty/absent.

use serde::{Deserialize, Serialize};

use crate::frame::{FrameCapture, FrameId};

/// A generated step-by-step procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub title: String,

    #[serde(default)]
    pub overview: String,

    #[serde(default)]
    pub prerequisites: Vec<String>,

    #[serde(default)]
    pub steps: Vec<ProcedureStep>,

    #[serde(default)]
    pub verification: String,

    #[serde(default)]
    pub troubleshooting: Vec<String>,

    /// Model usage and cost reported by the generator.
    #[serde(
        default,
        alias = "tokenUsage",
        skip_serializing_if = "Option::is_none"
    )]
    pub token_usage: Option<TokenUsage>,
}

/// One numbered step of a procedure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcedureStep {
    /// The step instruction.
    pub main: String,

    /// Sub-steps, rendered as bullets under the step.
    #[serde(default)]
    pub sub: Vec<String>,

    #[serde(default)]
    pub warnings: Vec<String>,

    #[serde(default)]
    pub tips: Vec<String>,

    /// Frames assigned by the step aligner. Empty until alignment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub frames: Vec<FrameCapture>,
}

/// Token counts and cost breakdown for one generation call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub response_tokens: u64,
    pub total_tokens: u64,
    pub costs: CostBreakdown,
}

/// Cost in US dollars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub input_cost: f64,
    pub output_cost: f64,
    pub total_cost: f64,
}

impl ProcedureStep {
    pub fn new(main: impl Into<String>) -> Self {
        Self {
            main: main.into(),
            sub: vec![],
            warnings: vec![],
            tips: vec![],
            frames: vec![],
        }
    }
}

impl Procedure {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            overview: String::new(),
            prerequisites: vec![],
            steps: vec![],
            verification: String::new(),
            troubleshooting: vec![],
            token_usage: None,
        }
    }

    /// Total number of frames attached across all steps.
    pub fn frame_count(&self) -> usize {
        self.steps.iter().map(|s| s.frames.len()).sum()
    }

    /// Suggested download name: the title lower-cased with whitespace runs
    /// collapsed to `-`, then `-procedure.<extension>`.
    pub fn suggested_filename(&self, extension: &str) -> String {
        let stem = self
            .title
            .split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-");
        if stem.is_empty() {
            format!("procedure.{extension}")
        } else {
            format!("{stem}-procedure.{extension}")
        }
    }
}

/// Parse a procedure document.
///
/// Frames embedded in steps get their image dimensions restored and their
/// ids reserved so later captures do not collide with them.
pub fn parse_procedure(json: &str) -> Result<Procedure, serde_json::Error> {
    let mut procedure: Procedure = serde_json::from_str(json)?;
    for step in &mut procedure.steps {
        step.frames = std::mem::take(&mut step.frames)
            .into_iter()
            .map(|frame| {
                FrameId::reserve(frame.id());
                frame.restore_dimensions()
            })
            .collect();
    }
    Ok(procedure)
}
