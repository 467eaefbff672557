use anyhow::{anyhow, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Echo header opening the function-expansion prompt. Models sometimes repeat it.
pub const REQUIREMENT_HEADER: &str = "User requirement:";
/// Echo header opening the analysis prompt.
pub const ARGUMENT_HEADER: &str = "User argument:";

/// The kind of work requested for a piece of user input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum TaskKind {
    /// Suggest features and improvements for a requirement
    FunctionExpand,
    /// Break down an argument and plan how to act on it
    Analysis,
}

impl TaskKind {
    pub const ALL: [TaskKind; 2] = [TaskKind::FunctionExpand, TaskKind::Analysis];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::FunctionExpand => "function-expand",
            TaskKind::Analysis => "analysis",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TaskKind::FunctionExpand => "Function expansion",
            TaskKind::Analysis => "Analysis",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        TaskKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| anyhow!("Unknown task kind: {s}"))
    }
}

// `{input}` is the only placeholder. Heading and item markers requested here
// are exactly the ones `ResponseParser` recognises; change both together.
const FUNCTION_EXPAND_TEMPLATE: &str = r#"User requirement: {input}

Based on this requirement, produce a complete, actionable plan along two dimensions: "core features and experience upgrades" and "advanced technical optimisation". Requirements:

1. Core features and experience upgrades
- First list the essential core features, each with a minimal implementation idea (UI structure or basic interaction logic).
- Then add 4-5 experience upgrades that go beyond the request, each stating the user value and a simple implementation path.

2. Advanced technical optimisation
- Give 3-4 key performance or robustness measures for large data volumes, weak networks and similar scenarios.
- For each measure state where it applies, which technology to use and what problem it solves.

Output format:
- Start every dimension on its own line as "1. Title", "2. Title".
- Under each dimension, write one point per line prefixed with "- " or "1、", "2、".
- Keep each point to 2-3 sentences focused on what to do, how to do it and what it solves.
- Do not repeat the requirement and do not add an introduction or conclusion."#;

const ANALYSIS_TEMPLATE: &str = r#"User argument: {input}

Analyse this argument along two dimensions: "core value breakdown" and "path to action". Requirements:

1. Core value breakdown
- Explain, point by point, why the argument matters from the angles of personal growth, long-term development, competitiveness and understanding.
- Ground every point in a concrete, realistic scenario rather than generic statements.
- Point out what is gained by acting early rather than late.

2. Path to action
- Break the goal into stages, each with its core task, concrete actions and a practical method.
- Every action must be specific and doable (name the tool to learn or the project to finish).
- Add 1-2 pitfalls to avoid.

Output format:
- Start every dimension on its own line as "1. Title", "2. Title".
- Under each dimension, write one point per line prefixed with "- " or "1、", "2、".
- Keep each point to 2-3 sentences, moving from "why" to "how".
- Do not repeat the argument and do not add an introduction or conclusion."#;

pub struct PromptBuilder;

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self
    }

    pub fn template(&self, kind: TaskKind) -> &'static str {
        match kind {
            TaskKind::FunctionExpand => FUNCTION_EXPAND_TEMPLATE,
            TaskKind::Analysis => ANALYSIS_TEMPLATE,
        }
    }

    /// Builds the instruction text sent to the model. The input is inserted
    /// verbatim; callers reject empty input beforehand.
    pub fn build_prompt(&self, input_text: &str, kind: TaskKind) -> String {
        self.template(kind).replacen("{input}", input_text, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_contains_input_verbatim() {
        let builder = PromptBuilder::new();
        for kind in TaskKind::ALL {
            let input = "Build a note-taking homepage with {braces} and 中文";
            let prompt = builder.build_prompt(input, kind);
            assert!(!prompt.is_empty());
            assert!(prompt.contains(input));
        }
    }

    #[test]
    fn prompt_is_deterministic() {
        let builder = PromptBuilder::new();
        let a = builder.build_prompt("same input", TaskKind::Analysis);
        let b = builder.build_prompt("same input", TaskKind::Analysis);
        assert_eq!(a, b);
    }

    #[test]
    fn prompts_differ_by_kind_and_start_with_echo_header() {
        let builder = PromptBuilder::new();
        let expand = builder.build_prompt("x", TaskKind::FunctionExpand);
        let analysis = builder.build_prompt("x", TaskKind::Analysis);
        assert_ne!(expand, analysis);
        assert!(expand.starts_with(REQUIREMENT_HEADER));
        assert!(analysis.starts_with(ARGUMENT_HEADER));
    }

    #[test]
    fn every_kind_has_its_own_template() {
        let builder = PromptBuilder::new();
        let templates: Vec<_> = TaskKind::ALL.iter().map(|k| builder.template(*k)).collect();
        assert_eq!(templates.len(), 2);
        assert_ne!(templates[0], templates[1]);
        assert!(templates.iter().all(|t| t.matches("{input}").count() == 1));
    }

    #[test]
    fn placeholder_in_input_is_not_expanded() {
        let builder = PromptBuilder::new();
        let prompt = builder.build_prompt("{input}", TaskKind::FunctionExpand);
        assert!(prompt.starts_with("User requirement: {input}\n"));
    }

    #[test]
    fn task_kind_names_round_trip() {
        assert_eq!(
            "function-expand".parse::<TaskKind>().unwrap(),
            TaskKind::FunctionExpand
        );
        assert_eq!("analysis".parse::<TaskKind>().unwrap(), TaskKind::Analysis);
        assert!("summary".parse::<TaskKind>().is_err());
        assert_eq!(
            serde_json::to_string(&TaskKind::FunctionExpand).unwrap(),
            "\"function-expand\""
        );
    }
}
