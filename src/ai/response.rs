use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::prompt::{ARGUMENT_HEADER, REQUIREMENT_HEADER};

pub const DEFAULT_FALLBACK_TITLE: &str = "Analysis Result";

// Prompt headers the model tends to echo back before answering.
const ECHO_PREFIXES: [&str; 4] = [REQUIREMENT_HEADER, ARGUMENT_HEADER, "用户需求：", "用户论点："];

// "一、 Title" or "1. Title". The title must open with an ideograph, an ASCII
// word character or whitespace.
static HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[一二三四五]、|[0-9]+\.)\s+[\x{4e00}-\x{9fa5}A-Za-z0-9_\s]")
        .unwrap_or_else(|e| panic!("invalid heading pattern: {e}"))
});

// A CJK ordinal, then a number-dot, each stripped at most once: "一、 2. Foo" is "Foo".
static HEADING_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[一二三四五]、\s+)?(?:[0-9]+\.\s+)?")
        .unwrap_or_else(|e| panic!("invalid heading prefix pattern: {e}"))
});

// "1、", "•", "-" or "1." followed by whitespace.
static ITEM_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[0-9]+、|•|-|[0-9]+\.)\s+")
        .unwrap_or_else(|e| panic!("invalid item prefix pattern: {e}"))
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,
    pub items: Vec<String>,
}

impl Section {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            items: Vec::new(),
        }
    }
}

/// Structured form of a model answer. Never empty when produced by
/// [`ResponseParser::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub sections: Vec<Section>,
}

impl AnalysisResult {
    /// First item of the first section, used as a one-line summary.
    pub fn preview(&self) -> Option<&str> {
        self.sections
            .first()
            .and_then(|section| section.items.first())
            .map(String::as_str)
    }

    pub fn item_count(&self) -> usize {
        self.sections.iter().map(|s| s.items.len()).sum()
    }

    /// Renders the result as plain text: a title line followed by `- item`
    /// lines, sections separated by a blank line.
    pub fn to_plain_text(&self) -> String {
        self.sections
            .iter()
            .map(|section| {
                let mut block = section.title.clone();
                for item in &section.items {
                    block.push_str("\n- ");
                    block.push_str(item);
                }
                block
            })
            .collect::<Vec<_>>()
            .join("\n\n")
            .trim()
            .to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineKind {
    Heading(String),
    Item(String),
    Ignored,
}

/// What to do with sections that collected no items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FallbackPolicy {
    /// Earlier empty sections are kept. If the last section is empty, or no
    /// section was opened, the whole answer becomes one fallback section.
    #[default]
    TrailingSection,
    /// Every empty section is dropped. The fallback section is used only
    /// when nothing is left.
    PerSection,
}

/// Classifies a single line of model output. Headings take priority over
/// items, so `1. Text` always opens a section.
pub fn classify_line(line: &str) -> LineKind {
    if line.trim().is_empty() || is_echo_line(line) {
        return LineKind::Ignored;
    }

    if HEADING_RE.is_match(line) {
        let title = HEADING_PREFIX_RE.replace(line, "");
        let title = title.trim();
        if !title.is_empty() {
            return LineKind::Heading(title.to_string());
        }
    }

    if let Some(prefix) = ITEM_PREFIX_RE.find(line) {
        let text = line[prefix.end()..].trim();
        if !text.is_empty() {
            return LineKind::Item(text.to_string());
        }
    }

    LineKind::Ignored
}

fn is_echo_line(line: &str) -> bool {
    ECHO_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}

#[derive(Debug, Default)]
struct Accumulator {
    completed: Vec<Section>,
    pending: Option<Section>,
}

impl Accumulator {
    fn push(mut self, kind: LineKind) -> Self {
        match kind {
            LineKind::Heading(title) => {
                if let Some(section) = self.pending.take() {
                    self.completed.push(section);
                }
                self.pending = Some(Section::new(title));
            }
            LineKind::Item(text) => match self.pending.as_mut() {
                Some(section) => section.items.push(text),
                None => debug!("Dropping item outside any section: {text}"),
            },
            LineKind::Ignored => {}
        }
        self
    }

    fn finish(self, policy: FallbackPolicy) -> Option<Vec<Section>> {
        let Accumulator {
            mut completed,
            pending,
        } = self;

        match policy {
            FallbackPolicy::TrailingSection => match pending {
                Some(section) if !section.items.is_empty() => {
                    completed.push(section);
                    Some(completed)
                }
                _ => None,
            },
            FallbackPolicy::PerSection => {
                completed.extend(pending);
                completed.retain(|section| !section.items.is_empty());
                if completed.is_empty() {
                    None
                } else {
                    Some(completed)
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResponseParser {
    policy: FallbackPolicy,
    fallback_title: String,
}

impl Default for ResponseParser {
    fn default() -> Self {
        Self::new(FallbackPolicy::default(), DEFAULT_FALLBACK_TITLE)
    }
}

impl ResponseParser {
    pub fn new(policy: FallbackPolicy, fallback_title: impl Into<String>) -> Self {
        let fallback_title = fallback_title.into();
        let fallback_title = if fallback_title.trim().is_empty() {
            DEFAULT_FALLBACK_TITLE.to_string()
        } else {
            fallback_title
        };

        Self {
            policy,
            fallback_title,
        }
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Splits raw model output into sections. Never fails: when no usable
    /// structure is found the whole text becomes a single fallback section.
    pub fn parse(&self, raw_text: &str) -> AnalysisResult {
        let sections = raw_text
            .lines()
            .map(classify_line)
            .fold(Accumulator::default(), Accumulator::push)
            .finish(self.policy);

        match sections {
            Some(sections) => {
                debug!("Parsed {} sections from model output", sections.len());
                AnalysisResult { sections }
            }
            None => {
                debug!("No usable structure in model output, using fallback section");
                AnalysisResult {
                    sections: vec![Section {
                        title: self.fallback_title.clone(),
                        items: vec![raw_text.trim().to_string()],
                    }],
                }
            }
        }
    }
}

/// Parses with the default policy and fallback title.
pub fn parse_response(raw_text: &str) -> AnalysisResult {
    ResponseParser::default().parse(raw_text)
}
