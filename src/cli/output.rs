use chrono::Local;
use console::{style, Color};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::ai::{AnalysisResult, TaskKind};
use crate::history::{preview_of, HistoryRecord};

const PREVIEW_CHARS: usize = 80;

pub struct OutputFormatter {
    use_colors: bool,
}

/// Stderr spinner shown while waiting on the model. Hidden when stderr is
/// not a terminal.
pub struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", " "]),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    pub fn stop(self) {
        self.bar.finish_and_clear();
    }
}

impl OutputFormatter {
    pub fn new(use_colors: bool) -> Self {
        Self { use_colors }
    }

    pub fn format_result(&self, result: &AnalysisResult) -> String {
        let mut output = String::new();

        for (i, section) in result.sections.iter().enumerate() {
            let heading = format!("{}. {}", i + 1, section.title);
            output.push_str(&self.style_bold(&heading, Color::Cyan));
            output.push('\n');

            for item in &section.items {
                output.push_str(&self.style_text("  • ", Color::Green));
                output.push_str(item);
                output.push('\n');
            }

            if i < result.sections.len() - 1 {
                output.push('\n');
            }
        }

        output.trim_end().to_string()
    }

    pub fn format_analysis(
        &self,
        input_text: &str,
        kind: TaskKind,
        result: &AnalysisResult,
        saved_id: Option<i64>,
    ) -> String {
        let mut output = format!(
            "{} {}\n\n{}",
            self.style_text(&format!("[{}]", kind.label()), Color::Blue),
            input_text,
            self.format_result(result)
        );

        if let Some(id) = saved_id {
            output.push_str("\n\n");
            output.push_str(&self.style_text(&format!("Saved to history as #{id}"), Color::White));
        }

        output
    }

    pub fn format_history_list(&self, records: &[HistoryRecord]) -> String {
        if records.is_empty() {
            return self.format_info("No history records found.");
        }

        let mut output = String::new();

        for (i, record) in records.iter().enumerate() {
            let id = format!("#{:<4}", record.id);
            output.push_str(&self.style_text(&id, Color::Cyan));
            output.push(' ');
            output.push_str(&self.style_text(&format_date(record), Color::White));
            output.push(' ');
            output.push_str(&self.style_text(&format!("[{}]", record.task_kind), Color::Blue));
            output.push(' ');
            output.push_str(&record.input_text);
            output.push('\n');

            let preview = format!("      {}", truncate(preview_of(record), PREVIEW_CHARS));
            output.push_str(&self.style_text(&preview, Color::White));

            if i < records.len() - 1 {
                output.push('\n');
            }
        }

        output
    }

    pub fn format_record(&self, record: &HistoryRecord) -> String {
        format!(
            "{} {}\n{}",
            self.style_text(&format!("#{}", record.id), Color::Cyan),
            self.style_text(&format_date(record), Color::White),
            self.format_analysis(&record.input_text, record.task_kind, &record.result, None)
        )
    }

    pub fn format_error(&self, message: &str) -> String {
        format!("{} {}", self.style_text("Error:", Color::Red), message)
    }

    pub fn format_success(&self, message: &str) -> String {
        format!("{} {}", self.style_text("✓", Color::Green), message)
    }

    pub fn format_warning(&self, message: &str) -> String {
        format!("{} {}", self.style_text("⚠", Color::Yellow), message)
    }

    pub fn format_info(&self, message: &str) -> String {
        format!("{} {}", self.style_text("ℹ", Color::Blue), message)
    }

    fn style_text(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            style(text).fg(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn style_bold(&self, text: &str, color: Color) -> String {
        if self.use_colors {
            style(text).fg(color).bold().to_string()
        } else {
            text.to_string()
        }
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(true)
    }
}

fn format_date(record: &HistoryRecord) -> String {
    record
        .created_at
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}

fn truncate(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        single_line
    } else {
        let cut: String = single_line.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::parse_response;
    use chrono::Utc;

    fn plain() -> OutputFormatter {
        OutputFormatter::new(false)
    }

    #[test]
    fn renders_sections_and_bullets() {
        let result = parse_response("1. One\n- a\n- b\n2. Two\n- c");
        assert_eq!(
            plain().format_result(&result),
            "1. One\n  • a\n  • b\n\n2. Two\n  • c"
        );
    }

    #[test]
    fn analysis_mentions_saved_id() {
        let result = parse_response("1. One\n- a");
        let out = plain().format_analysis("idea", TaskKind::Analysis, &result, Some(7));
        assert!(out.starts_with("[Analysis] idea"));
        assert!(out.ends_with("Saved to history as #7"));
    }

    #[test]
    fn history_list_shows_kind_input_and_preview() {
        let record = HistoryRecord {
            id: 3,
            input_text: "a homepage".to_string(),
            task_kind: TaskKind::FunctionExpand,
            result: parse_response("1. Core\n- Waterfall layout"),
            created_at: Utc::now(),
        };
        let out = plain().format_history_list(&[record]);
        assert!(out.starts_with("#3 "));
        assert!(out.contains("[function-expand] a homepage"));
        assert!(out.contains("Waterfall layout"));
    }

    #[test]
    fn empty_history_list() {
        assert_eq!(
            plain().format_history_list(&[]),
            "ℹ No history records found."
        );
    }

    #[test]
    fn truncate_collapses_whitespace_and_cuts_on_chars() {
        assert_eq!(truncate("a\n  b", 10), "a b");
        assert_eq!(truncate("一二三四五", 3), "一二三…");
    }
}
