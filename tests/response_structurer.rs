//! Behavioural tests for prompt building and response structuring through the
//! public API.

use outliner::ai::{classify_line, FallbackPolicy, LineKind};
use outliner::{parse_response, PromptBuilder, ResponseParser, Section, TaskKind};

const TYPICAL_ANSWER: &str = "\
User requirement: implement a note-sharing homepage
Sure! Here is a structured plan.

1. Core features and experience upgrades
1、 Waterfall layout: two columns of note cards with lazy images.
2、 Top navigation with tabs for Follow, Discover and Nearby.
- Search entry pinned at the top.

2. Advanced technical optimisation
• Virtual list rendering with react-window for thousands of cards.
•   Image lazy loading via IntersectionObserver.

Hope this helps!
";

#[test]
fn typical_answer_is_structured_in_order() {
    let result = parse_response(TYPICAL_ANSWER);

    assert_eq!(
        result.sections,
        vec![
            Section {
                title: "Core features and experience upgrades".into(),
                items: vec![
                    "Waterfall layout: two columns of note cards with lazy images.".into(),
                    "Top navigation with tabs for Follow, Discover and Nearby.".into(),
                    "Search entry pinned at the top.".into(),
                ],
            },
            Section {
                title: "Advanced technical optimisation".into(),
                items: vec![
                    "Virtual list rendering with react-window for thousands of cards.".into(),
                    "Image lazy loading via IntersectionObserver.".into(),
                ],
            },
        ]
    );
}

#[test]
fn cjk_ordinal_headings() {
    let raw = "一、 核心价值拆解\n1、 试错成本低\n2、 时间弹性大\n二、 行动落地路径\n- 大一：学习基础工具";
    let result = parse_response(raw);

    assert_eq!(result.sections.len(), 2);
    assert_eq!(result.sections[0].title, "核心价值拆解");
    assert_eq!(result.sections[0].items, vec!["试错成本低", "时间弹性大"]);
    assert_eq!(result.sections[1].title, "行动落地路径");
    assert_eq!(result.sections[1].items, vec!["大一：学习基础工具"]);
}

#[test]
fn echo_line_never_reaches_output() {
    let raw = "User requirement: implement a homepage\n1. Plan\n- Build it";
    let result = parse_response(raw);

    for section in &result.sections {
        assert!(!section.title.contains("implement a homepage"));
        for item in &section.items {
            assert!(!item.contains("implement a homepage"));
        }
    }
    assert_eq!(result.sections[0].items, vec!["Build it"]);
}

#[test]
fn prose_only_answer_falls_back() {
    let raw = "I think this is a great idea and you should go for it.";
    let result = parse_response(raw);

    assert_eq!(result.sections.len(), 1);
    assert_eq!(result.sections[0].title, "Analysis Result");
    assert_eq!(result.sections[0].items, vec![raw]);
}

#[test]
fn always_at_least_one_section() {
    for raw in ["", "\n\n", "- orphan item", "1. Heading only", "   ", "**bold**"] {
        let result = parse_response(raw);
        assert!(!result.sections.is_empty(), "no sections for {raw:?}");
    }
}

#[test]
fn parsing_is_deterministic() {
    assert_eq!(parse_response(TYPICAL_ANSWER), parse_response(TYPICAL_ANSWER));
}

#[test]
fn crlf_line_endings_are_handled() {
    let result = parse_response("1. Title\r\n- one\r\n- two\r\n");
    assert_eq!(result.sections[0].title, "Title");
    assert_eq!(result.sections[0].items, vec!["one", "two"]);
}

#[test]
fn number_dot_lines_after_a_heading_open_new_sections() {
    // Heading is tried first, so a later "2. x" line is a heading too.
    let result = parse_response("1. Plan\n- a\n2. Next step\n- b");
    let titles: Vec<_> = result.sections.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Plan", "Next step"]);
}

#[test]
fn policies_differ_only_on_empty_sections() {
    let raw = "1. Empty\n2. Full\n- item";
    let trailing = ResponseParser::new(FallbackPolicy::TrailingSection, "Result").parse(raw);
    let per_section = ResponseParser::new(FallbackPolicy::PerSection, "Result").parse(raw);

    assert_eq!(trailing.sections.len(), 2);
    assert_eq!(per_section.sections.len(), 1);
    assert_eq!(per_section.sections[0].title, "Full");
}

#[test]
fn classifier_is_usable_on_its_own() {
    assert_eq!(
        classify_line("1. Core Directions"),
        LineKind::Heading("Core Directions".into())
    );
    assert_eq!(classify_line("• Add search"), LineKind::Item("Add search".into()));
    assert_eq!(classify_line("Some filler"), LineKind::Ignored);
}

#[test]
fn prompt_and_parser_agree_on_echo_header() {
    let builder = PromptBuilder::new();
    for kind in TaskKind::ALL {
        let prompt = builder.build_prompt("my idea", kind);
        let first_line = prompt.lines().next().unwrap();
        assert_eq!(classify_line(first_line), LineKind::Ignored);
    }
}
