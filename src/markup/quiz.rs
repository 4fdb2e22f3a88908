//! Quiz and exam JSON → markup.

use quick_xml::Reader;
use quick_xml::escape::escape;
use quick_xml::events::Event;
use serde_json::Value;
use tracing::info;

use super::{attribute, is_named, push_raw_event};
use crate::error::{Error, Result};

/// Placed between question blocks; splitting the output on it yields one
/// block per question.
pub const QUESTION_SEPARATOR: &str = "\n<hr/>\n";

const ANSWER_FIELD: &str = "<text>Enter answer here: <strong>________</strong></text>";

static NO_DEFINITION: Value = Value::Null;

#[derive(Debug, Clone, PartialEq, Eq)]
enum QuestionType {
    Mcq,
    McqReflect,
    Checkbox,
    TextExactMatch,
    SingleNumeric,
    MathExpression,
    Regex,
    Reflect,
    Unknown(String),
}

impl QuestionType {
    fn parse(name: &str) -> Self {
        match name {
            "mcq" => QuestionType::Mcq,
            "mcqReflect" => QuestionType::McqReflect,
            "checkbox" => QuestionType::Checkbox,
            "textExactMatch" => QuestionType::TextExactMatch,
            "singleNumeric" => QuestionType::SingleNumeric,
            "mathExpression" => QuestionType::MathExpression,
            "regex" => QuestionType::Regex,
            "reflect" => QuestionType::Reflect,
            other => QuestionType::Unknown(other.to_string()),
        }
    }
}

/// One option of a choice question.
struct Choice<'a> {
    id: Option<&'a str>,
    content: &'a str,
    correct: bool,
}

/// Converts quiz documents (`{"questions": [...]}` or a bare array of
/// question blocks) into course markup.
///
/// Questions render in input order, each introduced by a numbered heading.
/// Unknown question types keep their prompt and get a visible marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuizMarkupConverter;

impl QuizMarkupConverter {
    pub fn new() -> Self {
        Self
    }

    /// Convert a quiz document given as JSON text.
    pub fn convert_str(&self, json: &str) -> Result<String> {
        let quiz: Value = serde_json::from_str(json)?;
        self.convert(&quiz)
    }

    pub fn convert(&self, quiz: &Value) -> Result<String> {
        let questions = match quiz {
            Value::Array(items) => items,
            Value::Object(map) => match map.get("questions") {
                Some(Value::Array(items)) => items,
                _ => {
                    return Err(Error::MalformedInput(
                        "quiz document has no questions array".into(),
                    ));
                }
            },
            _ => {
                return Err(Error::MalformedInput(
                    "quiz document must be an object or an array".into(),
                ));
            }
        };

        let blocks = questions
            .iter()
            .enumerate()
            .map(|(index, question)| render_question(index, question))
            .collect::<Result<Vec<_>>>()?;
        Ok(blocks.join(QUESTION_SEPARATOR))
    }
}

fn render_question(index: usize, question: &Value) -> Result<String> {
    let type_name = question
        .pointer("/question/type")
        .and_then(Value::as_str)
        .unwrap_or("unknown");
    let question_type = QuestionType::parse(type_name);

    let definition = question.pointer("/variant/definition").unwrap_or(&NO_DEFINITION);
    let prompt = definition
        .pointer("/prompt/definition/value")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let choices = choices(definition);

    let mut lines = vec![format!("<heading level=\"3\">Question {}</heading>", index + 1)];
    lines.push(replace_placeholders(prompt, &choices)?);

    match &question_type {
        QuestionType::Mcq => lines.push(render_choices(&choices, ChoiceStyle::Radio, true)),
        QuestionType::McqReflect => lines.push(render_choices(&choices, ChoiceStyle::Radio, false)),
        QuestionType::Checkbox => lines.push(render_choices(&choices, ChoiceStyle::Checkbox, true)),
        QuestionType::TextExactMatch
        | QuestionType::MathExpression
        | QuestionType::Regex
        | QuestionType::Reflect => lines.extend(render_answers(&text_answers(definition))),
        QuestionType::SingleNumeric => lines.extend(render_answers(&numeric_answer(definition))),
        QuestionType::Unknown(name) => {
            info!(question_type = name.as_str(), index, "unknown question type, rendering prompt only");
            lines.push(format!(
                "<text><strong>[unsupported question type: {}]</strong></text>",
                escape(name.as_str())
            ));
        }
    }

    lines.retain(|line| !line.is_empty());
    Ok(lines.join("\n"))
}

fn choices(definition: &Value) -> Vec<Choice<'_>> {
    let Some(options) = definition.get("options").and_then(Value::as_array) else {
        return Vec::new();
    };
    options
        .iter()
        .map(|option| Choice {
            id: option.get("id").and_then(Value::as_str),
            content: option
                .pointer("/display/definition/value")
                .and_then(Value::as_str)
                .unwrap_or_default(),
            correct: option
                .get("isCorrect")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
        .collect()
}

#[derive(Clone, Copy)]
enum ChoiceStyle {
    Radio,
    Checkbox,
}

/// Options as a bullet list; correct options are bold and checked.
fn render_choices(choices: &[Choice<'_>], style: ChoiceStyle, mark_correct: bool) -> String {
    if choices.is_empty() {
        return String::new();
    }

    let mut out = String::from("<list bullettype=\"bullets\">");
    for choice in choices {
        let correct = mark_correct && choice.correct;
        let mark = match (style, correct) {
            (ChoiceStyle::Radio, true) => "(x)",
            (ChoiceStyle::Radio, false) => "( )",
            (ChoiceStyle::Checkbox, true) => "[x]",
            (ChoiceStyle::Checkbox, false) => "[ ]",
        };
        // <text> would break the option onto its own paragraph
        let content = choice.content.replace("<text>", "<span>").replace("</text>", "</span>");
        out.push('\n');
        if correct {
            out.push_str(&format!("<li><strong>{mark} {content}</strong></li>"));
        } else {
            out.push_str(&format!("<li>{mark} {content}</li>"));
        }
    }
    out.push_str("\n</list>");
    out
}

fn text_answers(definition: &Value) -> Vec<String> {
    let Some(answers) = definition.get("answers").and_then(Value::as_array) else {
        return Vec::new();
    };
    answers
        .iter()
        .filter_map(|answer| match answer {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Object(map) => map.get("value").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect()
}

fn numeric_answer(definition: &Value) -> Vec<String> {
    let (value, tolerance) = match definition.get("answer") {
        Some(Value::Object(map)) => (map.get("value"), map.get("tolerance")),
        Some(value @ (Value::Number(_) | Value::String(_))) => (Some(value), None),
        _ => (None, None),
    };
    let Some(value) = value.and_then(scalar) else {
        return Vec::new();
    };
    match tolerance.and_then(scalar) {
        Some(tolerance) => vec![format!("{value} ± {tolerance}")],
        None => vec![value],
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Accepted answers as code, or an answer field when none are known.
fn render_answers(answers: &[String]) -> Vec<String> {
    if answers.is_empty() {
        return vec![ANSWER_FIELD.to_string()];
    }
    let mut lines = vec!["<text>Accepted answers:</text>".to_string()];
    lines.extend(
        answers
            .iter()
            .map(|answer| format!("<code>{}</code>", escape(answer.as_str()))),
    );
    lines
}

/// Replace `<span optionId="..">` answer placeholders with the number of the
/// option they refer to.
fn replace_placeholders(prompt: &str, choices: &[Choice<'_>]) -> Result<String> {
    if !prompt.to_ascii_lowercase().contains("optionid") {
        return Ok(prompt.to_string());
    }

    let mut reader = Reader::from_str(prompt);
    reader.config_mut().check_end_names = false;

    let mut out = String::with_capacity(prompt.len());
    let mut skip_depth = 0usize;
    loop {
        let event = reader.read_event()?;
        match &event {
            Event::Eof => break,
            Event::Start(_) if skip_depth > 0 => skip_depth += 1,
            Event::End(_) if skip_depth > 0 => skip_depth -= 1,
            _ if skip_depth > 0 => {}
            Event::Start(e) | Event::Empty(e) if is_named(e, "span") => match attribute(e, b"optionid") {
                Some(option_id) => {
                    out.push_str(&placeholder(&option_id, choices));
                    if matches!(event, Event::Start(_)) {
                        skip_depth = 1;
                    }
                }
                None => push_raw_event(&mut out, &event),
            },
            _ => push_raw_event(&mut out, &event),
        }
    }
    Ok(out)
}

fn placeholder(option_id: &str, choices: &[Choice<'_>]) -> String {
    match choices.iter().position(|c| c.id == Some(option_id.trim())) {
        Some(position) => format!("<code>[answer {}]</code>", position + 1),
        None => "<code>[answer]</code>".to_string(),
    }
}
