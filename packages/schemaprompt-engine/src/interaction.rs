use async_trait::async_trait;
use serde_json::{Number, Value};

use crate::cancel::CancellationToken;
use crate::error::PromptError;
use crate::validator::ValidateFn;

/// One terminal request: what to show and how to check the answer.
#[derive(Clone, Copy)]
pub struct PromptRequest<'a> {
    pub message: &'a str,
    pub required: bool,
    pub validate: Option<&'a ValidateFn<'a>>,
}

impl<'a> PromptRequest<'a> {
    pub fn new(message: &'a str) -> Self {
        Self {
            message,
            required: false,
            validate: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_validator(mut self, validate: &'a ValidateFn<'a>) -> Self {
        self.validate = Some(validate);
        self
    }

    /// Runs the inline validator, if any.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        match self.validate {
            Some(validate) => validate(value),
            None => Ok(()),
        }
    }
}

/// The terminal as seen by the walker.
///
/// Every `ask_*` call suspends until the operator answers. Implementations
/// re-prompt in place while `request.validate` rejects the input and return
/// [`PromptError::Cancelled`] when the operator interrupts; when a token is
/// supplied they also mark it cancelled.
#[async_trait]
pub trait UserInteraction: Send + Sync {
    /// Ask for a yes/no answer.
    async fn ask_yes_no(
        &self,
        request: PromptRequest<'_>,
        cancel: Option<&CancellationToken>,
    ) -> Result<bool, PromptError>;

    /// Ask for a single line of text.
    async fn ask_line(
        &self,
        request: PromptRequest<'_>,
        cancel: Option<&CancellationToken>,
    ) -> Result<String, PromptError>;

    /// Ask for multi-line text (editor style).
    async fn ask_long_text(
        &self,
        request: PromptRequest<'_>,
        cancel: Option<&CancellationToken>,
    ) -> Result<String, PromptError>;

    /// Ask for a number.
    async fn ask_number(
        &self,
        request: PromptRequest<'_>,
        cancel: Option<&CancellationToken>,
    ) -> Result<Number, PromptError>;

    /// Ask the operator to pick one of `choices`; returns the picked option.
    async fn ask_choice(
        &self,
        request: PromptRequest<'_>,
        choices: &[String],
        cancel: Option<&CancellationToken>,
    ) -> Result<String, PromptError>;

    /// Indicate that a session step is starting (banner).
    fn start_step(&self, name: &str);

    /// Indicate that a session step has completed.
    fn end_step(&self, name: &str);

    /// Structural progress line (braces, brackets, array announcements).
    fn show_marker(&self, line: &str);

    /// Display the collected value before confirmation.
    fn render_value(&self, value: &Value);
}

/// Parses operator input the way numeric prompts accept it: integers stay integers.
pub fn parse_number(input: &str) -> Option<Number> {
    let trimmed = input.trim();
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Number::from(i));
    }
    if let Ok(u) = trimmed.parse::<u64>() {
        return Some(Number::from(u));
    }
    trimmed.parse::<f64>().ok().and_then(Number::from_f64)
}

// Exposed for e2e and integration testing
pub mod mocks {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    pub enum ScriptedAnswer {
        YesNo(bool),
        Text(String),
        Number(Number),
        Choice(String),
        /// Operator pressed Ctrl+C.
        Cancel,
        /// Terminal failure unrelated to cancellation.
        Fail(String),
    }

    impl ScriptedAnswer {
        pub fn text(s: impl Into<String>) -> Self {
            ScriptedAnswer::Text(s.into())
        }

        pub fn number(n: impl Into<Number>) -> Self {
            ScriptedAnswer::Number(n.into())
        }

        pub fn choice(s: impl Into<String>) -> Self {
            ScriptedAnswer::Choice(s.into())
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum PromptKind {
        YesNo,
        Line,
        LongText,
        Number,
        Choice,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum Recorded {
        Prompt {
            kind: PromptKind,
            message: String,
            with_token: bool,
        },
        Rejected {
            message: String,
            error: String,
        },
        Marker(String),
        StepStarted(String),
        StepEnded(String),
        Rendered(Value),
    }

    /// Replays scripted answers and records everything the engine shows.
    ///
    /// Answers rejected by the request validator are recorded and the next
    /// scripted answer is used, the way a terminal would re-prompt.
    #[derive(Default, Clone)]
    pub struct ScriptedInteraction {
        pub answers: Arc<Mutex<VecDeque<ScriptedAnswer>>>,
        pub recorded: Arc<Mutex<Vec<Recorded>>>,
    }

    impl ScriptedInteraction {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_answers<I>(answers: I) -> Self
        where
            I: IntoIterator<Item = ScriptedAnswer>,
        {
            let ui = Self::new();
            for answer in answers {
                ui.add_answer(answer);
            }
            ui
        }

        pub fn add_answer(&self, answer: ScriptedAnswer) {
            self.answers.lock().unwrap().push_back(answer);
        }

        pub fn remaining(&self) -> usize {
            self.answers.lock().unwrap().len()
        }

        pub fn recorded(&self) -> Vec<Recorded> {
            self.recorded.lock().unwrap().clone()
        }

        pub fn prompts(&self) -> Vec<(PromptKind, String)> {
            self.recorded()
                .into_iter()
                .filter_map(|r| match r {
                    Recorded::Prompt { kind, message, .. } => Some((kind, message)),
                    _ => None,
                })
                .collect()
        }

        pub fn prompt_count(&self, kind: PromptKind) -> usize {
            self.prompts().iter().filter(|(k, _)| *k == kind).count()
        }

        pub fn markers(&self) -> Vec<String> {
            self.recorded()
                .into_iter()
                .filter_map(|r| match r {
                    Recorded::Marker(line) => Some(line),
                    _ => None,
                })
                .collect()
        }

        pub fn rejections(&self) -> Vec<String> {
            self.recorded()
                .into_iter()
                .filter_map(|r| match r {
                    Recorded::Rejected { error, .. } => Some(error),
                    _ => None,
                })
                .collect()
        }

        pub fn steps_started(&self, name: &str) -> usize {
            self.recorded()
                .iter()
                .filter(|r| matches!(r, Recorded::StepStarted(n) if n == name))
                .count()
        }

        fn record(&self, entry: Recorded) {
            self.recorded.lock().unwrap().push(entry);
        }

        fn answer<T>(
            &self,
            kind: PromptKind,
            request: PromptRequest<'_>,
            cancel: Option<&CancellationToken>,
            extract: impl Fn(ScriptedAnswer) -> Result<T, ScriptedAnswer>,
            to_value: impl Fn(&T) -> Value,
        ) -> Result<T, PromptError> {
            self.record(Recorded::Prompt {
                kind,
                message: request.message.to_string(),
                with_token: cancel.is_some(),
            });
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(PromptError::Cancelled);
            }

            loop {
                let next = self.answers.lock().unwrap().pop_front();
                let answer = match next {
                    None => {
                        return Err(PromptError::Terminal(format!(
                            "script exhausted at prompt `{}`",
                            request.message
                        )));
                    }
                    Some(ScriptedAnswer::Cancel) => {
                        if let Some(token) = cancel {
                            token.cancel();
                        }
                        return Err(PromptError::Cancelled);
                    }
                    Some(ScriptedAnswer::Fail(msg)) => return Err(PromptError::Terminal(msg)),
                    Some(other) => other,
                };

                let value = match extract(answer) {
                    Ok(value) => value,
                    Err(other) => {
                        return Err(PromptError::Terminal(format!(
                            "scripted {other:?} does not fit a {kind:?} prompt"
                        )));
                    }
                };

                let as_json = to_value(&value);
                let outcome = if request.required && as_json.as_str().is_some_and(str::is_empty) {
                    Err("a value is required".to_string())
                } else {
                    request.check(&as_json)
                };
                match outcome {
                    Ok(()) => return Ok(value),
                    Err(error) => self.record(Recorded::Rejected {
                        message: request.message.to_string(),
                        error,
                    }),
                }
            }
        }
    }

    #[async_trait]
    impl UserInteraction for ScriptedInteraction {
        async fn ask_yes_no(
            &self,
            request: PromptRequest<'_>,
            cancel: Option<&CancellationToken>,
        ) -> Result<bool, PromptError> {
            self.answer(
                PromptKind::YesNo,
                request,
                cancel,
                |a| match a {
                    ScriptedAnswer::YesNo(b) => Ok(b),
                    other => Err(other),
                },
                |b| Value::Bool(*b),
            )
        }

        async fn ask_line(
            &self,
            request: PromptRequest<'_>,
            cancel: Option<&CancellationToken>,
        ) -> Result<String, PromptError> {
            self.answer(
                PromptKind::Line,
                request,
                cancel,
                |a| match a {
                    ScriptedAnswer::Text(s) => Ok(s),
                    other => Err(other),
                },
                |s| Value::String(s.clone()),
            )
        }

        async fn ask_long_text(
            &self,
            request: PromptRequest<'_>,
            cancel: Option<&CancellationToken>,
        ) -> Result<String, PromptError> {
            self.answer(
                PromptKind::LongText,
                request,
                cancel,
                |a| match a {
                    ScriptedAnswer::Text(s) => Ok(s),
                    other => Err(other),
                },
                |s| Value::String(s.clone()),
            )
        }

        async fn ask_number(
            &self,
            request: PromptRequest<'_>,
            cancel: Option<&CancellationToken>,
        ) -> Result<Number, PromptError> {
            self.answer(
                PromptKind::Number,
                request,
                cancel,
                |a| match a {
                    ScriptedAnswer::Number(n) => Ok(n),
                    other => Err(other),
                },
                |n| Value::Number(n.clone()),
            )
        }

        async fn ask_choice(
            &self,
            request: PromptRequest<'_>,
            choices: &[String],
            cancel: Option<&CancellationToken>,
        ) -> Result<String, PromptError> {
            let picked = self.answer(
                PromptKind::Choice,
                request,
                cancel,
                |a| match a {
                    ScriptedAnswer::Choice(s) => Ok(s),
                    other => Err(other),
                },
                |s| Value::String(s.clone()),
            )?;
            if !choices.contains(&picked) {
                return Err(PromptError::Terminal(format!(
                    "`{picked}` is not one of {choices:?}"
                )));
            }
            Ok(picked)
        }

        fn start_step(&self, name: &str) {
            self.record(Recorded::StepStarted(name.to_string()));
        }

        fn end_step(&self, name: &str) {
            self.record(Recorded::StepEnded(name.to_string()));
        }

        fn show_marker(&self, line: &str) {
            self.record(Recorded::Marker(line.to_string()));
        }

        fn render_value(&self, value: &Value) {
            self.record(Recorded::Rendered(value.clone()));
        }
    }
}
