//! Reminder requests: decoding, validation, and the sanitize → build → run pipeline.

use serde::Deserialize;

use crate::due::normalize_due;
use crate::error::BridgeError;
use crate::exec::ScriptRunner;
use crate::sanitize::{sanitize, SanitizedText};
use crate::script::{build_reminder_script, DEFAULT_TITLE};

pub const MAX_TEXT_LENGTH: usize = 1000;
pub const MAX_NOTES_LENGTH: usize = 2000;
pub const MAX_DUE_LENGTH: usize = 50;
pub const MAX_LIST_NAME_LENGTH: usize = 100;

const NOTES_SEPARATOR: &str = " — ";
const SCRIPT_FAILED: &str = "AppleScript failed";

/// Body of `POST /reminder`. Unknown fields are ignored; `null` counts as absent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRequest {
    pub text: Option<String>,
    pub due_at: Option<String>,
    pub source_url: Option<String>,
    pub source_title: Option<String>,
    pub list_name: Option<String>,
}

/// A request that passed validation; due date already normalized to local time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub text: String,
    pub notes: String,
    pub due_local: String,
    pub list_name: String,
}

/// Script-ready fields, each sanitized once.
#[derive(Debug, Clone)]
pub struct SanitizedReminder {
    pub title: SanitizedText,
    pub notes: SanitizedText,
    pub due_local: SanitizedText,
    pub list_name: SanitizedText,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

impl ReminderRequest {
    /// Decode a request body. An empty body is treated as `{}`.
    pub fn from_body(body: &[u8]) -> Result<Self, BridgeError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        let value: serde_json::Value = serde_json::from_slice(body).map_err(|e| {
            log::debug!("rejecting request body: {}", e);
            BridgeError::MalformedRequest
        })?;
        if !value.is_object() {
            log::debug!("rejecting request body: not a JSON object");
            return Err(BridgeError::MalformedRequest);
        }
        serde_json::from_value(value).map_err(|e| {
            log::debug!("rejecting request body: {}", e);
            BridgeError::MalformedRequest
        })
    }

    /// `sourceTitle` and `sourceUrl`, whichever are present, joined by an em dash.
    pub fn notes(&self) -> String {
        [non_empty(&self.source_title), non_empty(&self.source_url)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(NOTES_SEPARATOR)
    }

    /// Apply defaults and length limits. `default_list` fills an absent or empty listName.
    pub fn validate(&self, default_list: &str) -> Result<Reminder, BridgeError> {
        let text = non_empty(&self.text).unwrap_or(DEFAULT_TITLE);
        if text.chars().count() > MAX_TEXT_LENGTH {
            return Err(BridgeError::Validation(format!(
                "Text too long (max {} chars)",
                MAX_TEXT_LENGTH
            )));
        }
        let notes = self.notes();
        if notes.chars().count() > MAX_NOTES_LENGTH {
            return Err(BridgeError::Validation(format!(
                "Notes too long (max {} chars)",
                MAX_NOTES_LENGTH
            )));
        }
        Ok(Reminder {
            text: text.to_string(),
            notes,
            due_local: normalize_due(self.due_at.as_deref().unwrap_or("")),
            list_name: non_empty(&self.list_name).unwrap_or(default_list).to_string(),
        })
    }
}

impl Reminder {
    pub fn sanitize(&self) -> SanitizedReminder {
        SanitizedReminder {
            title: sanitize(&self.text, MAX_TEXT_LENGTH),
            notes: sanitize(&self.notes, MAX_NOTES_LENGTH),
            due_local: sanitize(&self.due_local, MAX_DUE_LENGTH),
            list_name: sanitize(&self.list_name, MAX_LIST_NAME_LENGTH),
        }
    }

    /// The script that creates this reminder.
    pub fn script(&self) -> String {
        self.sanitize().script()
    }
}

impl SanitizedReminder {
    pub fn script(&self) -> String {
        build_reminder_script(&self.title, &self.notes, &self.due_local, &self.list_name)
    }
}

/// Create `reminder` by running its script once. Nonzero exit maps to
/// [`BridgeError::Downstream`] carrying the trimmed stderr.
pub fn add_reminder(runner: &dyn ScriptRunner, reminder: &Reminder) -> Result<(), BridgeError> {
    let script = reminder.script();
    let output = runner
        .run(&script)
        .map_err(|e| BridgeError::Downstream(e.to_string()))?;
    if output.success() {
        return Ok(());
    }
    let stderr = output.stderr.trim();
    log::debug!("script exited with {:?}", output.exit_code);
    Err(BridgeError::Downstream(if stderr.is_empty() {
        SCRIPT_FAILED.to_string()
    } else {
        stderr.to_string()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::{ExecError, ScriptOutput};
    use std::sync::Mutex;

    struct Recorder {
        output: ScriptOutput,
        scripts: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn new(exit_code: i32, stderr: &str) -> Self {
            Self {
                output: ScriptOutput {
                    exit_code: Some(exit_code),
                    stderr: stderr.to_string(),
                },
                scripts: Mutex::new(Vec::new()),
            }
        }
    }

    impl ScriptRunner for Recorder {
        fn run(&self, script: &str) -> Result<ScriptOutput, ExecError> {
            self.scripts.lock().unwrap().push(script.to_string());
            Ok(self.output.clone())
        }
    }

    struct Broken;

    impl ScriptRunner for Broken {
        fn run(&self, _script: &str) -> Result<ScriptOutput, ExecError> {
            Err(ExecError::Spawn(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no osascript",
            )))
        }
    }

    fn request(json: &str) -> ReminderRequest {
        ReminderRequest::from_body(json.as_bytes()).unwrap()
    }

    #[test]
    fn empty_body_is_default_request() {
        let r = ReminderRequest::from_body(b"").unwrap().validate("Inbox").unwrap();
        assert_eq!(r.text, "Reminder");
        assert_eq!(r.notes, "");
        assert_eq!(r.due_local, "");
        assert_eq!(r.list_name, "Inbox");
    }

    #[test]
    fn malformed_and_non_object_bodies_rejected() {
        for body in ["{", "[]", "[1,2]", "\"text\"", "{\"text\": 5}"] {
            assert_eq!(
                ReminderRequest::from_body(body.as_bytes()).unwrap_err(),
                BridgeError::MalformedRequest,
                "{}",
                body
            );
        }
    }

    #[test]
    fn nulls_and_unknown_fields_are_tolerated() {
        let r = request(r#"{"text": null, "listName": "", "extra": true}"#)
            .validate("Inbox")
            .unwrap();
        assert_eq!(r.text, "Reminder");
        assert_eq!(r.list_name, "Inbox");
    }

    #[test]
    fn notes_join_title_and_url_with_em_dash() {
        let req = request(r#"{"sourceTitle": "Docs", "sourceUrl": "https://example.com"}"#);
        assert_eq!(req.notes(), "Docs — https://example.com");
        assert_eq!(request(r#"{"sourceUrl": "https://x"}"#).notes(), "https://x");
        assert_eq!(request(r#"{"sourceTitle": "T"}"#).notes(), "T");
        assert_eq!(request("{}").notes(), "");
    }

    #[test]
    fn text_limit_is_1000_chars() {
        let ok = format!(r#"{{"text": "{}"}}"#, "é".repeat(1000));
        assert!(request(&ok).validate("L").is_ok());
        let long = format!(r#"{{"text": "{}"}}"#, "a".repeat(1001));
        assert_eq!(
            request(&long).validate("L").unwrap_err(),
            BridgeError::Validation("Text too long (max 1000 chars)".to_string())
        );
    }

    #[test]
    fn notes_limit_is_2000_chars() {
        // 997 + " — " (3 chars) + 1000 = exactly 2000.
        let at_limit = format!(
            r#"{{"sourceTitle": "{}", "sourceUrl": "{}"}}"#,
            "t".repeat(997),
            "u".repeat(1000)
        );
        let r = request(&at_limit).validate("L").unwrap();
        assert_eq!(r.notes.chars().count(), 2000);

        let body = format!(
            r#"{{"sourceTitle": "{}", "sourceUrl": "{}"}}"#,
            "t".repeat(1000),
            "u".repeat(1000)
        );
        assert_eq!(
            request(&body).validate("L").unwrap_err(),
            BridgeError::Validation("Notes too long (max 2000 chars)".to_string())
        );
    }

    #[test]
    fn bad_due_date_is_dropped_not_rejected() {
        let r = request(r#"{"text": "x", "dueAt": "tomorrow-ish"}"#)
            .validate("L")
            .unwrap();
        assert_eq!(r.due_local, "");
        assert!(!r.script().contains("remind me date"));
    }

    #[test]
    fn valid_due_date_reaches_script() {
        let r = request(r#"{"text": "x", "dueAt": "2024-02-02T10:00:00.000Z"}"#)
            .validate("L")
            .unwrap();
        assert!(!r.due_local.is_empty());
        assert!(r
            .script()
            .contains(&format!("to date \"{}\"", r.due_local)));
    }

    #[test]
    fn each_field_is_escaped_exactly_once() {
        let req = request(r#"{"text": "a\\b \"q\"", "sourceTitle": "t\\", "listName": "l\"st"}"#);
        let script = req.validate("L").unwrap().script();
        assert!(script.contains(r#"set reminderName to "a\\b \"q\"""#));
        assert!(script.contains(r#"set reminderNotes to "t\\""#));
        assert!(script.contains(r#"set listName to "l\"st""#));
        assert!(!script.contains(r"\\\\"));
    }

    #[test]
    fn add_reminder_runs_script_once() {
        let runner = Recorder::new(0, "");
        let r = request(r#"{"text": "Buy milk", "listName": "Groceries"}"#)
            .validate("L")
            .unwrap();
        add_reminder(&runner, &r).unwrap();
        let scripts = runner.scripts.lock().unwrap();
        assert_eq!(scripts.len(), 1);
        assert!(scripts[0].contains("set reminderName to \"Buy milk\""));
        assert!(scripts[0].contains("set listName to \"Groceries\""));
    }

    #[test]
    fn nonzero_exit_surfaces_stderr() {
        let runner = Recorder::new(1, "  execution error: Reminders got an error (-1728)\n");
        let r = request("{}").validate("L").unwrap();
        assert_eq!(
            add_reminder(&runner, &r).unwrap_err(),
            BridgeError::Downstream("execution error: Reminders got an error (-1728)".to_string())
        );
    }

    #[test]
    fn nonzero_exit_without_stderr_is_generic() {
        let runner = Recorder::new(1, " \n");
        let r = request("{}").validate("L").unwrap();
        assert_eq!(
            add_reminder(&runner, &r).unwrap_err(),
            BridgeError::Downstream("AppleScript failed".to_string())
        );
    }

    #[test]
    fn spawn_failure_is_downstream() {
        let r = request("{}").validate("L").unwrap();
        let err = add_reminder(&Broken, &r).unwrap_err();
        assert_eq!(err, BridgeError::Downstream("exec failed: no osascript".to_string()));
    }
}
