//! AppleScript generation for a single "create reminder" action.
//!
//! Every interpolated value is a [`SanitizedText`]; this module does no escaping of its own.

use crate::sanitize::SanitizedText;
use std::fmt::Write;

/// Name used when the title is empty after sanitizing.
pub const DEFAULT_TITLE: &str = "Reminder";

/// List used when the list name is empty after sanitizing.
pub const DEFAULT_LIST_NAME: &str = "Create Reminders";

/// Build the script that ensures `list_name` exists, adds a reminder to it and, when `due_local`
/// is non-empty, sets the reminder's due date.
pub fn build_reminder_script(
    title: &SanitizedText,
    notes: &SanitizedText,
    due_local: &SanitizedText,
    list_name: &SanitizedText,
) -> String {
    let title = or_default(title, DEFAULT_TITLE);
    let list_name = or_default(list_name, DEFAULT_LIST_NAME);

    let mut script = String::new();
    let _ = writeln!(script, "set reminderName to \"{}\"", title);
    let _ = writeln!(script, "set reminderNotes to \"{}\"", notes);
    let _ = writeln!(script, "set listName to \"{}\"", list_name);
    script.push_str("tell application \"Reminders\"\n");
    script.push_str("  if (not (exists list listName)) then\n");
    script.push_str("    make new list with properties {name:listName}\n");
    script.push_str("  end if\n");
    script.push_str("  set theList to list listName\n");
    script.push_str(
        "  set theReminder to make new reminder at end of theList with properties {name:reminderName, body:reminderNotes}\n",
    );
    if !due_local.is_empty() {
        let _ = writeln!(
            script,
            "  set remind me date of theReminder to date \"{}\"",
            due_local
        );
    }
    script.push_str("end tell\n");
    script
}

fn or_default<'a>(value: &'a SanitizedText, default: &'a str) -> &'a str {
    if value.is_empty() {
        default
    } else {
        value.as_str()
    }
}
