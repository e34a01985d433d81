//! Terminal rendering of controller state

use colored::*;
use dialer_core::dialpad::DIALPAD_KEYS;
use dialer_core::{
    CallLogEntry, CallType, DialpadInputModel, ResourceEvent, Screen, SessionEvent,
    SessionSnapshot, SessionState, UserNotice,
};
use tabled::{settings::Style, Table, Tabled};

pub fn state_label(state: SessionState) -> ColoredString {
    let text = state.to_string();
    match state {
        SessionState::Idle => text.dimmed(),
        SessionState::AwaitingPermission => text.yellow(),
        SessionState::Dialing => text.cyan(),
        SessionState::InCall => text.green().bold(),
        SessionState::Ended => text.red(),
    }
}

/// The call window: caller line, timer and the two toggle labels
pub fn call_window(snapshot: &SessionSnapshot) -> String {
    format!(
        "{}  {}  [{}] [{}]",
        snapshot.caller_line().bold(),
        snapshot.formatted_duration().green(),
        snapshot.mute_label(),
        snapshot.speaker_label(),
    )
}

pub fn snapshot_line(snapshot: &SessionSnapshot) -> String {
    match snapshot.screen {
        Screen::CallWindow if snapshot.state == SessionState::InCall => call_window(snapshot),
        Screen::CallWindow => format!("{} ({})", snapshot.caller_line().bold(), state_label(snapshot.state)),
        Screen::Dialpad => format!("dial pad ({})", state_label(snapshot.state)),
        Screen::Home => format!("home ({})", state_label(snapshot.state)),
    }
}

pub fn notice(notice: &UserNotice) -> String {
    format!("{} {}", format!("{}:", notice.title).red().bold(), notice.message)
}

/// One line per event, `None` for events not worth showing
pub fn event_line(event: &SessionEvent, verbose: bool) -> Option<String> {
    match event {
        SessionEvent::StateChanged { previous, snapshot } => Some(format!(
            "{} -> {}  {}",
            state_label(*previous),
            state_label(snapshot.state),
            snapshot_line(snapshot)
        )),
        SessionEvent::SessionUpdated(snapshot) => Some(snapshot_line(snapshot)),
        SessionEvent::Notice(n) => Some(notice(n)),
        SessionEvent::Resource(resource) if verbose => {
            let text = match resource {
                ResourceEvent::AudioRouteEnabled => "audio route enabled",
                ResourceEvent::AudioRouteDisabled => "audio route disabled",
                ResourceEvent::TimerStarted => "call timer started",
                ResourceEvent::TimerStopped => "call timer stopped",
            };
            Some(format!("  {}", text.dimmed()))
        }
        SessionEvent::Resource(_) => None,
    }
}

pub fn dialpad(model: &DialpadInputModel) -> String {
    let mut out = String::new();
    let number = if model.is_empty() {
        "(empty)".dimmed().to_string()
    } else {
        model.value().bold().to_string()
    };
    out.push_str(&format!("  {}\n", number));
    for row in DIALPAD_KEYS {
        let keys: Vec<String> = row.iter().map(|k| format!("[{}]", k)).collect();
        out.push_str(&format!("  {}\n", keys.join(" ")));
    }
    out
}

#[derive(Tabled)]
struct CallLogRow {
    #[tabled(rename = "Number")]
    number: String,
    #[tabled(rename = "Type")]
    call_type: String,
    #[tabled(rename = "When")]
    when: String,
    #[tabled(rename = "Duration")]
    duration: String,
}

fn call_type_label(call_type: CallType) -> String {
    let text = call_type.to_string();
    match call_type {
        CallType::Missed | CallType::Rejected | CallType::Blocked => text.red().to_string(),
        CallType::Incoming => text.green().to_string(),
        _ => text,
    }
}

pub fn call_log_table(entries: &[CallLogEntry]) -> String {
    let rows: Vec<CallLogRow> = entries
        .iter()
        .map(|entry| CallLogRow {
            number: entry.phone_number.clone(),
            call_type: call_type_label(entry.call_type),
            when: entry
                .timestamp()
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| "-".to_string()),
            duration: entry.formatted_duration(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_log_table_lists_rows() {
        colored::control::set_override(false);
        let entries = vec![CallLogEntry {
            phone_number: "9119515866".to_string(),
            call_type: CallType::Missed,
            timestamp_millis: 1_700_000_000_000,
            duration_seconds: 0,
        }];

        let table = call_log_table(&entries);
        assert!(table.contains("Number"));
        assert!(table.contains("9119515866"));
        assert!(table.contains("MISSED"));
        assert!(table.contains("0:00"));
    }

    #[test]
    fn test_dialpad_shows_value() {
        colored::control::set_override(false);
        let text = dialpad(&DialpadInputModel::with_number("555"));
        assert!(text.contains("555"));
        assert!(text.contains("[*] [0] [#]"));
    }
}
