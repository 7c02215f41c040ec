//! Reads `fire_events.txt` (spec §4.3, §6): one event per non-blank,
//! non-`#` line, in the same text shape the wire protocol uses. Grounded in
//! the teacher's `data_collector` file-indexing style: parse-or-log-and-skip,
//! never panic on a malformed line (spec §7 "Malformed message").

use chrono::NaiveTime;
use shared::protocol::FireEventMessage;
use shared::DroneNetError;

#[derive(Debug, Clone)]
pub struct ScheduledEvent {
    pub at: NaiveTime,
    pub message: FireEventMessage,
}

/// Parses the whole file, skipping and logging malformed lines rather than
/// failing the run.
pub fn parse_fire_events(contents: &str) -> Vec<ScheduledEvent> {
    let mut events = Vec::new();
    for (line_no, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_line(line) {
            Ok(event) => events.push(event),
            Err(e) => tracing::warn!("fire_events.txt:{}: {e}", line_no + 1),
        }
    }
    events
}

fn parse_line(line: &str) -> Result<ScheduledEvent, DroneNetError> {
    let message = FireEventMessage::decode(line)?;
    let at = NaiveTime::parse_from_str(&message.time, "%H:%M:%S")
        .map_err(|_| DroneNetError::Protocol(format!("bad timestamp: {line}")))?;
    Ok(ScheduledEvent { at, message })
}

/// Wait-from-start offsets for each event, relative to the first event's
/// timestamp (spec §4.3 "waits until simulated wall-clock >= the
/// timestamp"). Out-of-order timestamps clamp to zero wait rather than
/// going negative.
pub fn offsets_from_start(events: &[ScheduledEvent]) -> Vec<std::time::Duration> {
    let Some(base) = events.first().map(|e| e.at) else {
        return Vec::new();
    };
    events
        .iter()
        .map(|e| {
            let millis = (e.at - base).num_milliseconds();
            std::time::Duration::from_millis(millis.max(0) as u64)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_events_in_order() {
        let events = parse_fire_events(
            "14:03:15 1 FIRE_DETECTED Low\n# a comment\n\n14:08:30 4 FIRE_DETECTED Moderate DRONE_STUCK\n",
        );
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].message.zone_id, 1);
        assert_eq!(events[1].message.zone_id, 4);
    }

    #[test]
    fn skips_malformed_lines_without_failing() {
        let events = parse_fire_events("not a line\n14:03:15 1 FIRE_DETECTED Low\n");
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn offsets_are_relative_to_first_event_and_never_negative() {
        let events = parse_fire_events("14:00:00 1 FIRE_DETECTED Low\n14:00:05 2 FIRE_DETECTED Low\n");
        let offsets = offsets_from_start(&events);
        assert_eq!(offsets[0], std::time::Duration::ZERO);
        assert_eq!(offsets[1], std::time::Duration::from_secs(5));
    }
}
