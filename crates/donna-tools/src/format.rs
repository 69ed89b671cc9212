// SPDX-FileCopyrightText: 2026 Donna Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plain-text rendering of calendar events for tool results.
//!
//! Tool results are read by the model, not the user, so the format favors
//! one unambiguous line per event over chat-ready prose.

use donna_calendar::types::Event;

/// Renders a listing of events, one line each, in the order given.
pub fn format_events(events: &[Event]) -> String {
    if events.is_empty() {
        return "No events found in this period.".to_string();
    }
    events
        .iter()
        .map(format_event_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line: date, time range (or "all day"), title, optional location.
pub fn format_event_line(event: &Event) -> String {
    let title = event.summary.as_deref().unwrap_or("(no title)");
    let mut line = match (&event.start.date_time, &event.start.date) {
        (Some(start), _) => {
            let end = event
                .end
                .date_time
                .map(|e| {
                    if e.date_naive() == start.date_naive() {
                        e.format("%H:%M").to_string()
                    } else {
                        e.format("%Y-%m-%d %H:%M").to_string()
                    }
                })
                .unwrap_or_else(|| "?".to_string());
            format!(
                "{} {} to {}: {title}",
                start.format("%a %Y-%m-%d"),
                start.format("%H:%M"),
                end
            )
        }
        (None, Some(day)) => format!("{} (all day): {title}", day.format("%a %Y-%m-%d")),
        (None, None) => format!("(unscheduled): {title}"),
    };
    if let Some(location) = &event.location {
        line.push_str(&format!(" [{location}]"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use donna_calendar::types::EventTime;

    fn timed(summary: &str, start: &str, end: &str, location: Option<&str>) -> Event {
        Event {
            id: "evt".into(),
            summary: Some(summary.into()),
            start: EventTime::at(start.parse().unwrap()),
            end: EventTime::at(end.parse().unwrap()),
            location: location.map(String::from),
            description: None,
        }
    }

    #[test]
    fn empty_listing_has_a_fixed_message() {
        assert_eq!(format_events(&[]), "No events found in this period.");
    }

    #[test]
    fn timed_event_renders_date_and_range() {
        let event = timed(
            "Standup",
            "2026-08-29T09:00:00+02:00",
            "2026-08-29T09:15:00+02:00",
            Some("Room 1"),
        );
        assert_eq!(
            format_event_line(&event),
            "Sat 2026-08-29 09:00 to 09:15: Standup [Room 1]"
        );
    }

    #[test]
    fn overnight_event_repeats_the_date() {
        let event = timed(
            "Red-eye",
            "2026-08-29T23:30:00+00:00",
            "2026-08-30T06:00:00+00:00",
            None,
        );
        assert_eq!(
            format_event_line(&event),
            "Sat 2026-08-29 23:30 to 2026-08-30 06:00: Red-eye"
        );
    }

    #[test]
    fn all_day_event_renders_without_times() {
        let event = Event {
            id: "evt".into(),
            summary: Some("Conference".into()),
            start: EventTime::on("2026-08-29".parse().unwrap()),
            end: EventTime::on("2026-08-30".parse().unwrap()),
            location: None,
            description: None,
        };
        assert_eq!(
            format_event_line(&event),
            "Sat 2026-08-29 (all day): Conference"
        );
    }

    #[test]
    fn untitled_event_gets_a_placeholder() {
        let mut event = timed(
            "x",
            "2026-08-29T09:00:00+00:00",
            "2026-08-29T10:00:00+00:00",
            None,
        );
        event.summary = None;
        assert!(format_event_line(&event).contains("(no title)"));
    }
}
