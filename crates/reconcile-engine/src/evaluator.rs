//! Schedule evaluator

use crate::model::{Schedule, SwitchState};
use chrono::NaiveTime;

/// State a daily schedule prescribes at the given time of day.
///
/// The schedule repeats every 24 hours: before the first event of the day
/// the last event's state is still in effect. An event whose time equals
/// `at` has already taken effect.
#[must_use]
pub fn expected_state(schedule: &Schedule, at: NaiveTime) -> SwitchState {
    let mut candidate = schedule.overnight_state();

    for event in schedule.events() {
        if event.at > at {
            return candidate;
        }
        candidate = event.state;
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ScheduleEvent;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M:%S%.f").unwrap()
    }

    fn schedule(events: &[(&str, SwitchState)]) -> Schedule {
        Schedule::new(
            events
                .iter()
                .map(|(at, state)| ScheduleEvent {
                    at: t(at),
                    state: *state,
                })
                .collect(),
        )
        .unwrap()
    }

    /// Direct statement of the rule: last event at or before `at`, else wrap
    fn reference(schedule: &Schedule, at: NaiveTime) -> SwitchState {
        schedule
            .events()
            .iter()
            .filter(|e| e.at <= at)
            .last()
            .map_or(schedule.overnight_state(), |e| e.state)
    }

    #[test]
    fn test_day_night_scenario() {
        let s = schedule(&[("07:00:00", SwitchState::On), ("22:00:00", SwitchState::Off)]);
        assert_eq!(expected_state(&s, t("06:00:00")), SwitchState::Off);
        assert_eq!(expected_state(&s, t("07:00:00")), SwitchState::On);
        assert_eq!(expected_state(&s, t("12:00:00")), SwitchState::On);
        assert_eq!(expected_state(&s, t("22:00:00")), SwitchState::Off);
        assert_eq!(expected_state(&s, t("23:59:59")), SwitchState::Off);
    }

    #[test]
    fn test_before_first_event_wraps_to_last() {
        let s = schedule(&[("08:00:00", SwitchState::Off), ("20:00:00", SwitchState::On)]);
        assert_eq!(expected_state(&s, t("00:00:00")), SwitchState::On);
        assert_eq!(expected_state(&s, t("07:59:59.999")), SwitchState::On);
        assert_eq!(expected_state(&s, t("08:00:00")), SwitchState::Off);
    }

    #[test]
    fn test_sub_second_precision() {
        let s = schedule(&[("07:00:00.500", SwitchState::On), ("22:00:00", SwitchState::Off)]);
        assert_eq!(expected_state(&s, t("07:00:00.499")), SwitchState::Off);
        assert_eq!(expected_state(&s, t("07:00:00.500")), SwitchState::On);
    }

    #[test]
    fn test_single_event_holds_all_day() {
        let s = schedule(&[("12:00:00", SwitchState::On)]);
        for at in ["00:00:00", "11:59:59", "12:00:00", "23:59:59"] {
            assert_eq!(expected_state(&s, t(at)), SwitchState::On);
        }
    }

    #[test]
    fn test_unsorted_input_is_sorted() {
        let s = schedule(&[("22:00:00", SwitchState::Off), ("07:00:00", SwitchState::On)]);
        assert_eq!(s.events()[0].at, t("07:00:00"));
        assert_eq!(expected_state(&s, t("12:00:00")), SwitchState::On);
    }

    #[test]
    fn test_every_event_time_yields_its_state() {
        let s = schedule(&[
            ("06:30:00", SwitchState::On),
            ("09:00:00", SwitchState::Off),
            ("17:45:00", SwitchState::On),
            ("23:15:00", SwitchState::Off),
        ]);
        for event in s.events() {
            assert_eq!(expected_state(&s, event.at), event.state);
        }
    }

    #[test]
    fn test_matches_reference_over_whole_day() {
        let s = schedule(&[
            ("01:00:00", SwitchState::Off),
            ("06:30:00", SwitchState::On),
            ("06:30:00", SwitchState::Off),
            ("13:00:00", SwitchState::On),
            ("19:20:30", SwitchState::Off),
        ]);
        for minute in 0..24 * 60 {
            for second in [0, 30] {
                let at = NaiveTime::from_hms_opt(minute / 60, minute % 60, second).unwrap();
                let first = expected_state(&s, at);
                assert_eq!(first, reference(&s, at), "at {at}");
                assert_eq!(first, expected_state(&s, at), "not idempotent at {at}");
            }
        }
    }
}
