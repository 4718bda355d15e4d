use super::grid::{canonical_day, layout, TimeRange};
use super::*;

fn task(time: &str, subject: &str) -> SessionTask {
    SessionTask {
        time: time.to_string(),
        subject: subject.to_string(),
        topic: format!("{} revision", subject),
    }
}

fn session(day: &str, tasks: Vec<SessionTask>) -> DailySession {
    DailySession {
        day: day.to_string(),
        tasks,
    }
}

fn week(sessions: Vec<DailySession>) -> WeeklySchedule {
    WeeklySchedule {
        week: 1,
        dates: "2026-05-04 to 2026-05-10".to_string(),
        daily_sessions: sessions,
    }
}

fn request() -> RevisionRequest {
    RevisionRequest {
        exams: vec![
            Exam {
                subject: "Maths".into(),
                date: "2026-06-03".into(),
                tasks: vec![],
            },
            Exam {
                subject: "Physics".into(),
                date: "2026-06-01".into(),
                tasks: vec!["Past paper".into()],
            },
        ],
        start_date: "2026-05-01".into(),
        hours_per_week: 8.0,
        study_times: BTreeMap::new(),
    }
}

#[test]
fn validate_returns_latest_exam() {
    let last = request().validate().unwrap();
    assert_eq!(last, NaiveDate::from_ymd_opt(2026, 6, 3).unwrap());
}

#[test]
fn last_exam_date_ignores_unparseable_dates() {
    let mut request = request();
    request.exams[0].date = "June".into();
    assert_eq!(
        request.last_exam_date(),
        NaiveDate::from_ymd_opt(2026, 6, 1)
    );
    request.exams.truncate(0);
    assert_eq!(request.last_exam_date(), None);
}

#[test]
fn validate_rejects_bad_requests() {
    let mut no_exams = request();
    no_exams.exams.clear();
    assert_eq!(no_exams.validate(), Err(TimetableError::NoExams));

    let mut bad_date = request();
    bad_date.exams[0].date = "03/06/2026".into();
    assert!(matches!(
        bad_date.validate(),
        Err(TimetableError::InvalidDate { .. })
    ));

    let mut blank = request();
    blank.exams[1].subject = "  ".into();
    assert_eq!(blank.validate(), Err(TimetableError::BlankSubject { index: 2 }));

    let mut hours = request();
    hours.hours_per_week = 0.0;
    assert_eq!(hours.validate(), Err(TimetableError::InvalidHours(0.0)));

    let mut late = request();
    late.start_date = "2026-06-03".into();
    assert!(matches!(
        late.validate(),
        Err(TimetableError::StartAfterLastExam { .. })
    ));
}

#[test]
fn request_reads_camel_case_json() {
    let request: RevisionRequest = serde_json::from_str(
        r#"{
            "exams": [{"subject": "Chemistry", "date": "2026-06-10"}],
            "startDate": "2026-05-01",
            "hoursPerWeek": 6,
            "studyTimes": {"Saturday": ["10:00", "10:30"]}
        }"#,
    )
    .unwrap();
    assert_eq!(request.exams[0].tasks.len(), 0);
    assert_eq!(request.hours_per_week, 6.0);
    assert_eq!(request.study_times["Saturday"], vec!["10:00", "10:30"]);
}

#[test]
fn parse_timetable_fills_defaults_and_numbers_weeks() {
    let raw = r#"Here you go:
    {"summary": "Four weeks.", "weeklySchedule": [
        {"dates": "a", "dailySessions": [{"day": "Monday", "tasks": [{"time": "18:00 - 19:00", "subject": "Maths"}]}]},
        {"week": 7, "dates": "b", "dailySessions": []},
    ]}"#;
    let (timetable, stage) = parse_timetable(raw).unwrap();
    assert_eq!(stage, ParseStage::Repaired);
    assert_eq!(timetable.title, DEFAULT_TIMETABLE_TITLE);
    assert_eq!(timetable.weekly_schedule[0].week, 1);
    assert_eq!(timetable.weekly_schedule[1].week, 7);
    assert_eq!(timetable.weekly_schedule[0].daily_sessions[0].tasks[0].topic, "");
    assert_eq!(timetable.total_sessions(), 1);
}

#[test]
fn parse_timetable_reports_unreadable_and_malformed() {
    assert_eq!(
        parse_timetable("no json here"),
        Err(TimetableError::Unreadable)
    );
    assert!(matches!(
        parse_timetable(r#"{"weeklySchedule": "soon"}"#),
        Err(TimetableError::Malformed(_))
    ));
}

#[test]
fn parse_timetable_treats_nulls_as_missing() {
    let raw = r#"{"title": null, "summary": null, "weeklySchedule": [
        {"week": null, "dates": null, "dailySessions": [
            {"day": "Monday", "tasks": null},
            null,
            {"day": "Tuesday", "tasks": [{"time": "18:00 - 19:00", "subject": null, "topic": 3}]}
        ]},
        null
    ]}"#;
    let (timetable, stage) = parse_timetable(raw).unwrap();
    assert_eq!(stage, ParseStage::Direct);
    assert_eq!(timetable.title, DEFAULT_TIMETABLE_TITLE);
    assert_eq!(timetable.summary, "");
    assert_eq!(timetable.weekly_schedule.len(), 1);

    let week = &timetable.weekly_schedule[0];
    assert_eq!(week.week, 1);
    assert_eq!(week.dates, "");
    assert_eq!(week.daily_sessions.len(), 2);
    assert!(week.daily_sessions[0].tasks.is_empty());
    let task = &week.daily_sessions[1].tasks[0];
    assert_eq!(task.subject, "");
    assert_eq!(task.topic, "3");
}

#[test]
fn parse_timetable_accepts_numeric_strings_for_weeks() {
    let raw = r#"{"weeklySchedule": [
        {"week": "1", "dates": "a"},
        {"week": " 2 ", "dates": "b"},
        {"week": 3.0, "dates": "c"},
        {"week": "third", "dates": "d"}
    ]}"#;
    let (timetable, _) = parse_timetable(raw).unwrap();
    let weeks: Vec<u32> = timetable.weekly_schedule.iter().map(|w| w.week).collect();
    assert_eq!(weeks, vec![1, 2, 3, 4]);
}

#[test]
fn time_ranges_parse_and_reject() {
    assert_eq!(
        TimeRange::parse("18:00 - 19:30"),
        Some(TimeRange {
            start: 1080,
            end: 1170
        })
    );
    assert_eq!(
        TimeRange::parse("9:15–10:00"),
        Some(TimeRange { start: 555, end: 600 })
    );
    assert_eq!(TimeRange::parse("19:00 - 18:00"), None);
    assert_eq!(TimeRange::parse("18:00 - 18:00"), None);
    assert_eq!(TimeRange::parse("evening"), None);
    assert_eq!(TimeRange::parse("18:75 - 19:00"), None);
}

#[test]
fn day_names_are_normalised() {
    assert_eq!(canonical_day("monday"), Some("Monday"));
    assert_eq!(canonical_day(" Thu "), Some("Thursday"));
    assert_eq!(canonical_day("Mo"), None);
    assert_eq!(canonical_day("Funday"), None);
}

#[test]
fn grid_uses_active_days_in_week_order() {
    let grid = layout(&week(vec![
        session("Saturday", vec![task("10:00 - 11:00", "Physics")]),
        session("Monday", vec![task("18:00 - 19:30", "Maths")]),
        session("Tuesday", vec![]),
    ]));
    assert_eq!(grid.days, vec!["Monday", "Saturday"]);
}

#[test]
fn grid_slots_cover_rounded_range() {
    let grid = layout(&week(vec![
        session("Monday", vec![task("09:15 - 10:00", "Maths")]),
        session("Wednesday", vec![task("10:30 - 11:10", "Physics")]),
    ]));
    assert_eq!(
        grid.slots,
        vec!["09:00", "09:30", "10:00", "10:30", "11:00"]
    );

    let maths = &grid.placements[0];
    assert_eq!((maths.column, maths.row, maths.span), (0, 0, 2));
    let physics = &grid.placements[1];
    assert_eq!((physics.column, physics.row, physics.span), (1, 3, 2));
}

#[test]
fn grid_spans_match_duration() {
    let grid = layout(&week(vec![session(
        "Friday",
        vec![
            task("18:00 - 19:30", "Maths"),
            task("19:30 - 20:00", "Physics"),
        ],
    )]));
    assert_eq!(grid.slots.len(), 4);
    assert_eq!(grid.placements[0].span, 3);
    assert_eq!(grid.placements[1].row, 3);
    assert_eq!(grid.placements[1].span, 1);
}

#[test]
fn grid_skips_unreadable_tasks() {
    let grid = layout(&week(vec![session(
        "Monday",
        vec![task("later", "Maths"), task("20:00 - 19:00", "Physics")],
    )]));
    assert_eq!(grid.days, vec!["Monday"]);
    assert!(grid.slots.is_empty());
    assert!(grid.placements.is_empty());
}

#[test]
fn empty_week_has_empty_layout() {
    let grid = layout(&week(vec![]));
    assert!(grid.is_empty());
    assert!(grid
        .render_text(12)
        .contains("No study sessions planned for this week."));
}

#[test]
fn rendered_grid_shows_subject_and_topic() {
    let grid = layout(&week(vec![session(
        "Monday",
        vec![task("18:00 - 19:30", "Maths")],
    )]));
    let text = grid.render_text(14);
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("Week 1"));
    assert!(lines[1].contains("Monday"));
    assert!(lines[2].starts_with("18:00") && lines[2].contains("Maths"));
    assert!(lines[3].contains("Maths revision"));
    assert!(lines[4].contains('¦'));
}
