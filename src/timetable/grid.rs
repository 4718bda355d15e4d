//! Weekly grid layout: which days get columns, which 30-minute rows exist,
//! and where each session sits.

use super::WeeklySchedule;
use serde::Serialize;

pub const CANONICAL_DAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
pub const SLOT_MINUTES: u32 = 30;

/// Minutes from midnight, `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: u32,
    pub end: u32,
}

impl TimeRange {
    /// Parses `"HH:MM - HH:MM"`; hyphen or en dash, spacing optional.
    pub fn parse(text: &str) -> Option<Self> {
        let (start, end) = text.split_once(['-', '–'])?;
        let range = Self {
            start: parse_clock(start)?,
            end: parse_clock(end)?,
        };
        (range.start < range.end).then_some(range)
    }
}

fn parse_clock(text: &str) -> Option<u32> {
    let (hour, minute) = text.trim().split_once(':')?;
    let hour: u32 = hour.trim().parse().ok()?;
    let minute: u32 = minute.trim().parse().ok()?;
    (hour <= 24 && minute < 60 && hour * 60 + minute <= 24 * 60).then(|| hour * 60 + minute)
}

/// Canonical day name for `Monday`, `monday`, `Mon`, ...
pub fn canonical_day(name: &str) -> Option<&'static str> {
    let name = name.trim().to_lowercase();
    if name.len() < 3 {
        return None;
    }
    CANONICAL_DAYS
        .iter()
        .copied()
        .find(|day| day.to_lowercase().starts_with(&name))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// Index into [`GridLayout::days`].
    pub column: usize,
    /// Index into [`GridLayout::slots`].
    pub row: usize,
    /// Number of rows covered, at least 1.
    pub span: usize,
    pub subject: String,
    pub topic: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridLayout {
    pub week: u32,
    pub dates: String,
    pub days: Vec<&'static str>,
    /// `HH:MM` label of each row.
    pub slots: Vec<String>,
    pub placements: Vec<Placement>,
}

impl GridLayout {
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Plain-text grid, one row per slot.
    pub fn render_text(&self, cell_width: usize) -> String {
        let title = format!("Week {} ({}) - Grid View", self.week, self.dates);
        if self.is_empty() {
            return format!("{}\nNo study sessions planned for this week.\n", title);
        }

        let mut cells = vec![vec![String::new(); self.days.len()]; self.slots.len()];
        for placement in &self.placements {
            for offset in 0..placement.span {
                let Some(row) = cells.get_mut(placement.row + offset) else {
                    break;
                };
                let cell = &mut row[placement.column];
                if cell.is_empty() {
                    *cell = if offset == 0 {
                        placement.subject.clone()
                    } else if offset == 1 {
                        placement.topic.clone()
                    } else {
                        "¦".to_string()
                    };
                }
            }
        }

        let mut out = format!("{}\n{:>5} ", title, "");
        for day in &self.days {
            out.push_str(&fit(day, cell_width));
            out.push(' ');
        }
        out.push('\n');
        for (label, row) in self.slots.iter().zip(&cells) {
            out.push_str(&format!("{:>5} ", label));
            for cell in row {
                out.push_str(&fit(cell, cell_width));
                out.push(' ');
            }
            out.push('\n');
        }
        out
    }
}

fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count > width {
        let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
        cut.push('…');
        cut
    } else {
        format!("{}{}", text, " ".repeat(width - count))
    }
}

fn slot_label(minutes: u32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Lays out one week. Sessions on unknown days and tasks whose time range
/// cannot be read are left off the grid.
pub fn layout(schedule: &WeeklySchedule) -> GridLayout {
    let mut active = [false; 7];
    let mut ranges = Vec::new();

    for session in &schedule.daily_sessions {
        let Some(day) = canonical_day(&session.day) else {
            continue;
        };
        let Some(column) = CANONICAL_DAYS.iter().position(|d| *d == day) else {
            continue;
        };
        if !session.tasks.is_empty() {
            active[column] = true;
        }
        for task in &session.tasks {
            if let Some(range) = TimeRange::parse(&task.time) {
                ranges.push((column, range, task));
            }
        }
    }

    let days: Vec<&'static str> = CANONICAL_DAYS
        .iter()
        .zip(active)
        .filter_map(|(day, on)| on.then_some(*day))
        .collect();

    let mut grid = GridLayout {
        week: schedule.week,
        dates: schedule.dates.clone(),
        days,
        slots: Vec::new(),
        placements: Vec::new(),
    };

    let (Some(min_start), Some(max_end)) = (
        ranges.iter().map(|(_, r, _)| r.start).min(),
        ranges.iter().map(|(_, r, _)| r.end).max(),
    ) else {
        return grid;
    };

    let first = min_start / SLOT_MINUTES * SLOT_MINUTES;
    let last = max_end.div_ceil(SLOT_MINUTES) * SLOT_MINUTES;
    grid.slots = (first..last)
        .step_by(SLOT_MINUTES as usize)
        .map(slot_label)
        .collect();

    for (canonical_column, range, task) in ranges {
        let day = CANONICAL_DAYS[canonical_column];
        let Some(column) = grid.days.iter().position(|d| *d == day) else {
            continue;
        };
        let row = ((range.start - first) / SLOT_MINUTES) as usize;
        let end_row = (range.end - first).div_ceil(SLOT_MINUTES) as usize;
        if row >= grid.slots.len() || end_row <= row {
            continue;
        }
        grid.placements.push(Placement {
            column,
            row,
            span: end_row - row,
            subject: task.subject.clone(),
            topic: task.topic.clone(),
        });
    }

    grid
}
