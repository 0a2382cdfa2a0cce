use chrono::{Datelike, Days, Local, NaiveDate};
use thiserror::Error;

use crate::domain::{DateRange, Scheduled};

pub const GRID_CELLS: usize = 42;
pub const DAYS_PER_WEEK: usize = 7;

pub const MONTH_NAMES: [&str; 12] = [
    "Janeiro", "Fevereiro", "Março", "Abril", "Maio", "Junho",
    "Julho", "Agosto", "Setembro", "Outubro", "Novembro", "Dezembro",
];

pub const WEEKDAY_LABELS: [&str; DAYS_PER_WEEK] = ["Dom", "Seg", "Ter", "Qua", "Qui", "Sex", "Sáb"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("Month {0} is outside 0..=11")]
    InvalidMonth(u32),
    #[error("Date out of range: {year}-{month}")]
    OutOfRange { year: i32, month: u32 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayCell<'a, E> {
    pub date: NaiveDate,
    pub numero: u32,
    pub events: Vec<&'a E>,
    pub is_current_month: bool,
    pub is_today: bool,
}

impl<E> DayCell<'_, E> {
    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonthTotals {
    pub total: usize,
    pub attended: usize,
    pub missed: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthGrid<'a, E> {
    pub year: i32,
    /// Zero-based: 0 is January.
    pub month0: u32,
    pub cells: Vec<DayCell<'a, E>>,
}

impl<'a, E> MonthGrid<'a, E> {
    pub fn weeks(&self) -> impl Iterator<Item = &[DayCell<'a, E>]> {
        self.cells.chunks(DAYS_PER_WEEK)
    }

    pub fn cell_for(&self, date: NaiveDate) -> Option<&DayCell<'a, E>> {
        self.cells.iter().find(|c| c.date == date)
    }
}

impl<E: Scheduled> MonthGrid<'_, E> {
    /// Attendance counts over the displayed month's own days.
    pub fn totals(&self) -> MonthTotals {
        self.cells
            .iter()
            .filter(|c| c.is_current_month)
            .flat_map(|c| c.events.iter())
            .fold(MonthTotals::default(), |mut acc, event| {
                acc.total += 1;
                match event.attended() {
                    Some(true) => acc.attended += 1,
                    Some(false) => acc.missed += 1,
                    None => {}
                }
                acc
            })
    }
}

fn first_of_month(year: i32, month0: u32) -> Result<NaiveDate, GridError> {
    if month0 > 11 {
        return Err(GridError::InvalidMonth(month0));
    }
    NaiveDate::from_ymd_opt(year, month0 + 1, 1)
        .ok_or(GridError::OutOfRange { year, month: month0 })
}

pub fn build_month_grid<E: Scheduled>(
    year: i32,
    month0: u32,
    events: &[E],
) -> Result<MonthGrid<'_, E>, GridError> {
    build_month_grid_on(year, month0, events, Local::now().date_naive())
}

/// Six Sunday-first weeks covering the month, with `events` bucketed by
/// calendar day in input order.
pub fn build_month_grid_on<E: Scheduled>(
    year: i32,
    month0: u32,
    events: &[E],
    today: NaiveDate,
) -> Result<MonthGrid<'_, E>, GridError> {
    let first_day = first_of_month(year, month0)?;
    let days_before = u64::from(first_day.weekday().num_days_from_sunday());
    let grid_start = first_day
        .checked_sub_days(Days::new(days_before))
        .ok_or(GridError::OutOfRange { year, month: month0 })?;

    let mut cells = Vec::with_capacity(GRID_CELLS);
    for offset in 0..GRID_CELLS as u64 {
        let date = grid_start
            .checked_add_days(Days::new(offset))
            .ok_or(GridError::OutOfRange { year, month: month0 })?;

        let day_events: Vec<&E> = events
            .iter()
            .filter(|event| event.scheduled_day() == date)
            .collect();

        cells.push(DayCell {
            date,
            numero: date.day(),
            events: day_events,
            is_current_month: date.month0() == month0,
            is_today: date == today,
        });
    }

    Ok(MonthGrid { year, month0, cells })
}

/// The (year, month) pair a calendar screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayedMonth {
    pub year: i32,
    pub month0: u32,
}

impl DisplayedMonth {
    pub fn new(year: i32, month0: u32) -> Result<Self, GridError> {
        if month0 > 11 {
            return Err(GridError::InvalidMonth(month0));
        }
        Ok(Self { year, month0 })
    }

    pub fn current(today: NaiveDate) -> Self {
        Self { year: today.year(), month0: today.month0() }
    }

    pub fn today() -> Self {
        Self::current(Local::now().date_naive())
    }

    pub fn previous(self) -> Self {
        if self.month0 == 0 {
            Self { year: self.year - 1, month0: 11 }
        } else {
            Self { year: self.year, month0: self.month0 - 1 }
        }
    }

    pub fn next(self) -> Self {
        if self.month0 == 11 {
            Self { year: self.year + 1, month0: 0 }
        } else {
            Self { year: self.year, month0: self.month0 + 1 }
        }
    }

    pub fn name(&self) -> &'static str {
        MONTH_NAMES[self.month0 as usize % 12]
    }

    /// First and last day of the month: the fetch window for its events.
    pub fn date_range(&self) -> Result<DateRange, GridError> {
        let start = first_of_month(self.year, self.month0)?;
        let next = self.next();
        let end = first_of_month(next.year, next.month0)?
            .pred_opt()
            .ok_or(GridError::OutOfRange { year: self.year, month: self.month0 })?;
        Ok(DateRange::new(start, end))
    }

    pub fn grid<'a, E: Scheduled>(&self, events: &'a [E]) -> Result<MonthGrid<'a, E>, GridError> {
        build_month_grid(self.year, self.month0, events)
    }
}
