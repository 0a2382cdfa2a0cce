pub mod dashboard;
pub mod month_grid;

pub use dashboard::{DashboardStats, UpcomingComparecimento, recent_registrations, relative_time, upcoming};
pub use month_grid::{
    DayCell, DisplayedMonth, GridError, MonthGrid, MonthTotals, build_month_grid, build_month_grid_on,
};
