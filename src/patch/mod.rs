//! Hand-triggered fixes for known defects in individual model outputs.

pub mod calendar;
pub mod fill;
pub mod inspect;
#[cfg(feature = "netcdf")]
pub mod native;
pub mod subset;
pub mod time_axis;

pub use calendar::{calendar_command, run_calendar, run_recalendar};
pub use fill::{fill_command, plan_fill, run_fill, FillJob, FillPlan};
pub use inspect::{count_days, inspect_file, DayCounts};
pub use subset::run_subset;
pub use time_axis::{month_date_range, Calendar, CalendarDate, TimeAxis};
