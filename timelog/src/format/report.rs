//! Tabular evaluations: the per-period report and the current-day overview.

use chrono::Datelike;

use super::Serialiser;
use super::table::Table;
use crate::core::{Duration, Record, Time};
use crate::period::{Period, PeriodKind};
use crate::query::{self, CurrentSplit, PeriodGroup};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];
const WEEKDAYS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

const N_A: &str = "n/a";
const UNKNOWN: &str = "???";

struct Totals {
    total: Duration,
    should: Duration,
    diff: Duration,
}

impl Totals {
    fn of(records: &[Record]) -> Self {
        let total = query::total(records);
        let should = query::should_total_sum(records);
        Self {
            total,
            should,
            diff: query::diff(should, total),
        }
    }

    fn plus(&self, other: &Totals) -> Self {
        let total = self.total + other.total;
        let should = self.should + other.should;
        Self {
            total,
            should,
            diff: query::diff(should, total),
        }
    }

    fn cells(&self, s: &Serialiser, table: &mut Table, diff: bool) {
        table.right(s.duration(self.total));
        if diff {
            table
                .right(s.should_duration(self.should))
                .right(s.signed_duration(self.diff));
        }
    }
}

fn value_columns(diff: bool) -> usize {
    if diff { 3 } else { 1 }
}

fn value_header(table: &mut Table, diff: bool) {
    table.right("   Total");
    if diff {
        table.right("   Should").right("    Diff");
    }
}

fn fill_line(table: &mut Table, diff: bool) {
    for _ in 0..value_columns(diff) {
        table.fill('=');
    }
}

/* ---------------------------------- Report --------------------------------- */

/// Row labels of one period granularity. Years and months are only printed
/// when they differ from the row above.
struct Labels {
    kind: PeriodKind,
    year: Option<i32>,
    month: Option<u32>,
}

impl Labels {
    fn new(kind: PeriodKind) -> Self {
        Self {
            kind,
            year: None,
            month: None,
        }
    }

    fn prefix_columns(&self) -> usize {
        match self.kind {
            PeriodKind::Day => 4,
            PeriodKind::Year => 1,
            PeriodKind::Week | PeriodKind::Month | PeriodKind::Quarter => 2,
        }
    }

    fn header(&self, table: &mut Table) {
        table.left("    ");
        match self.kind {
            PeriodKind::Day => {
                table.left("   ").left("      ").right("   ");
            }
            PeriodKind::Week => {
                table.left("        ");
            }
            PeriodKind::Month => {
                table.left("   ");
            }
            PeriodKind::Quarter => {
                table.left("  ");
            }
            PeriodKind::Year => {}
        }
    }

    fn year_cell(&mut self, table: &mut Table, year: i32) {
        if self.year == Some(year) {
            table.skip(1);
        } else {
            self.year = Some(year);
            self.month = None;
            table.right(year.to_string());
        }
    }

    fn row(&mut self, table: &mut Table, period: &Period) {
        let date = period.since();
        match self.kind {
            PeriodKind::Day => {
                self.year_cell(table, date.year());
                if self.month == Some(date.month()) {
                    table.skip(1);
                } else {
                    self.month = Some(date.month());
                    table.right(MONTHS[date.month() as usize - 1]);
                }
                table
                    .right(WEEKDAYS[date.weekday() as usize - 1])
                    .right(format!("{:2}.", date.day()));
            }
            PeriodKind::Week => {
                self.year_cell(table, date.naive().iso_week().year());
                table.right(format!("Week {:2}", date.week_number()));
            }
            PeriodKind::Month => {
                self.year_cell(table, date.year());
                table.right(MONTHS[date.month() as usize - 1]);
            }
            PeriodKind::Quarter => {
                self.year_cell(table, date.year());
                table.right(format!("Q{}", date.quarter()));
            }
            PeriodKind::Year => {
                self.year_cell(table, date.year());
            }
        }
    }
}

/// One row per period with its total, and the grand total below. Groups
/// without records render as empty rows.
pub fn render_report(
    s: &Serialiser,
    groups: &[PeriodGroup],
    kind: PeriodKind,
    diff: bool,
) -> String {
    if groups.is_empty() {
        return String::new();
    }
    let mut labels = Labels::new(kind);
    let prefix = labels.prefix_columns();
    let mut table = Table::new(prefix + value_columns(diff), " ");

    labels.header(&mut table);
    value_header(&mut table, diff);

    let mut grand = Totals::of(&[]);
    for group in groups {
        labels.row(&mut table, &group.period);
        if group.records.is_empty() {
            table.skip(value_columns(diff));
            continue;
        }
        let totals = Totals::of(&group.records);
        totals.cells(s, &mut table, diff);
        grand = grand.plus(&totals);
    }

    table.skip(prefix);
    fill_line(&mut table, diff);
    table.skip(prefix);
    grand.cells(s, &mut table, diff);
    table.render()
}

/* ---------------------------------- Today ---------------------------------- */

/// Input for the end-time column of [`render_today`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Forecast {
    pub now: Time,
    /// Whether an open range was closed at `now`. Otherwise the end time is
    /// only shown as a hint.
    pub closed_open_range: bool,
}

fn end_time_cell(s: &Serialiser, table: &mut Table, forecast: &Forecast, totals: &Totals) {
    match forecast.now.plus(-totals.diff) {
        Ok(end) if forecast.closed_open_range => table.right(s.time(&end)),
        Ok(end) => table.right(s.note(&format!("({end})"))),
        Err(_) => table.right(UNKNOWN),
    };
}

/// The current day (today, or yesterday as fallback) next to all other
/// records. The end-time column needs both `diff` and a forecast.
pub fn render_today(
    s: &Serialiser,
    split: &CurrentSplit,
    diff: bool,
    forecast: Option<Forecast>,
) -> String {
    let forecast = forecast.filter(|_| diff);
    let extra = usize::from(forecast.is_some());
    let mut table = Table::new(1 + value_columns(diff) + extra, " ");
    let has_current = !split.current.is_empty();

    table.left("         ");
    value_header(&mut table, diff);
    if forecast.is_some() {
        table.right("  End-Time");
    }

    let current = Totals::of(&split.current);
    table.left(if split.is_yesterday { "Yesterday" } else { "Today" });
    if has_current {
        current.cells(s, &mut table, diff);
    } else {
        table.right(N_A);
        if diff {
            table.right(N_A).right(N_A);
        }
    }
    if let Some(forecast) = &forecast {
        if has_current {
            end_time_cell(s, &mut table, forecast, &current);
        } else {
            table.right(N_A);
        }
    }

    let others = Totals::of(&split.others);
    table.left("Other");
    others.cells(s, &mut table, diff);
    table.skip(extra);

    table.skip(1);
    fill_line(&mut table, diff);
    table.skip(extra);

    let grand = current.plus(&others);
    table.left("All");
    grand.cells(s, &mut table, diff);
    if let Some(forecast) = &forecast {
        if has_current {
            end_time_cell(s, &mut table, forecast, &grand);
        } else {
            table.right(N_A);
        }
    }
    table.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Date;
    use crate::parser::parse;
    use rstest::rstest;

    fn records(text: &str) -> Vec<Record> {
        parse(text).expect("valid").records
    }

    fn report(text: &str, kind: PeriodKind, fill: bool, diff: bool) -> String {
        let groups = query::group_by_period(&records(text), kind, fill).expect("groups");
        render_report(&Serialiser::plain(), &groups, kind, diff)
    }

    #[test]
    fn day_report_shows_year_and_month_on_change() {
        let text = "\
2018-07-07 (8h!)
    8h

2018-07-08 (5h30m!)
    2h

2018-07-09 (2h!)
    5h20m

2018-07-09 (19m!)
";
        assert_eq!(
            report(text, PeriodKind::Day, false, true),
            "                       Total    Should     Diff
2018 Jul    Sat  7.       8h       8h!       0m
            Sun  8.       2h    5h30m!   -3h30m
            Mon  9.    5h20m    2h19m!    +3h1m
                    ======== ========= ========
                      15h20m   15h49m!     -29m
"
        );
    }

    #[test]
    fn filled_day_report_lists_every_day() {
        let text = "2020-09-29\n    1h\n\n2020-10-04\n    3h\n\n2020-10-02\n";
        assert_eq!(
            report(text, PeriodKind::Day, true, false),
            "                       Total
2020 Sep    Tue 29.       1h
            Wed 30.
     Oct    Thu  1.
            Fri  2.       0m
            Sat  3.
            Sun  4.       3h
                    ========
                          4h
"
        );
    }

    #[test]
    fn week_report_labels_iso_years() {
        let text = "2016-01-03\n  1h\n\n2016-01-04\n  1h\n\n2016-12-31\n  1h\n\n2017-01-01\n  1h\n";
        assert_eq!(
            report(text, PeriodKind::Week, false, false),
            "                 Total
2015  Week 53       1h
2016  Week  1       1h
      Week 52       2h
              ========
                    4h
"
        );
    }

    #[rstest]
    #[case(
        PeriodKind::Quarter,
        "           Total    Should     Diff
2018 Q1       8h       8h!       0m
     Q2    7h20m    7h30m!     -10m
     Q3
     Q4
2019 Q1       0m      19m!     -19m
        ======== ========= ========
          15h20m   15h49m!     -29m
"
    )]
    #[case(
        PeriodKind::Year,
        "        Total    Should     Diff
2018   15h20m   15h30m!     -10m
2019       0m      19m!     -19m
     ======== ========= ========
       15h20m   15h49m!     -29m
"
    )]
    fn coarser_reports_fill_gaps(#[case] kind: PeriodKind, #[case] expected: &str) {
        let text = "\
2018-02-02 (8h!)
    8h

2018-04-10 (5h30m!)
    2h

2018-05-23 (2h!)
    5h20m

2019-01-01 (19m!)
";
        assert_eq!(report(text, kind, true, true), expected);
    }

    #[test]
    fn month_report_without_records_is_empty() {
        assert_eq!(report("", PeriodKind::Month, true, true), "");
    }

    fn today(text: &str, diff: bool, forecast: Option<Forecast>) -> String {
        let split = query::split_current(Date::new(1999, 3, 14).expect("date"), &records(text));
        render_today(&Serialiser::plain(), &split, diff, forecast)
    }

    fn at(hour: u32, minute: u32, closed_open_range: bool) -> Option<Forecast> {
        Some(Forecast {
            now: Time::new(hour, minute).expect("time"),
            closed_open_range,
        })
    }

    #[test]
    fn today_sums_current_and_other_records() {
        let text = "\
1999-03-12
    5m

1999-03-13
    12h

1999-03-14
    1h

1999-03-14
    3h
    13:15 - 15:00
";
        assert_eq!(
            today(text, false, None),
            "             Total
Today        5h45m
Other        12h5m
          ========
All         17h50m
"
        );
    }

    #[test]
    fn today_falls_back_to_yesterday() {
        assert_eq!(
            today("1999-03-12\n    5m\n\n1999-03-13\n    12h\n", false, None),
            "             Total
Yesterday      12h
Other           5m
          ========
All          12h5m
"
        );
    }

    #[test]
    fn today_forecasts_the_end_time() {
        let text = "1999-03-12 (3h10m!)\n    6h50m\n\n1999-03-14 (6h!)\n    14:38 - 18:13\n";
        assert_eq!(
            today(text, true, at(18, 13, true)),
            "             Total    Should     Diff   End-Time
Today        3h35m       6h!   -2h25m      20:38
Other        6h50m    3h10m!   +3h40m
          ======== ========= ========
All         10h25m    9h10m!   +1h15m      16:58
"
        );
    }

    #[test]
    fn today_end_time_is_a_hint_without_open_range() {
        let text = "1999-03-12 (3h10m!)\n    6h50m\n\n1999-03-14 (6h!)\n    14:38 - 21:05\n";
        assert_eq!(
            today(text, true, at(21, 5, false)),
            "             Total    Should     Diff   End-Time
Today        6h27m       6h!     +27m    (20:38)
Other        6h50m    3h10m!   +3h40m
          ======== ========= ========
All         13h17m    9h10m!    +4h7m    (16:58)
"
        );
    }

    #[rstest]
    #[case(
        "1999-03-14 (60h!)\n    1h\n",
        "             Total    Should     Diff   End-Time
Today           1h      60h!     -59h        ???
Other           0m       0m!       0m
          ======== ========= ========
All             1h      60h!     -59h        ???
"
    )]
    #[case(
        "1999-03-10 (3h10m!)\n    6h50m\n",
        "             Total    Should     Diff   End-Time
Today          n/a       n/a      n/a        n/a
Other        6h50m    3h10m!   +3h40m
          ======== ========= ========
All          6h50m    3h10m!   +3h40m        n/a
"
    )]
    fn today_uses_placeholders(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(today(text, true, at(18, 13, true)), expected);
    }

    #[test]
    fn end_time_needs_diff() {
        let text = "1999-03-14\n    1h\n";
        assert_eq!(today(text, false, at(18, 13, true)), today(text, false, None));
    }
}
