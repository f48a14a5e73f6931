//! Terminal rendering of forecasts and distribution reports.
//!
//! Everything renders to a `String`; printing is left to the binary. Dates
//! are formatted here and nowhere else.

use chrono::{DateTime, Local, NaiveDate};
use crossterm::style::Stylize;
use unicode_width::UnicodeWidthStr;

use crate::analysis::{DistributionReport, DurationHistogram, Outlier, Severity, SizeDeviation};
use crate::montecarlo::ForecastResult;
use crate::task::Task;

/// Width of the longest forecast bar, in cells.
pub const CHART_WIDTH: usize = 80;

/// Glyph used to draw forecast bars.
pub const BAR_CHAR: char = '■';

/// Working days in a week, used for effort estimates.
pub const WORKING_DAYS_PER_WEEK: f64 = 5.0;

/// Deadline assumed when none is given: far enough away to never be missed.
pub fn default_deadline() -> NaiveDate {
    NaiveDate::from_ymd_opt(2100, 1, 1).unwrap_or(NaiveDate::MAX)
}

/// `YYYY-MM-DD` in local time.
pub fn format_date(date: &DateTime<Local>) -> String {
    date.format("%Y-%m-%d").to_string()
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Minimal box-drawn table.
///
/// Columns are sized by terminal cells, so wide glyphs such as emoji keep
/// the borders aligned.
#[derive(Debug, Clone, Default)]
pub struct Table {
    head: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<S: Into<String>>(head: impl IntoIterator<Item = S>) -> Self {
        Self {
            head: head.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row<S: Into<String>>(&mut self, cells: impl IntoIterator<Item = S>) -> &mut Self {
        self.rows.push(cells.into_iter().map(Into::into).collect());
        self
    }

    pub fn render(&self) -> String {
        let columns = self
            .rows
            .iter()
            .map(Vec::len)
            .chain(std::iter::once(self.head.len()))
            .max()
            .unwrap_or(0);

        let mut widths = vec![0; columns];
        for line in std::iter::once(&self.head).chain(&self.rows) {
            for (i, cell) in line.iter().enumerate() {
                widths[i] = widths[i].max(cell.width());
            }
        }

        let rule = |left: &str, mid: &str, right: &str| {
            let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("{left}{}{right}\n", segments.join(mid))
        };
        let line = |cells: &[String]| {
            let padded: Vec<String> = widths
                .iter()
                .enumerate()
                .map(|(i, w)| {
                    let cell = cells.get(i).map(String::as_str).unwrap_or("");
                    let pad = w - cell.width();
                    format!(" {cell}{} ", " ".repeat(pad))
                })
                .collect();
            format!("│{}│\n", padded.join("│"))
        };

        let mut out = rule("┌", "┬", "┐");
        out.push_str(&line(&self.head));
        if !self.rows.is_empty() {
            out.push_str(&rule("├", "┼", "┤"));
        }
        for row in &self.rows {
            out.push_str(&line(row));
        }
        out.push_str(&rule("└", "┴", "┘"));
        out
    }
}

// ---------------------------------------------------------------------------
// Forecast
// ---------------------------------------------------------------------------

/// Weeks of effort for `days` spread over `parallelism` workers.
pub fn effort_weeks(days: u32, parallelism: u32) -> u32 {
    let per_worker = f64::from(days) / f64::from(parallelism.max(1));
    (per_worker / WORKING_DAYS_PER_WEEK).ceil() as u32
}

/// Horizontal bar chart with one bar per confidence band.
///
/// Bands finishing after `deadline` are drawn red, the rest green, when
/// `color` is set.
pub fn render_forecast_chart(
    result: &ForecastResult,
    total_points: u64,
    deadline: Option<NaiveDate>,
    color: bool,
) -> String {
    let mut out = match deadline {
        Some(d) => format!(
            "📆 Probability of finishing the scope of {total_points} story points before {}:\n",
            d.format("%Y-%m-%d")
        ),
        None => format!("📆 Probability of finishing the scope of {total_points} story points:\n"),
    };
    if result.degraded {
        out.push_str("⚠ no history available, durations assume a fixed number of days per point\n");
    }

    let deadline = deadline.unwrap_or_else(default_deadline);
    let labels: Vec<String> = result
        .bands
        .iter()
        .map(|band| {
            format!(
                "{} in {} days ({} weeks effort) by {}",
                band.confidence,
                band.days,
                effort_weeks(band.days, result.parallelism),
                format_date(&band.finish_by)
            )
        })
        .collect();
    let label_width = labels.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let longest = result.bands.iter().map(|b| b.days).max().unwrap_or(1).max(1);

    for (band, label) in result.bands.iter().zip(&labels) {
        let len = (band.days as usize * CHART_WIDTH).div_ceil(longest as usize).max(1);
        let bar: String = std::iter::repeat_n(BAR_CHAR, len).collect();
        let label = format!("{label:<label_width$}");
        let late = band.finish_by.date_naive() > deadline;
        let line = if !color {
            format!("{label} ╢{bar}")
        } else if late {
            format!("{} ╢{}", label.red(), bar.red())
        } else {
            format!("{} ╢{}", label.green(), bar.green())
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// Project / Task / Story Points table of the scope.
pub fn render_scope_table(scope: &[Task]) -> String {
    let mut table = Table::new(["Project", "Task", "Story Points"]);
    for task in scope {
        table.row([
            task.project.clone(),
            task.task_id.clone(),
            task.estimation.to_string(),
        ]);
    }
    format!("📦 Scope:\n{}", table.render())
}

// ---------------------------------------------------------------------------
// Distribution
// ---------------------------------------------------------------------------

fn severity_marker(severity: Severity) -> &'static str {
    match severity {
        Severity::High => "🔴",
        Severity::Medium => "🟠",
        Severity::Low => "🟢",
    }
}

pub fn render_histogram(histogram: &DurationHistogram) -> String {
    let head = std::iter::once("Story Points".to_string())
        .chain(histogram.durations.iter().map(|d| format!("{d} days")));
    let mut table = Table::new(head);
    for row in &histogram.rows {
        table.row(
            std::iter::once(row.estimation.to_string())
                .chain(row.counts.iter().map(ToString::to_string)),
        );
    }
    format!(
        "📊 Task duration distribution based on story points estimation (lower distribution better):\n{}",
        table.render()
    )
}

pub fn render_deviation(deviations: &[SizeDeviation]) -> String {
    let mut table = Table::new(["", "Story Points", "Median", "Deviation"]);
    for d in deviations {
        table.row([
            severity_marker(d.severity).to_string(),
            d.estimation.to_string(),
            d.median.to_string(),
            d.deviation.to_string(),
        ]);
    }
    format!("📊 Task deviation by story points (lower better):\n{}", table.render())
}

pub fn render_outliers(outliers: &[Outlier]) -> String {
    let mut table = Table::new(["Task Id", "Story Points", "Duration"]);
    for o in outliers {
        table.row([o.task_id.clone(), o.estimation.to_string(), o.duration.to_string()]);
    }
    format!("📊 Outlier tasks:\n{}", table.render())
}

/// The full analyse report.
pub fn render_distribution_report(report: &DistributionReport) -> String {
    format!(
        "{}\n{}\n{}",
        render_histogram(&report.histogram),
        render_deviation(&report.deviations),
        render_outliers(&report.outliers)
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::analysis::HistogramRow;
    use crate::montecarlo::{Confidence, QuantileBand};

    fn result(days: &[(u8, u32)], degraded: bool) -> ForecastResult {
        let start = Local.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        ForecastResult {
            start,
            iterations: 1000,
            parallelism: 2,
            degraded,
            bands: days
                .iter()
                .map(|&(p, d)| QuantileBand {
                    confidence: Confidence(p),
                    days: d,
                    finish_by: start.checked_add_days(chrono::Days::new(u64::from(d))).unwrap(),
                })
                .collect(),
        }
    }

    #[test]
    fn table_renders_boxes() {
        let mut table = Table::new(["a", "bb"]);
        table.row(["1", "2"]).row(["333", ""]);
        let expected = "\
┌─────┬────┐
│ a   │ bb │
├─────┼────┤
│ 1   │ 2  │
│ 333 │    │
└─────┴────┘
";
        assert_eq!(table.render(), expected);
    }

    #[test]
    fn wide_glyphs_keep_borders_aligned() {
        let rendered = render_deviation(&[
            SizeDeviation {
                estimation: 1,
                median: 2,
                deviation: 1,
                severity: Severity::Low,
            },
            SizeDeviation {
                estimation: 8,
                median: 20,
                deviation: 14,
                severity: Severity::High,
            },
        ]);
        let widths: Vec<usize> = rendered.lines().skip(1).map(UnicodeWidthStr::width).collect();
        assert_eq!(widths.len(), 6);
        assert!(widths.iter().all(|&w| w == widths[0]), "{widths:?}");
        assert!(rendered.contains("│ 🟢 │"));
    }

    #[test]
    fn empty_table_has_header_only() {
        let rendered = Table::new(["Task Id"]).render();
        assert_eq!(rendered.lines().count(), 3);
    }

    #[test]
    fn effort_is_rounded_up_to_weeks() {
        assert_eq!(effort_weeks(10, 1), 2);
        assert_eq!(effort_weeks(11, 1), 3);
        assert_eq!(effort_weeks(10, 2), 1);
        assert_eq!(effort_weeks(10, 0), 2);
    }

    #[test]
    fn chart_labels_each_band() {
        let chart = render_forecast_chart(&result(&[(99, 40), (60, 20)], false), 21, None, false);
        assert!(chart.contains("21 story points:"));
        assert!(chart.contains("99% in 40 days (4 weeks effort) by 2024-04-10"));
        assert!(chart.contains("60% in 20 days (2 weeks effort) by 2024-03-21"));

        let bars: Vec<usize> = chart
            .lines()
            .skip(1)
            .map(|l| l.chars().filter(|&c| c == BAR_CHAR).count())
            .collect();
        assert_eq!(bars, vec![80, 40]);
    }

    #[test]
    fn chart_mentions_deadline_and_degraded_runs() {
        let deadline = NaiveDate::from_ymd_opt(2024, 3, 25);
        let chart = render_forecast_chart(&result(&[(90, 30)], true), 8, deadline, false);
        assert!(chart.contains("before 2024-03-25"));
        assert!(chart.contains("no history available"));
    }

    #[test]
    fn colored_chart_marks_late_bands_red() {
        crossterm::style::force_color_output(true);
        let deadline = NaiveDate::from_ymd_opt(2024, 3, 25);
        let chart = render_forecast_chart(&result(&[(99, 40), (60, 20)], false), 8, deadline, true);
        let red = "x".red().to_string();
        let green = "x".green().to_string();
        let red_prefix = red.split('x').next().unwrap();
        let green_prefix = green.split('x').next().unwrap();
        assert_ne!(red_prefix, green_prefix);

        let mut lines = chart.lines().skip(1);
        assert!(lines.next().unwrap().starts_with(red_prefix));
        assert!(lines.next().unwrap().starts_with(green_prefix));
    }

    #[test]
    fn histogram_has_day_columns() {
        let hist = DurationHistogram {
            durations: vec![1, 3],
            rows: vec![HistogramRow { estimation: 2, counts: vec![4, 1] }],
        };
        let rendered = render_histogram(&hist);
        assert!(rendered.contains("│ Story Points │ 1 days │ 3 days │"));
        assert!(rendered.contains("│ 2            │ 4      │ 1      │"));
    }

    #[test]
    fn deviation_uses_severity_markers() {
        let rendered = render_deviation(&[SizeDeviation {
            estimation: 5,
            median: 8,
            deviation: 12,
            severity: Severity::High,
        }]);
        assert!(rendered.contains("🔴"));
        assert!(rendered.contains("│ 5 "));
    }

    #[test]
    fn scope_table_lists_tasks() {
        let rendered = render_scope_table(&[Task::new("PRJ-1", "PRJ", 3)]);
        assert!(rendered.contains("│ PRJ     │ PRJ-1 │ 3            │"));
    }
}
