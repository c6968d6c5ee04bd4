//! Pipe delimited console tables comparing strategies.

use crate::{DetectorType, Metric, MetricRow, RunStatistics, Strategy, Summary};
use std::fmt;
use std::io;

/// A table cell. Counts are printed as integers and everything else, including
/// averages of counts, with three decimals.
enum Cell {
    Count(Option<f64>),
    Real(Option<f64>),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Cell::Count(None) | Cell::Real(None) => write!(f, "n/a"),
            Cell::Count(Some(value)) => write!(f, "{:.0}", value),
            Cell::Real(Some(value)) => write!(f, "{:.3}", value),
        }
    }
}

fn is_count(metric: Metric) -> bool {
    matches!(metric, Metric::KeypointCount | Metric::FilteredCount)
}

/// The per-frame values of every metric of one run, labelled with the detector.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorBreakdown {
    pub detector: DetectorType,
    pub rows: Vec<MetricRow>,
}

impl DetectorBreakdown {
    pub fn new(detector: DetectorType, stats: &RunStatistics) -> Self {
        Self {
            detector,
            rows: stats.per_frame_rows(),
        }
    }
}

impl fmt::Display for DetectorBreakdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (ix, row) in self.rows.iter().enumerate() {
            if ix == 0 {
                write!(f, "| {} | {} |", self.detector, row.metric)?;
            } else {
                write!(f, "| | {} |", row.metric)?;
            }
            for &value in &row.values {
                let cell = if is_count(row.metric) {
                    Cell::Count(value)
                } else {
                    Cell::Real(value)
                };
                write!(f, " {} |", cell)?;
            }
            writeln!(f, " {} |", Cell::Real(row.aggregate))?;
        }
        Ok(())
    }
}

/// A single line of run averages for a (detector, descriptor) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SummaryRow {
    pub strategy: Strategy,
    pub summary: Summary,
}

impl SummaryRow {
    pub fn new(strategy: Strategy, stats: &RunStatistics) -> Self {
        Self {
            strategy,
            summary: stats.summary(),
        }
    }
}

impl fmt::Display for SummaryRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Summary {
            matches,
            detect_time,
            describe_time,
            match_time,
            total_time,
        } = self.summary;
        writeln!(
            f,
            "| {} | {} | {} | {} | {} | {} | {} |",
            self.strategy.detector(),
            self.strategy.descriptor(),
            Cell::Real(matches),
            Cell::Real(detect_time),
            Cell::Real(describe_time),
            Cell::Real(match_time),
            Cell::Real(total_time)
        )
    }
}

/// Which tables to emit at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOptions {
    pub per_frame: bool,
    pub summary: bool,
}

/// Writes the enabled reports of a finished run.
///
/// A blank line separates the two tables when both are enabled.
pub fn write_reports(
    out: &mut impl io::Write,
    strategy: Strategy,
    stats: &RunStatistics,
    options: ReportOptions,
) -> io::Result<()> {
    if options.per_frame {
        write!(out, "{}", DetectorBreakdown::new(strategy.detector(), stats))?;
    }
    if options.per_frame && options.summary {
        writeln!(out)?;
    }
    if options.summary {
        write!(out, "{}", SummaryRow::new(strategy, stats))?;
    }
    Ok(())
}
