use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::{Datelike, NaiveDate};
use unicode_width::UnicodeWidthStr;

use crate::appointment::Appointment;
use crate::config::Config;
use crate::grid::{MonthGrid, weekday_labels};

const CELL_WIDTH: usize = 7;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.color.clone().unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    /// Prints the month grid followed by an agenda of the in-month
    /// appointments. `days` is aligned with `grid.days`.
    #[tracing::instrument(skip(self, grid, days))]
    pub fn print_month(
        &mut self,
        grid: &MonthGrid,
        days: &[(NaiveDate, &[Appointment])],
        today: NaiveDate,
    ) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        if let Some(first) = grid.first_of_month() {
            writeln!(out, "{}", first.format("%B %Y"))?;
        }

        for label in weekday_labels() {
            write!(out, "{label:>width$}", width = CELL_WIDTH)?;
        }
        writeln!(out)?;

        for (index, (day, appointments)) in days.iter().enumerate() {
            let marker = match appointments.len() {
                0 => String::new(),
                count => format!("*{count}"),
            };
            let cell = format!("{:>2} {marker:<3}", day.day());

            let painted = if !grid.is_in_month(*day) {
                self.paint(&cell, "90")
            } else if *day == today {
                self.paint(&cell, "36")
            } else {
                cell
            };
            write!(out, " {painted}")?;

            if index % 7 == 6 {
                writeln!(out)?;
            }
        }
        writeln!(out)?;

        let mut rows = Vec::new();
        for (day, appointments) in days {
            if !grid.is_in_month(*day) {
                continue;
            }
            for (position, appointment) in appointments.iter().enumerate() {
                rows.push(vec![
                    day.format("%Y-%m-%d").to_string(),
                    (position + 1).to_string(),
                    appointment.title.clone(),
                    appointment.description.clone(),
                ]);
            }
        }

        if rows.is_empty() {
            writeln!(out, "No appointments this month.")?;
            return Ok(());
        }

        let headers = vec![
            "Date".to_string(),
            "#".to_string(),
            "Title".to_string(),
            "Description".to_string(),
        ];
        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(cell.as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let padding = widths[idx].saturating_sub(UnicodeWidthStr::width(cell.as_str()));
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::write_table;

    #[test]
    fn table_pads_wide_characters_correctly() {
        let mut out = Vec::new();
        write_table(
            &mut out,
            vec!["Date".to_string(), "Title".to_string()],
            vec![
                vec!["2024-02-14".to_string(), "打网球".to_string()],
                vec!["2024-02-15".to_string(), "Meeting".to_string()],
            ],
        )
        .expect("write table");

        let text = String::from_utf8(out).expect("utf8");
        let mut lines = text.lines();
        let header = lines.next().expect("header line");
        assert!(header.starts_with("Date"));

        // "打网球" renders 6 columns wide; the column width is 7 ("Meeting").
        let wide_row = lines.nth(1).expect("first data row");
        assert!(wide_row.contains("打网球 "));
    }
}
