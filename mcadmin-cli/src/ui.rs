//! Console rendering for stats tables and banners

use crossterm::style::{StyledContent, Stylize};
use crossterm::tty::IsTty;
use mcadmin_common::report::round;
use mcadmin_common::{MetricRecord, ServerReport};
use std::fmt::Display;
use std::time::Duration;

const HEADERS: [&str; 2] = ["Name", "Value"];

/// Renders console output, with ANSI styling only when writing to a terminal
#[derive(Debug, Clone, Copy)]
pub struct Console {
    styled: bool,
}

impl Console {
    pub const fn new(styled: bool) -> Self {
        Self { styled }
    }

    /// Styled when `stream` is a terminal
    pub fn detect(stream: &impl IsTty) -> Self {
        Self::new(stream.is_tty())
    }

    fn paint<D: Display>(&self, text: D, style: impl FnOnce(D) -> StyledContent<D>) -> String {
        if self.styled {
            style(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Section title with an underline, one per server
    pub fn section(&self, title: &str) -> String {
        let underline = "-".repeat(title.chars().count());
        format!(
            "\n{}\n{}\n",
            self.paint(title, Stylize::yellow),
            self.paint(underline.as_str(), Stylize::yellow)
        )
    }

    /// Render a server's metrics as a two-column table
    pub fn render_table(&self, server: &ServerReport) -> String {
        let rows: Vec<(&str, String)> = server
            .metrics
            .iter()
            .map(|metric| (metric.name, format_value(metric)))
            .collect();

        let name_width = rows
            .iter()
            .map(|(name, _)| name.chars().count())
            .chain([HEADERS[0].len()])
            .max()
            .unwrap_or(0);
        let value_width = rows
            .iter()
            .map(|(_, value)| value.chars().count())
            .chain([HEADERS[1].len()])
            .max()
            .unwrap_or(0);

        let border = format!(
            "+{}+{}+\n",
            "-".repeat(name_width + 2),
            "-".repeat(value_width + 2)
        );

        let mut table = String::new();
        table.push_str(&border);
        table.push_str(&format!(
            "| {} | {} |\n",
            self.paint(format!("{:<name_width$}", HEADERS[0]), Stylize::green),
            self.paint(format!("{:<value_width$}", HEADERS[1]), Stylize::green),
        ));
        table.push_str(&border);
        for (name, value) in &rows {
            table.push_str(&format!(
                "| {} | {} |\n",
                self.paint(format!("{:<name_width$}", name), Stylize::green),
                self.paint(format!("{:<value_width$}", value), Stylize::bold),
            ));
        }
        table.push_str(&border);
        table
    }

    pub fn success_banner(&self, message: &str) -> String {
        self.paint(format!("[✓] {}", message), |text| text.green().bold())
    }

    pub fn error_line(&self, message: &str) -> String {
        self.paint(format!("[!] The command failed, {}", message), Stylize::red)
    }

    pub fn footer(&self, elapsed: Duration) -> String {
        self.paint(
            format!("Command completed in {} ms", elapsed.as_millis()),
            Stylize::dark_grey,
        )
    }
}

/// Value rounded to 4 places, suffixed with the unit symbol unless it is a plain count
pub fn format_value(metric: &MetricRecord) -> String {
    let value = format_number(round(metric.value, 4));
    match metric.unit.symbol() {
        Some(symbol) => format!("{} {}", value, symbol),
        None => value,
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
