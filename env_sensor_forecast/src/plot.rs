//! Forecast charts. A terminal view that blocks until dismissed, and a
//! log-only view for headless runs.

use std::io;

use chrono::NaiveDateTime;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use log::info;
use ratatui::prelude::*;
use ratatui::symbols::Marker;
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType};

use crate::error::ForecastError;
use crate::model::schema::ForecastFrame;
use crate::model::TimeSeries;

const AXIS_LABEL_FORMAT: &str = "%m-%d %H:%M";

/// Plot-ready points of one forecast. The x axis is hours since the first row.
#[derive(Debug, Clone)]
pub struct ForecastChart {
    pub title: String,
    pub y_label: String,
    pub observed: Vec<(f64, f64)>,
    pub yhat: Vec<(f64, f64)>,
    pub lower: Vec<(f64, f64)>,
    pub upper: Vec<(f64, f64)>,
    pub x_bounds: [f64; 2],
    pub y_bounds: [f64; 2],
    pub x_labels: [String; 3],
}

impl ForecastChart {
    pub fn new(y_label: &str, history: &TimeSeries, forecast: &ForecastFrame) -> Self {
        let origin = forecast
            .ds
            .iter()
            .chain(history.ds.iter())
            .min()
            .copied()
            .unwrap_or_default();
        let x = |ds: &NaiveDateTime| (*ds - origin).num_seconds() as f64 / 3600.0;
        let points = |values: &[f64]| -> Vec<(f64, f64)> {
            forecast.ds.iter().zip(values).map(|(d, v)| (x(d), *v)).collect()
        };

        let observed: Vec<(f64, f64)> = history.ds.iter().zip(&history.y).map(|(d, v)| (x(d), *v)).collect();
        let yhat = points(&forecast.yhat);
        let lower = points(&forecast.yhat_lower);
        let upper = points(&forecast.yhat_upper);

        let x_max = observed.iter().chain(&yhat).map(|p| p.0).fold(0.0, f64::max);
        let (mut y_min, mut y_max) = observed
            .iter()
            .chain(&yhat)
            .chain(&lower)
            .chain(&upper)
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p.1), hi.max(p.1)));
        if !y_min.is_finite() || !y_max.is_finite() {
            y_min = 0.0;
            y_max = 1.0;
        }
        let pad = if y_max > y_min { (y_max - y_min) * 0.05 } else { 1.0 };

        let label = |hours: f64| {
            let ds = origin + chrono::Duration::seconds((hours * 3600.0) as i64);
            ds.format(AXIS_LABEL_FORMAT).to_string()
        };

        Self {
            title: format!("{} Forecast", y_label),
            y_label: y_label.to_string(),
            observed,
            yhat,
            lower,
            upper,
            x_bounds: [0.0, x_max.max(1.0)],
            y_bounds: [y_min - pad, y_max + pad],
            x_labels: [label(0.0), label(x_max / 2.0), label(x_max)],
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let datasets = vec![
            Dataset::default()
                .name("Observed")
                .marker(Marker::Dot)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(Color::White))
                .data(&self.observed),
            Dataset::default()
                .name("Forecast")
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::Cyan))
                .data(&self.yhat),
            Dataset::default()
                .name("Lower")
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::DarkGray))
                .data(&self.lower),
            Dataset::default()
                .name("Upper")
                .marker(Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(Color::DarkGray))
                .data(&self.upper),
        ];

        let [y_lo, y_hi] = self.y_bounds;
        let chart = Chart::new(datasets)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(format!(" {} (q to continue) ", self.title)),
            )
            .x_axis(
                Axis::default()
                    .title("Time")
                    .style(Style::default().fg(Color::Gray))
                    .bounds(self.x_bounds)
                    .labels(self.x_labels.iter().map(|l| Span::raw(l.clone())).collect()),
            )
            .y_axis(
                Axis::default()
                    .title(self.y_label.clone())
                    .style(Style::default().fg(Color::Gray))
                    .bounds(self.y_bounds)
                    .labels(vec![
                        Span::raw(format!("{:.1}", y_lo)),
                        Span::raw(format!("{:.1}", (y_lo + y_hi) / 2.0)),
                        Span::raw(format!("{:.1}", y_hi)),
                    ]),
            );

        frame.render_widget(chart, frame.size());
    }
}

/// Where a finished forecast is shown.
pub trait ForecastDisplay {
    /// Show the chart, returning once the viewer is done with it.
    fn show(&mut self, chart: &ForecastChart) -> Result<(), ForecastError>;
}

/// Full-screen terminal chart that blocks until a dismiss key is pressed.
#[derive(Debug, Default)]
pub struct TerminalDisplay;

impl ForecastDisplay for TerminalDisplay {
    fn show(&mut self, chart: &ForecastChart) -> Result<(), ForecastError> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

        let result = wait_for_dismiss(&mut terminal, chart);

        // restore the terminal before reporting a draw error
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result.map_err(ForecastError::from)
    }
}

fn wait_for_dismiss<B: Backend>(terminal: &mut Terminal<B>, chart: &ForecastChart) -> io::Result<()> {
    loop {
        terminal.draw(|frame| chart.render(frame))?;
        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && is_dismiss(&key) {
                return Ok(());
            }
        }
    }
}

pub fn is_dismiss(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        KeyCode::Char('q') | KeyCode::Esc | KeyCode::Enter => true,
        _ => false,
    }
}

/// Logs a one-line summary instead of drawing.
#[derive(Debug, Default)]
pub struct LogDisplay;

impl ForecastDisplay for LogDisplay {
    fn show(&mut self, chart: &ForecastChart) -> Result<(), ForecastError> {
        match (chart.yhat.last(), chart.lower.last(), chart.upper.last()) {
            (Some(yhat), Some(lower), Some(upper)) => info!(
                "{}: {} observed, {} forecast rows, last forecast {:.2} [{:.2}, {:.2}] at {}",
                chart.title,
                chart.observed.len(),
                chart.yhat.len(),
                yhat.1,
                lower.1,
                upper.1,
                chart.x_labels[2]
            ),
            _ => info!("{}: empty forecast", chart.title),
        }
        Ok(())
    }
}
