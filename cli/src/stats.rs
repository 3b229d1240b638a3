use std::{io, time::Duration};

use anyhow::Result;
use chrono::{Datelike, Month};
use covidstats_core::service::report::{format_decimal, format_percent, group_thousands, INSUFFICIENT_DATA};
use covidstats_core::time::ordinal_day;
use covidstats_core::{MonthlyCollectionSet, RecordCollection, ReportConfig};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::*,
    widgets::{Bar, BarChart, BarGroup, Block, BorderType, Borders, Gauge, Padding, Paragraph},
};
use tracing::debug;

// --- THEME ---
struct Theme {
    primary: Color,
    muted: Color,
    text: Color,
    positive: Color,
    hospital: Color,
    calm: Color,
}

const THEME: Theme = Theme {
    primary: Color::Cyan,
    muted: Color::DarkGray,
    text: Color::White,
    positive: Color::Red,
    hospital: Color::Yellow,
    calm: Color::Green,
};

pub struct StatsApp {
    pub region: String,
    pub year: i32,
    pub months: Vec<(Month, RecordCollection)>,
    pub current_month_index: usize,
}

impl StatsApp {
    /// Keeps only months with data; starts on the latest one.
    pub fn new(region: String, monthly: &MonthlyCollectionSet) -> Self {
        let months: Vec<(Month, RecordCollection)> = monthly
            .iter()
            .filter(|(_, data)| !data.is_empty())
            .map(|(month, data)| (month, data.clone()))
            .collect();
        let current_month_index = months.len().saturating_sub(1);
        Self {
            region,
            year: monthly.year(),
            months,
            current_month_index,
        }
    }

    pub fn next_month(&mut self) {
        if self.current_month_index + 1 < self.months.len() {
            self.current_month_index += 1;
        }
    }

    pub fn previous_month(&mut self) {
        if self.current_month_index > 0 {
            self.current_month_index -= 1;
        }
    }

    pub fn current_data(&self) -> Option<&(Month, RecordCollection)> {
        self.months.get(self.current_month_index)
    }
}

pub fn run(working: &RecordCollection, config: &ReportConfig) -> Result<()> {
    let records = working.for_region(&config.region);
    let monthly = match MonthlyCollectionSet::partition(&records) {
        Ok(monthly) => monthly,
        Err(e) => {
            println!("No statistics for {}: {}", config.region, e);
            return Ok(());
        }
    };

    let mut app = StatsApp::new(config.region.clone(), &monthly);
    debug!(months = app.months.len(), "opening month browser");

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    loop {
        terminal.draw(|f| ui(f, &app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        KeyCode::Left | KeyCode::Char('h') => app.previous_month(),
                        KeyCode::Right | KeyCode::Char('l') => app.next_month(),
                        _ => {}
                    }
                }
            }
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    Ok(())
}

fn ui(frame: &mut Frame, app: &StatsApp) {
    let size = frame.area();

    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(10),   // Chart + sidebar
            Constraint::Length(1), // Footer
        ])
        .split(size);

    let Some((month, data)) = app.current_data() else {
        frame.render_widget(
            Paragraph::new("No data available").alignment(Alignment::Center),
            main_layout[1],
        );
        return;
    };

    // --- Header ---
    let header_block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(Style::default().fg(THEME.muted));

    let header_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(24),
            Constraint::Min(1),
            Constraint::Length(30),
        ])
        .split(main_layout[0]);

    let app_title = Paragraph::new(Span::styled(
        format!("COVIDSTATS {}", app.region),
        Style::default().fg(THEME.primary).add_modifier(Modifier::BOLD),
    ))
    .block(Block::default().padding(Padding::new(0, 0, 1, 0)));
    frame.render_widget(app_title, header_layout[0]);

    let title = format!(" {} {} ", month.name(), app.year);
    let has_previous = app.current_month_index > 0;
    let has_next = app.current_month_index + 1 < app.months.len();
    let nav_text = Line::from(vec![
        Span::styled(" < ", Style::default().fg(if has_previous { THEME.text } else { THEME.muted })),
        Span::styled(title, Style::default().fg(THEME.text).add_modifier(Modifier::BOLD)),
        Span::styled(" > ", Style::default().fg(if has_next { THEME.text } else { THEME.muted })),
    ]);
    let nav = Paragraph::new(nav_text)
        .alignment(Alignment::Right)
        .block(Block::default().padding(Padding::new(0, 0, 1, 0)));
    frame.render_widget(nav, header_layout[2]);

    frame.render_widget(header_block, main_layout[0]);

    // --- Main content ---
    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(70),
            Constraint::Length(1),
            Constraint::Percentage(30),
        ])
        .split(main_layout[1]);

    draw_chart(frame, data, content_chunks[0]);
    draw_info_panel(frame, data, content_chunks[2]);

    // --- Footer ---
    let help = Line::from(vec![
        Span::styled("NAV: ", Style::default().fg(THEME.muted)),
        Span::styled("←/→ ", Style::default().fg(THEME.text)),
        Span::raw("  "),
        Span::styled("QUIT: ", Style::default().fg(THEME.muted)),
        Span::styled("q", Style::default().fg(THEME.text)),
    ]);
    let footer = Paragraph::new(help)
        .alignment(Alignment::Center)
        .style(Style::default().fg(THEME.muted));
    frame.render_widget(footer, main_layout[2]);
}

fn draw_chart(frame: &mut Frame, data: &RecordCollection, area: Rect) {
    let bar_data: Vec<(String, u64)> = data
        .iter()
        .map(|r| (r.date().day().to_string(), u64::from(r.positive_increase())))
        .collect();

    let bar_items: Vec<Bar> = bar_data
        .iter()
        .map(|(label, value)| {
            Bar::default()
                .label(label.as_str())
                .value(*value)
                .style(Style::default().fg(THEME.positive))
                .text_value(String::new())
        })
        .collect();

    let chart_block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(THEME.muted))
        .title(" Daily Positive Cases ");

    let chart = BarChart::default()
        .block(chart_block)
        .bar_width(3)
        .bar_gap(1)
        .data(BarGroup::default().bars(&bar_items));

    frame.render_widget(chart, area);
}

fn draw_info_panel(frame: &mut Frame, data: &RecordCollection, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(12), // Overview
            Constraint::Min(1),     // Positivity gauge
        ])
        .split(area);

    let peak = data
        .highest_positive_day()
        .map(|r| {
            format!(
                "{} ({})",
                group_thousands(r.positive_increase().into()),
                ordinal_day(r.date().day())
            )
        })
        .unwrap_or_else(|_| INSUFFICIENT_DATA.to_string());
    let average = data
        .average_positive_cases_since_first_positive()
        .map(format_decimal)
        .unwrap_or_else(|_| INSUFFICIENT_DATA.to_string());
    let hospitalized = data
        .average_current_hospitalized()
        .map(format_decimal)
        .unwrap_or_else(|_| INSUFFICIENT_DATA.to_string());
    let total: u64 = data.iter().map(|r| u64::from(r.positive_increase())).sum();
    let deaths: u64 = data.iter().map(|r| u64::from(r.death_increase())).sum();

    let row = |label: &'static str, value: String, color: Color| {
        Line::from(vec![
            Span::styled(label, Style::default().fg(THEME.muted)),
            Span::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD)),
        ])
    };

    let info_text = vec![
        Line::from(vec![Span::styled("Overview", Style::default().add_modifier(Modifier::BOLD))]),
        Line::from(""),
        row("Days:      ", data.len().to_string(), THEME.text),
        row("Positive:  ", group_thousands(total), THEME.positive),
        row("Peak:      ", peak, THEME.positive),
        row("Avg/day:   ", average, THEME.text),
        row("Hosp. now: ", hospitalized, THEME.hospital),
        row("Deaths:    ", group_thousands(deaths), THEME.text),
    ];

    let info_block = Paragraph::new(info_text).block(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(THEME.muted))
            .title(" Summary "),
    );
    frame.render_widget(info_block, chunks[0]);

    let (ratio, label) = match data.overall_positivity_rate() {
        Ok(rate) => (rate, format!("{} positive", format_percent(rate))),
        Err(_) => (0.0, INSUFFICIENT_DATA.to_string()),
    };
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(" Positivity ")
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(THEME.muted)),
        )
        .gauge_style(Style::default().fg(if ratio > 0.1 { THEME.positive } else { THEME.calm }))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(label);

    frame.render_widget(gauge, chunks[1]);
}
