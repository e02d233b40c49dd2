// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 Ankit Kumar Pandey

//! TUI monitor using ratatui.
//!
//! Polls one region's header and payload every tick and shows how often
//! writers update it.

use std::collections::VecDeque;
use std::io::stdout;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
};
use shmlink_core::{HeaderSnapshot, Region, Timestamp};

/// Refresh period.
const TICK: Duration = Duration::from_millis(100);

/// Payload bytes shown in the hex view.
const PREVIEW_BYTES: usize = 256;

/// Update intervals kept for the activity summary.
const HISTORY: usize = 120;

/// Monitor state.
struct App {
    region: Region,
    /// Whether to quit the application.
    should_quit: bool,
    /// Latest header read from the region.
    snapshot: Option<HeaderSnapshot>,
    /// Leading payload bytes.
    preview: Vec<u8>,
    /// Writer updates observed since start.
    updates: u64,
    /// Milliseconds between observed updates.
    intervals: VecDeque<u64>,
    /// Last failure, shown in the footer.
    error: Option<String>,
}

impl App {
    fn new(region: Region) -> Self {
        Self {
            region,
            should_quit: false,
            snapshot: None,
            preview: Vec::new(),
            updates: 0,
            intervals: VecDeque::with_capacity(HISTORY),
            error: None,
        }
    }

    fn refresh(&mut self) {
        let result = self.region.delta_check().and_then(|delta| {
            let snapshot = self.region.snapshot()?;
            let payload = self.region.read_payload()?;
            Ok((delta, snapshot, payload))
        });

        match result {
            Ok((delta, snapshot, mut payload)) => {
                if delta > 0.0 && self.snapshot.is_some() {
                    self.updates += 1;
                    if self.intervals.len() == HISTORY {
                        self.intervals.pop_front();
                    }
                    self.intervals.push_back((delta * 1000.0) as u64);
                }
                payload.truncate(PREVIEW_BYTES);
                self.preview = payload;
                self.snapshot = Some(snapshot);
                self.error = None;
            }
            Err(e) => self.error = Some(e.to_string()),
        }
    }

    fn toggle_lam(&mut self) {
        let result = self
            .region
            .get_lam()
            .and_then(|lam| self.region.set_lam(!lam));
        if let Err(e) = result {
            self.error = Some(e.to_string());
        }
    }
}

/// Run the monitor until 'q' or Esc.
pub async fn run_monitor(region: Region) -> Result<(), Box<dyn std::error::Error>> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;

    let result = event_loop(App::new(region));

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn event_loop(mut app: App) -> Result<(), Box<dyn std::error::Error>> {
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    loop {
        app.refresh();
        terminal.draw(|frame| render(frame, &app))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
                        KeyCode::Char('l') => app.toggle_lam(),
                        _ => {}
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn render(frame: &mut Frame, app: &App) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(10),   // Main content
            Constraint::Length(3), // Footer
        ])
        .split(frame.area());

    let title = Paragraph::new(format!(
        " SHMLINK MONITOR: {} ({}) ",
        app.region.name(),
        app.region.backend()
    ))
    .style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );
    frame.render_widget(title, main_layout[0]);

    let content_layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(main_layout[1]);

    let left_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(10), Constraint::Min(5)])
        .split(content_layout[0]);

    frame.render_widget(header_table(app), left_layout[0]);

    frame.render_widget(activity(app), left_layout[1]);

    let hex_lines: Vec<Line> = if app.preview.is_empty() {
        vec![Line::styled(
            "(header-only region)",
            Style::default().fg(Color::DarkGray),
        )]
    } else {
        app.preview
            .chunks(16)
            .enumerate()
            .map(|(row, chunk)| {
                Line::from(vec![
                    Span::styled(
                        format!("{:04x}  ", row * 16),
                        Style::default().fg(Color::DarkGray),
                    ),
                    Span::raw(
                        chunk
                            .iter()
                            .map(|b| format!("{:02x}", b))
                            .collect::<Vec<_>>()
                            .join(" "),
                    ),
                ])
            })
            .collect()
    };
    let payload_title = if app.region.payload_len() > PREVIEW_BYTES {
        format!(
            " Payload (first {} of {} bytes) ",
            PREVIEW_BYTES,
            app.region.payload_len()
        )
    } else {
        format!(" Payload ({} bytes) ", app.region.payload_len())
    };
    let payload = Paragraph::new(hex_lines).block(
        Block::default()
            .title(payload_title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)),
    );
    frame.render_widget(payload, content_layout[1]);

    let footer_text = match &app.error {
        Some(e) => Line::styled(format!(" {} ", e), Style::default().fg(Color::Red)),
        None => Line::styled(
            " Press 'l' to toggle LAM, 'q' to quit ",
            Style::default().fg(Color::DarkGray),
        ),
    };
    let footer = Paragraph::new(footer_text)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, main_layout[2]);
}

fn header_table(app: &App) -> Table<'static> {
    let header = Row::new(vec![Cell::from("Field"), Cell::from("Value")]).style(
        Style::default()
            .add_modifier(Modifier::BOLD)
            .fg(Color::Yellow),
    );

    let rows: Vec<Row> = match &app.snapshot {
        Some(snap) => {
            let age = if snap.last_update.is_unset() {
                "never".to_string()
            } else {
                format!("{:.3}s", Timestamp::now().seconds_since(snap.last_update))
            };
            let lam = if snap.notify {
                Cell::from("SET").style(Style::default().fg(Color::Cyan))
            } else {
                Cell::from("clear").style(Style::default().fg(Color::DarkGray))
            };
            vec![
                Row::new(vec![Cell::from("Length"), Cell::from(snap.length.to_string())]),
                Row::new(vec![
                    Cell::from("Last update"),
                    Cell::from(snap.last_update.to_string()),
                ]),
                Row::new(vec![Cell::from("Age"), Cell::from(age)]),
                Row::new(vec![Cell::from("Scalar"), Cell::from(snap.scalar.to_string())]),
                Row::new(vec![Cell::from("LAM"), lam]),
                Row::new(vec![Cell::from("Handle"), Cell::from(app.region.state().to_string())]),
            ]
        }
        None => vec![Row::new(vec![Cell::from("Waiting for region..."), Cell::from("-")])
            .style(Style::default().fg(Color::DarkGray))],
    };

    Table::new(rows, [Constraint::Percentage(40), Constraint::Percentage(60)])
        .header(header)
        .block(
            Block::default()
                .title(" Header ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Green)),
        )
}

fn activity(app: &App) -> Paragraph<'static> {
    let last = app.intervals.back().copied();
    let (min, max, sum) = app
        .intervals
        .iter()
        .fold((u64::MAX, 0u64, 0u64), |(min, max, sum), &ms| {
            (min.min(ms), max.max(ms), sum + ms)
        });

    let value = |v: Option<u64>| match v {
        Some(ms) => Span::styled(
            format!("{} ms", ms),
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        None => Span::styled("--", Style::default().fg(Color::DarkGray)),
    };
    let has_samples = !app.intervals.is_empty();

    let lines = vec![
        Line::from(vec![
            Span::raw("Updates seen:  "),
            Span::styled(
                app.updates.to_string(),
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![Span::raw("Last interval: "), value(last)]),
        Line::from(vec![
            Span::raw("Mean interval: "),
            value(has_samples.then(|| sum / app.intervals.len() as u64)),
        ]),
        Line::from(vec![
            Span::raw("Min / Max:     "),
            value(has_samples.then_some(min)),
            Span::raw(" / "),
            value(has_samples.then_some(max)),
        ]),
    ];

    Paragraph::new(lines).block(
        Block::default()
            .title(" Writer Activity ")
            .borders(Borders::ALL),
    )
}
