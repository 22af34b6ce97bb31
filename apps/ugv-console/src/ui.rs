use std::{
    collections::{HashMap, VecDeque},
    sync::mpsc::{Receiver, TryRecvError},
    time::Duration,
};

use anyhow::Result;
use chrono::{DateTime, Utc};
use crossterm::{
    event::{self, Event as CEvent, KeyCode},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Terminal,
};
use ugv_ops::StatusBoard;
use ugv_types::{
    camera::CameraId,
    events::{ConsoleEvent, EventPayload},
    telemetry::TimestampedSample,
};

const MAX_LOG_ENTRIES: usize = 120;
const RADAR_STEP: i32 = 5;

/// Rolling view of one camera slot. The terminal cannot paint pixels, so the
/// pane shows frame dimensions, count, and freshness instead.
#[derive(Default, Clone)]
struct SlotView {
    frames: u64,
    last_dims: Option<(u32, u32)>,
    last_at: Option<DateTime<Utc>>,
}

struct ConsoleState {
    slots: HashMap<CameraId, SlotView>,
    orientation: Option<TimestampedSample>,
    radar_angle: i32,
    logs: VecDeque<String>,
}

impl ConsoleState {
    fn new() -> Self {
        Self {
            slots: HashMap::new(),
            orientation: None,
            radar_angle: 90,
            logs: VecDeque::with_capacity(MAX_LOG_ENTRIES),
        }
    }

    fn push_log(&mut self, entry: String) {
        if self.logs.len() == MAX_LOG_ENTRIES {
            self.logs.pop_front();
        }
        self.logs.push_back(entry);
    }

    fn apply(&mut self, event: ConsoleEvent) {
        let timestamp = event.timestamp.format("%H:%M:%S");
        match event.payload {
            EventPayload::Frame(frame_event) => {
                let view = self.slots.entry(frame_event.camera).or_default();
                view.frames += 1;
                view.last_dims = Some((frame_event.frame.width, frame_event.frame.height));
                view.last_at = Some(event.timestamp);
            }
            EventPayload::Orientation(orientation) => {
                self.orientation = Some(orientation.sample);
            }
            EventPayload::Status(status) => {
                self.push_log(format!(
                    "[{}] camera {} is {}",
                    timestamp, status.camera, status.status
                ));
            }
            EventPayload::Lifecycle(lifecycle) => {
                self.push_log(format!(
                    "[{}] {:?}: {}",
                    timestamp,
                    lifecycle.phase,
                    lifecycle.details.unwrap_or_default()
                ));
            }
        }
    }
}

pub fn run(receiver: Receiver<ConsoleEvent>, board: StatusBoard, summary: String) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.hide_cursor()?;

    let res = run_loop(&mut terminal, receiver, board, summary.as_str());

    terminal.show_cursor()?;
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    res
}

fn run_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    receiver: Receiver<ConsoleEvent>,
    board: StatusBoard,
    summary: &str,
) -> Result<()> {
    let mut state = ConsoleState::new();

    loop {
        let mut disconnected = false;
        loop {
            match receiver.try_recv() {
                Ok(event) => state.apply(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        terminal.draw(|f| {
            let rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints(
                    [
                        Constraint::Length(3),
                        Constraint::Min(14),
                        Constraint::Length(8),
                    ]
                    .as_ref(),
                )
                .split(f.size());

            let header = Paragraph::new(Line::from(vec![
                Span::styled(
                    "UGV Console",
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::raw(summary),
                Span::raw("  "),
                Span::styled("q", Style::default().fg(Color::Yellow)),
                Span::raw(" quit, "),
                Span::styled("←/→", Style::default().fg(Color::Yellow)),
                Span::raw(" steer radar"),
            ]))
            .block(Block::default().borders(Borders::ALL).title("summary"));
            f.render_widget(header, rows[0]);

            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(50), Constraint::Percentage(50)].as_ref())
                .split(rows[1]);

            let camera_rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints(
                    [
                        Constraint::Ratio(1, 3),
                        Constraint::Ratio(1, 3),
                        Constraint::Ratio(1, 3),
                    ]
                    .as_ref(),
                )
                .split(columns[0]);

            for (area, camera) in camera_rows.iter().zip(CameraId::ALL) {
                let view = state.slots.get(&camera).cloned().unwrap_or_default();
                let pane = Paragraph::new(vec![
                    Line::from(format!("status: {}", board.get(camera))),
                    Line::from(slot_line(&view)),
                ])
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(format!("camera: {camera}")),
                );
                f.render_widget(pane, *area);
            }

            let side_rows = Layout::default()
                .direction(Direction::Vertical)
                .constraints([Constraint::Length(8), Constraint::Min(6)].as_ref())
                .split(columns[1]);

            let sensors = Paragraph::new(vec![
                Line::from(gyro_line(&state)),
                Line::from(format!("Heading: {:3}°", state.radar_angle)),
                Line::from(radar_gauge(state.radar_angle)),
                Line::from("Speed: -"),
                Line::from("Distance: -"),
            ])
            .block(Block::default().borders(Borders::ALL).title("sensors"));
            f.render_widget(sensors, side_rows[0]);

            // Visual-only pads, matching the rig's physical console. No drive
            // commands are sent anywhere.
            let pads = Paragraph::new(vec![
                Line::from("drive pad        aim pad"),
                Line::from("   ↑                ↑   "),
                Line::from(" ← ■ →            ← ■ → "),
                Line::from("   ↓                ↓   "),
            ])
            .block(Block::default().borders(Borders::ALL).title("controls"));
            f.render_widget(pads, side_rows[1]);

            let items: Vec<ListItem> = state
                .logs
                .iter()
                .rev()
                .map(|entry| ListItem::new(entry.clone()))
                .collect();
            let list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title("events"))
                .highlight_style(Style::default().fg(Color::Yellow));
            f.render_widget(list, rows[2]);
        })?;

        if disconnected {
            break;
        }

        if event::poll(Duration::from_millis(50))? {
            if let CEvent::Key(key) = event::read()? {
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break,
                    KeyCode::Left => {
                        state.radar_angle = (state.radar_angle - RADAR_STEP).max(0);
                    }
                    KeyCode::Right => {
                        state.radar_angle = (state.radar_angle + RADAR_STEP).min(180);
                    }
                    _ => {}
                }
            }
        }
    }

    Ok(())
}

fn slot_line(view: &SlotView) -> String {
    match (view.last_dims, view.last_at) {
        (Some((width, height)), Some(at)) => {
            let age_ms = (Utc::now() - at).num_milliseconds().max(0);
            format!(
                "{}x{}  {} frames  last {}ms ago",
                width, height, view.frames, age_ms
            )
        }
        _ => "no frames yet".to_string(),
    }
}

fn gyro_line(state: &ConsoleState) -> String {
    match &state.orientation {
        Some(timestamped) => format!("Gyroscope: {}", timestamped.sample.display_line()),
        None => "Gyroscope: waiting for data...".to_string(),
    }
}

/// Text needle for the steerable radar panel, 0–180° left to right.
fn radar_gauge(angle: i32) -> String {
    let slots = 180 / RADAR_STEP + 1;
    let marker = (angle / RADAR_STEP).clamp(0, slots - 1);
    (0..slots)
        .map(|slot| if slot == marker { '▲' } else { '·' })
        .collect()
}
