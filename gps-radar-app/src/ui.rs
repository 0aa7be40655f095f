use std::{sync::Arc, time::Duration};

use anyhow::Context;
use gps_radar_logic::{LocationProvider, Radar, RadarView, StateUpdateSender, ToggleAction};
use log::{debug, error};
use ratatui::{
    DefaultTerminal, Frame,
    crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        Block, Paragraph,
        canvas::{Canvas, Circle, Line as CanvasLine},
    },
};
use tokio::sync::mpsc;

use crate::Result;

/// Redraw rate while something on screen is animating
const FRAME_INTERVAL: Duration = Duration::from_millis(100);
const INPUT_POLL: Duration = Duration::from_millis(100);

/// Width of the sweep wedge in degrees
const SWEEP_WIDTH: f32 = 45.0;
const SWEEP_LINES: u16 = 12;
const RADAR_RADIUS: f64 = 0.95;

/// Wakes the UI loop whenever the radar's state changes. A redraw that's already pending covers
/// any further updates, so extra notifications are dropped.
pub struct TerminalUpdateSender(mpsc::Sender<()>);

impl TerminalUpdateSender {
    pub fn new(tx: mpsc::Sender<()>) -> Self {
        Self(tx)
    }
}

impl StateUpdateSender for TerminalUpdateSender {
    fn send_update(&self) {
        self.0.try_send(()).ok();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Toggle,
    Quit,
}

fn map_key(code: KeyCode, modifiers: KeyModifiers) -> Option<Input> {
    match code {
        KeyCode::Char(' ') | KeyCode::Enter => Some(Input::Toggle),
        KeyCode::Char('q') | KeyCode::Esc => Some(Input::Quit),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Some(Input::Quit),
        _ => None,
    }
}

/// Terminal input is blocking, read it on its own thread and forward what we care about
fn spawn_input_reader(tx: mpsc::Sender<Input>) {
    tokio::task::spawn_blocking(move || {
        while !tx.is_closed() {
            match event::poll(INPUT_POLL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(why) => {
                    error!("Failed to poll terminal input: {why:?}");
                    break;
                }
            }

            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                    if let Some(input) = map_key(key.code, key.modifiers) {
                        if tx.blocking_send(input).is_err() {
                            break;
                        }
                    }
                }
                Ok(_) => {}
                Err(why) => {
                    error!("Failed to read terminal input: {why:?}");
                    break;
                }
            }
        }
    });
}

/// Take over the terminal and run the screen until the user quits
pub async fn run<P: LocationProvider>(
    radar: Arc<Radar<P, TerminalUpdateSender>>,
    updates: mpsc::Receiver<()>,
) -> Result {
    let mut terminal = ratatui::init();
    let res = event_loop(&mut terminal, &radar, updates).await;
    ratatui::restore();
    res
}

async fn event_loop<P: LocationProvider>(
    terminal: &mut DefaultTerminal,
    radar: &Radar<P, TerminalUpdateSender>,
    mut updates: mpsc::Receiver<()>,
) -> Result {
    let (input_tx, mut inputs) = mpsc::channel(8);
    spawn_input_reader(input_tx);

    let mut frames = tokio::time::interval(FRAME_INTERVAL);
    let mut view = radar.view().await;
    terminal
        .draw(|frame| draw(frame, &view))
        .context("Failed to draw to the terminal")?;

    loop {
        tokio::select! {
            input = inputs.recv() => {
                match input {
                    Some(Input::Toggle) => {
                        debug!("Toggle pressed ({:?})", view.button.action);
                        match view.button.action {
                            ToggleAction::StartTracking => radar.start_tracking().await,
                            ToggleAction::StopTracking => radar.stop_tracking().await,
                        }
                    }
                    Some(Input::Quit) | None => break,
                }
            }
            Some(()) = updates.recv() => {}
            _ = frames.tick() => {
                let animating = view.radar.sweep_angle.is_some() || view.advisory.is_some();
                if !animating {
                    continue;
                }
            }
        }

        view = radar.view().await;
        terminal
            .draw(|frame| draw(frame, &view))
            .context("Failed to draw to the terminal")?;
    }

    Ok(())
}

fn draw(frame: &mut Frame, view: &RadarView) {
    let details_height = view
        .details
        .as_ref()
        .map_or(0, |details| details.rows.len() as u16 + 2);

    let [status_area, radar_area, details_area, button_area, hint_area] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(9),
        Constraint::Length(details_height),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_status(frame, view, status_area);
    draw_radar(frame, view, radar_area);
    draw_details(frame, view, details_area);
    draw_button(frame, view, button_area);
    draw_hint(frame, view, hint_area);
}

fn draw_status(frame: &mut Frame, view: &RadarView, area: Rect) {
    let badge_style = if view.status.active {
        Style::new().black().on_green()
    } else {
        Style::new().white().on_red()
    };

    let line = Line::from(vec![
        Span::styled(view.status.title, Style::new().bold()),
        Span::raw("  "),
        Span::styled(format!(" {} ", view.status.badge), badge_style),
    ]);

    frame.render_widget(Paragraph::new(line).block(Block::bordered()), area);
}

fn draw_radar(frame: &mut Frame, view: &RadarView, area: Rect) {
    // Terminal cells are about twice as tall as they are wide, widen the x range to stay round
    let aspect = f64::from(area.width.max(1)) / (f64::from(area.height.max(1)) * 2.0);
    let rings = view.radar.rings;
    let sweep = view.radar.sweep_angle;

    let canvas = Canvas::default()
        .block(Block::bordered().title("Radar"))
        .marker(Marker::Braille)
        .x_bounds([-aspect, aspect])
        .y_bounds([-1.0, 1.0])
        .paint(move |ctx| {
            ctx.draw(&Circle {
                x: 0.0,
                y: 0.0,
                radius: RADAR_RADIUS,
                color: Color::Green,
            });

            for ring in 1..=rings {
                let scale = 1.0 - f64::from(ring) / f64::from(rings + 1);
                ctx.draw(&Circle {
                    x: 0.0,
                    y: 0.0,
                    radius: RADAR_RADIUS * scale,
                    color: Color::DarkGray,
                });
            }

            if let Some(angle) = sweep {
                for i in 0..=SWEEP_LINES {
                    let degrees = angle + SWEEP_WIDTH * f32::from(i) / f32::from(SWEEP_LINES);
                    let rad = f64::from(degrees).to_radians();
                    // Angles grow clockwise from three o'clock
                    ctx.draw(&CanvasLine {
                        x1: 0.0,
                        y1: 0.0,
                        x2: RADAR_RADIUS * rad.cos(),
                        y2: -RADAR_RADIUS * rad.sin(),
                        color: if i == 0 { Color::LightGreen } else { Color::Green },
                    });
                }
            }

            ctx.print(0.0, 0.0, "●".green());
        });

    frame.render_widget(canvas, area);
}

fn draw_details(frame: &mut Frame, view: &RadarView, area: Rect) {
    let Some(details) = &view.details else {
        return;
    };

    let lines = details
        .rows
        .iter()
        .map(|row| {
            Line::from(vec![
                Span::raw(format!("{:<12}", row.label)),
                Span::styled(row.value.clone(), Style::new().add_modifier(Modifier::BOLD)),
            ])
        })
        .collect::<Vec<_>>();

    frame.render_widget(
        Paragraph::new(lines).block(Block::bordered().title(details.title)),
        area,
    );
}

fn draw_button(frame: &mut Frame, view: &RadarView, area: Rect) {
    let (symbol, style) = match view.button.action {
        ToggleAction::StartTracking => ("▶", Style::new().black().on_green()),
        ToggleAction::StopTracking => ("✕", Style::new().white().on_red()),
    };

    let button = Paragraph::new(format!("{symbol} {}", view.button.label))
        .alignment(Alignment::Center)
        .style(style.bold())
        .block(Block::bordered());

    frame.render_widget(button, area);
}

fn draw_hint(frame: &mut Frame, view: &RadarView, area: Rect) {
    let line = if let Some(advisory) = view.advisory {
        Line::from(advisory.yellow().bold())
    } else {
        Line::from("space/enter: toggle tracking   q: quit".dark_gray())
    };

    frame.render_widget(Paragraph::new(line), area);
}
