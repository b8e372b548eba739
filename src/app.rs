//! Face application
//!
//! Wires config, store, gateway client, weather sampler, pointer tracker
//! and render pipeline into the cooperative frame loop. Three async
//! sources feed the loop: the frame tick, terminal input events, and the
//! gateway's presence transitions; the weather task refreshes its watch
//! channel on its own slow cadence. Nothing here blocks a frame.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use crossterm::event::{Event, EventStream, KeyCode, KeyEventKind, KeyModifiers, MouseEventKind};
use futures::StreamExt;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::FaceConfig;
use crate::errors::Result;
use crate::gateway::{GatewayClient, GatewaySettings, PresenceSnapshot, PresenceState};
use crate::mood::{Mood, MoodEngine, Sentiment};
use crate::pointer::PointerTracker;
use crate::render::{Color, FrameInput, RenderPipeline};
use crate::store::{FileStore, KvStore, MemoryStore};
use crate::term::{self, CanvasWidget};
use crate::weather::{
    Coordinates, FixedLocation, LocationProvider, NoLocation, WeatherSample, WeatherSampler,
    CACHE_DURATION_MS,
};

/// Target frame cadence (~30 fps; the terminal is the bottleneck anyway)
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// The assembled face application
pub struct FaceApp {
    config: FaceConfig,
    gateway: GatewaySettings,
    location: Option<Coordinates>,
    seed: Option<u64>,
}

impl FaceApp {
    pub fn new(
        config: FaceConfig,
        gateway: GatewaySettings,
        location: Option<Coordinates>,
        seed: Option<u64>,
    ) -> Self {
        Self {
            config,
            gateway,
            location,
            seed,
        }
    }

    fn open_store(&self) -> Arc<dyn KvStore> {
        match FaceConfig::data_dir().and_then(|dir| FileStore::new(dir).ok()) {
            Some(store) => Arc::new(store),
            None => {
                warn!("No data directory available; preferences will not persist");
                Arc::new(MemoryStore::new())
            }
        }
    }

    /// Run until the user quits. Terminal state, tasks and the transport
    /// are all torn down on every exit path, including errors.
    pub async fn run(self) -> Result<()> {
        let store = self.open_store();
        let mood = MoodEngine::new(store.clone());

        let (client, transitions) = GatewayClient::spawn(self.gateway.clone());

        let (weather_tx, weather_rx) = watch::channel(None::<WeatherSample>);
        let weather_task = if self.config.face.weather {
            let location: Arc<dyn LocationProvider> = match self.location {
                Some(coords) => Arc::new(FixedLocation(coords)),
                None => Arc::new(NoLocation),
            };
            let sampler = WeatherSampler::new(location, store.clone())?;
            Some(tokio::spawn(weather_loop(sampler, weather_tx)))
        } else {
            None
        };

        let mut terminal = term::init()?;
        let result = self
            .frame_loop(&mut terminal, &client, transitions, mood, weather_rx)
            .await;

        // Scoped teardown, also when the loop failed
        if let Err(e) = term::restore() {
            warn!("Terminal restore failed: {}", e);
        }
        if let Some(task) = weather_task {
            task.abort();
        }
        client.shutdown().await;
        result
    }

    async fn frame_loop(
        &self,
        terminal: &mut term::Tui,
        client: &GatewayClient,
        mut transitions: tokio::sync::mpsc::UnboundedReceiver<crate::gateway::Transition>,
        mood: MoodEngine,
        weather_rx: watch::Receiver<Option<WeatherSample>>,
    ) -> Result<()> {
        let mut pipeline = RenderPipeline::new(&self.config.theme, &self.config.face, self.seed)?;
        let background = Color::from_hex_str(&self.config.theme.background)?;

        let mut tracker = PointerTracker::new();
        let mut events = EventStream::new();
        let mut interval = tokio::time::interval(FRAME_INTERVAL);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let started = Instant::now();
        let mut snapshot_rx = client.subscribe();
        let mut mood_value = mood.mood();
        let mut input_buffer = String::new();
        let mut face_area = Rect::default();

        info!("Face loop starting");
        loop {
            tokio::select! {
                _ = interval.tick() => {
                    tracker.tick();
                    let snapshot = snapshot_rx.borrow().clone();
                    let input = FrameInput {
                        t_ms: started.elapsed().as_secs_f64() * 1000.0,
                        state: snapshot.state,
                        mood: mood_value,
                        eye_offset: if self.config.face.eye_tracking {
                            tracker.eye_offset(self.config.face.max_eye_offset)
                        } else {
                            (0.0, 0.0)
                        },
                        weather: weather_rx.borrow().clone(),
                    };
                    face_area = self.draw(terminal, &mut pipeline, &input, &snapshot, background, &input_buffer)?;
                }

                Some(transition) = transitions.recv() => {
                    mood_value = mood.note_transition(transition.to, now_ms());
                }

                maybe_event = events.next() => {
                    match maybe_event {
                        Some(Ok(event)) => {
                            if self.handle_event(
                                event,
                                client,
                                &mood,
                                &mut mood_value,
                                &mut tracker,
                                &mut input_buffer,
                                face_area,
                            ) {
                                break;
                            }
                        }
                        Some(Err(e)) => {
                            warn!("Input stream error: {}", e);
                        }
                        None => break,
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns true when the app should quit
    fn handle_event(
        &self,
        event: Event,
        client: &GatewayClient,
        mood: &MoodEngine,
        mood_value: &mut Mood,
        tracker: &mut PointerTracker,
        input_buffer: &mut String,
        face_area: Rect,
    ) -> bool {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                KeyCode::Esc => return true,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return true
                }
                KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    client.reconnect();
                }
                KeyCode::Enter => {
                    let content = input_buffer.trim().to_string();
                    if !content.is_empty() {
                        client.send(content);
                    }
                    input_buffer.clear();
                }
                KeyCode::Backspace => {
                    input_buffer.pop();
                }
                // Manual mood nudges on function keys so typing stays
                // unaffected
                KeyCode::F(n @ (1 | 2 | 3)) => {
                    let sentiment = match n {
                        1 => Sentiment::Positive,
                        2 => Sentiment::Negative,
                        _ => Sentiment::Neutral,
                    };
                    if let Ok(updated) = mood.record_manual(sentiment, now_ms()) {
                        *mood_value = updated;
                    }
                }
                KeyCode::Char(c) => {
                    input_buffer.push(c);
                }
                _ => {}
            },
            Event::Mouse(mouse) if self.config.face.eye_tracking => match mouse.kind {
                MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                    if face_area.width > 0 && face_area.height > 0 {
                        // Cells are one pixel wide and two pixels tall
                        let x = f64::from(mouse.column.saturating_sub(face_area.x));
                        let y = f64::from(mouse.row.saturating_sub(face_area.y)) * 2.0;
                        tracker.observe(
                            x,
                            y,
                            f64::from(face_area.width),
                            f64::from(face_area.height) * 2.0,
                        );
                    }
                }
                _ => {}
            },
            Event::FocusLost => tracker.leave(),
            _ => {}
        }
        false
    }

    fn draw(
        &self,
        terminal: &mut term::Tui,
        pipeline: &mut RenderPipeline,
        input: &FrameInput,
        snapshot: &PresenceSnapshot,
        background: Color,
        input_buffer: &str,
    ) -> Result<Rect> {
        let show_status = self.config.face.show_status;
        let show_bubble = self.config.face.show_bubble && !snapshot.response.is_empty();
        let mut face_area = Rect::default();

        terminal.draw(|frame| {
            let mut constraints = Vec::new();
            if show_status {
                constraints.push(Constraint::Length(1));
            }
            constraints.push(Constraint::Min(4));
            if show_bubble {
                constraints.push(Constraint::Length(4));
            }
            constraints.push(Constraint::Length(1));

            let chunks = Layout::vertical(constraints).split(frame.area());
            let mut idx = 0;

            if show_status {
                frame.render_widget(status_line(&self.config, snapshot, input.mood), chunks[idx]);
                idx += 1;
            }

            face_area = chunks[idx];
            let canvas = pipeline.render(
                input,
                u32::from(face_area.width),
                u32::from(face_area.height) * 2,
            );
            frame.render_widget(CanvasWidget::new(canvas, background), face_area);
            idx += 1;

            if show_bubble {
                let bubble = Paragraph::new(snapshot.response.clone())
                    .wrap(Wrap { trim: true })
                    .block(Block::default().borders(Borders::TOP));
                frame.render_widget(bubble, chunks[idx]);
                idx += 1;
            }

            let prompt = Paragraph::new(Line::from(vec![
                Span::styled("> ", Style::default().add_modifier(Modifier::DIM)),
                Span::raw(input_buffer),
            ]));
            frame.render_widget(prompt, chunks[idx]);
        })?;

        Ok(face_area)
    }
}

/// One status line: identity, presence state, gateway message, mood
fn status_line(config: &FaceConfig, snapshot: &PresenceSnapshot, mood: Mood) -> Paragraph<'static> {
    let (label, style) = state_badge(snapshot.state);
    let mut spans = vec![
        Span::styled(
            config.identity.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(label, style),
    ];
    if !snapshot.status.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            snapshot.status.clone(),
            Style::default().add_modifier(Modifier::DIM),
        ));
    }
    spans.push(Span::raw("  "));
    spans.push(Span::raw(match mood {
        Mood::Happy => "(^-^)",
        Mood::Angry => "(>_<)",
        Mood::Neutral => "(o_o)",
    }));
    Paragraph::new(Line::from(spans))
}

fn state_badge(state: PresenceState) -> (&'static str, Style) {
    match state {
        PresenceState::Disconnected => ("● disconnected", Style::new().dark_gray()),
        PresenceState::Connecting => ("● connecting", Style::new().yellow()),
        PresenceState::Connected | PresenceState::Idle => ("● idle", Style::new().green()),
        PresenceState::Thinking => ("● thinking", Style::new().cyan()),
        PresenceState::Speaking => ("● speaking", Style::new().light_blue()),
        PresenceState::Listening => ("● listening", Style::new().blue()),
        PresenceState::Error => ("● error", Style::new().red()),
    }
}

/// Refresh the weather watch channel once per cache window
async fn weather_loop(sampler: WeatherSampler, tx: watch::Sender<Option<WeatherSample>>) {
    let mut interval =
        tokio::time::interval(Duration::from_millis(CACHE_DURATION_MS as u64));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        interval.tick().await;
        let sample = sampler.sample(now_ms()).await;
        if tx.send(Some(sample)).is_err() {
            break;
        }
    }
}
