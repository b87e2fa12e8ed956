mod export;
mod help;
mod state;

use crate::api::{HttpInvestigationClient, SharedApi};
use crate::cli::Cli;
use crate::config::ClientConfig;
use crate::model::PollPhase;
use crate::orchestrator::{self, ControllerEvent, UiCommand};
use crate::view::{self, RenderedView};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
    Terminal,
};
use state::{push_wrapped_status_kv, to_color, UiState};
use std::sync::Arc;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli, cfg: ClientConfig) -> Result<()> {
    let api: SharedApi = Arc::new(HttpInvestigationClient::new(&cfg)?);
    // Unbounded channels keep the UI thread from ever blocking on the controller.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<ControllerEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_cfg = cfg.clone();
    let ui_handle =
        std::thread::spawn(move || run_threaded(ui_args, ui_cfg, event_rx, cmd_tx));

    let res = orchestrator::run_controller(api, &cfg, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Outcome of handling one key press.
enum KeyOutcome {
    Continue,
    Quit,
}

/// Run the TUI loop on a dedicated thread.
pub fn run_threaded(
    args: Cli,
    cfg: ClientConfig,
    mut event_rx: UnboundedReceiver<ControllerEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState {
        base_url: cfg.base_url.clone(),
        poll_interval: cfg.poll_interval,
        export_json: args.export_json.clone(),
        ..Default::default()
    };

    if let Some(query) = args.query.clone() {
        state.input = query.clone();
        state.submit_pending = true;
        let _ = cmd_tx.send(UiCommand::Submit(query));
    }

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            if state.apply_event(ev) {
                handle_tracking_finished(&cfg, &mut state);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if let KeyOutcome::Quit = handle_key(k, &cfg, &mut state, &cmd_tx) {
                    let _ = cmd_tx.send(UiCommand::Quit);
                    break Ok(());
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn handle_key(
    k: KeyEvent,
    cfg: &ClientConfig,
    state: &mut UiState,
    cmd_tx: &UnboundedSender<UiCommand>,
) -> KeyOutcome {
    let ctrl = k.modifiers.contains(KeyModifiers::CONTROL);
    match k.code {
        KeyCode::Esc => return KeyOutcome::Quit,
        KeyCode::Char('c') if ctrl => return KeyOutcome::Quit,
        KeyCode::Tab => {
            state.tab = (state.tab + 1) % 2;
        }
        KeyCode::Char('u') if ctrl => {
            if state.input_enabled() {
                state.input.clear();
            }
        }
        KeyCode::Char('s') if ctrl => match export::save_report(cfg, &state.snapshot) {
            Ok(path) => {
                state.last_exported_path = Some(path.to_string_lossy().to_string());
                state.info = format!("Saved: {}", path.display());
            }
            Err(e) => {
                state.info = format!("Save failed: {e:#}");
            }
        },
        KeyCode::Char('y') if ctrl => match export::clipboard_text(&state.snapshot) {
            Some(text) => match export::copy_to_clipboard(&text) {
                Ok(()) => state.info = "✓ Copied to clipboard".into(),
                Err(e) => state.info = format!("Clipboard copy failed: {e:#}"),
            },
            None => state.info = "No investigation to copy yet.".into(),
        },
        KeyCode::Enter if state.tab == 0 => {
            if state.input_enabled() {
                state.submit_pending = true;
                state.info.clear();
                let _ = cmd_tx.send(UiCommand::Submit(state.input.clone()));
            }
        }
        KeyCode::Backspace if state.tab == 0 => {
            if state.input_enabled() {
                state.input.pop();
            }
        }
        KeyCode::Char(c) if state.tab == 0 && !ctrl => {
            if state.input_enabled() {
                state.input.push(c);
            }
        }
        _ => {}
    }
    KeyOutcome::Continue
}

fn handle_tracking_finished(cfg: &ClientConfig, state: &mut UiState) {
    let Some(path) = state.export_json.clone() else {
        return;
    };
    let processed = orchestrator::process_completion(cfg, Some(&path), &state.snapshot);
    if path.exists() {
        state.last_exported_path = Some(path.to_string_lossy().to_string());
    }
    state.info = processed.status_line();
}

/// Height of a bordered block holding `rows` lines.
fn bordered_height(rows: usize) -> u16 {
    u16::try_from(rows).unwrap_or(u16::MAX).saturating_add(2)
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)].as_ref())
        .split(area);

    let tabs = Tabs::new(vec![Line::from("Investigation"), Line::from("Help")])
        .select(state.tab)
        .block(Block::default().borders(Borders::ALL).title(Line::from(vec![
            Span::styled(view::TITLE, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" · "),
            Span::raw(view::TAGLINE),
        ])))
        .highlight_style(Style::default().fg(Color::Yellow));
    f.render_widget(tabs, chunks[0]);

    match state.tab {
        0 => draw_investigation(chunks[1], f, state),
        _ => help::draw_help(chunks[1], f, &state.base_url),
    }
}

fn draw_investigation(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let rendered = state.rendered();
    let error_height = if rendered.error.is_some() { 3 } else { 0 };

    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints(
            [
                Constraint::Length(3),            // Query input
                Constraint::Length(error_height), // Error box
                Constraint::Min(0),               // Details + summary
                Constraint::Length(3),            // Status row
            ]
            .as_ref(),
        )
        .split(area);

    draw_input(main[0], f, &rendered);

    if let Some(error) = rendered.error.as_deref() {
        let p = Paragraph::new(Line::from(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        )))
        .block(Block::default().borders(Borders::ALL).title("Error"));
        f.render_widget(p, main[1]);
    }

    draw_details(main[2], f, state, &rendered);

    let mut status = vec![Span::styled(
        format!("{:?}", state.snapshot.phase),
        Style::default().fg(Color::Gray),
    )];
    if !state.info.is_empty() {
        status.push(Span::raw("  "));
        status.push(Span::raw(state.info.clone()));
    } else if let Some(path) = state.last_exported_path.as_deref() {
        status.push(Span::raw("  Last export: "));
        status.push(Span::raw(path.to_string()));
    }
    let p = Paragraph::new(Line::from(status))
        .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, main[3]);
}

fn draw_input(area: Rect, f: &mut ratatui::Frame, rendered: &RenderedView) {
    let border = if rendered.input_enabled {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let line = if rendered.query.is_empty() && rendered.input_enabled {
        Line::from(Span::styled(
            view::INPUT_PLACEHOLDER,
            Style::default().fg(Color::DarkGray),
        ))
    } else if rendered.input_enabled {
        Line::from(vec![Span::raw(rendered.query.clone()), Span::raw("█")])
    } else {
        Line::from(Span::styled(
            rendered.query.clone(),
            Style::default().fg(Color::DarkGray),
        ))
    };
    let title = if rendered.input_enabled {
        format!("{} (Enter)", rendered.submit_label)
    } else {
        rendered.submit_label.to_string()
    };
    let p = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(title),
    );
    f.render_widget(p, area);
}

fn draw_details(area: Rect, f: &mut ratatui::Frame, state: &UiState, rendered: &RenderedView) {
    let Some(details) = rendered.details.as_ref() else {
        let hint = if state.snapshot.busy {
            "Starting investigation…"
        } else {
            "No investigation yet. Type a query and press Enter."
        };
        let p = Paragraph::new(Line::from(Span::styled(
            hint,
            Style::default().fg(Color::DarkGray),
        )))
        .block(Block::default().borders(Borders::ALL).title("Investigation Details"));
        f.render_widget(p, area);
        return;
    };

    let mut lines: Vec<Line<'static>> = Vec::new();
    push_wrapped_status_kv(&mut lines, "ID", &details.id, area.width);
    push_wrapped_status_kv(&mut lines, "Query", &details.query, area.width);
    lines.push(Line::from(vec![
        Span::styled("Status:", Style::default().fg(Color::Gray)),
        Span::raw(" "),
        Span::styled(
            details.status.clone(),
            Style::default()
                .fg(to_color(details.status_color))
                .add_modifier(Modifier::BOLD),
        ),
    ]));
    if let Some(created) = details.created_at.as_deref() {
        push_wrapped_status_kv(&mut lines, "Created", created, area.width);
    }

    let details_height = bordered_height(lines.len());
    let split = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(details_height), Constraint::Min(0)].as_ref())
        .split(area);

    let title = match state.snapshot.phase {
        PollPhase::Polling => format!(
            "Investigation Details (checking every {}, {} checks)",
            humantime::format_duration(state.poll_interval),
            state.snapshot.polls
        ),
        _ => "Investigation Details".to_string(),
    };
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(p, split[0]);

    if let Some(summary) = details.summary.as_deref() {
        let p = Paragraph::new(summary.to_string())
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title("AI Summary"));
        f.render_widget(p, split[1]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bordered_height_saturates() {
        assert_eq!(bordered_height(0), 2);
        assert_eq!(bordered_height(5), 7);
        assert_eq!(bordered_height(u16::MAX as usize - 1), u16::MAX);
        assert_eq!(bordered_height(100_000), u16::MAX);
    }
}
