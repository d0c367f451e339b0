mod details;
mod form;
mod funnel;
mod help;
mod history;
mod placeholder;
mod state;
mod theme;

use crate::cli::Cli;
use crate::filter;
use crate::model::{most_recent_first, PipelineRun};
use crate::registry;
use crate::store::{self, DataSource, LoadError, MemoryStore, RunStore};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use form::{FormAction, NewRunForm};
use funnel::{FunnelAction, FunnelPane};
use history::{HistoryAction, HistoryPane};
use placeholder::SkeletonSpec;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use state::{PageEvent, PageState};
use std::io;
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

/// Which pane keyboard input is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Funnel,
    History,
}

/// At most one overlay is on screen at a time; help sits above everything.
enum Overlay {
    None,
    Form(NewRunForm),
    Help,
}

/// The page before, during, and after its data arrives.
enum Phase {
    Loading {
        rx: Receiver<std::result::Result<Vec<PipelineRun>, LoadError>>,
    },
    Ready(Box<Page>),
    Failed(LoadError),
}

pub fn run(args: Cli) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    let res = run_loop(&args, &mut terminal);

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn start_load(args: &Cli) -> Phase {
    Phase::Loading {
        rx: store::spawn_loader(DataSource::resolve(args.data.clone())),
    }
}

fn run_loop(args: &Cli, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    let mut phase = start_load(args);
    let tick_rate = Duration::from_millis(100);
    let mut last_tick: Option<Instant> = None;

    loop {
        // Promote a finished load before drawing.
        if let Phase::Loading { rx } = &phase {
            match rx.try_recv() {
                Ok(Ok(runs)) => phase = Phase::Ready(Box::new(Page::new(args, runs))),
                Ok(Err(e)) => phase = Phase::Failed(e),
                Err(_) => {}
            }
        }

        if last_tick.map_or(true, |t| t.elapsed() >= tick_rate) {
            terminal.draw(|f| draw(f, &mut phase)).ok();
            last_tick = Some(Instant::now());
        }

        // Poll input with a short timeout to keep the render loop live.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                if k.modifiers == KeyModifiers::CONTROL && k.code == KeyCode::Char('c') {
                    break;
                }
                match &mut phase {
                    Phase::Loading { .. } => {
                        if matches!(k.code, KeyCode::Char('q') | KeyCode::Esc) {
                            break;
                        }
                    }
                    Phase::Failed(_) => match k.code {
                        // Retry rebuilds the whole page from the reload.
                        KeyCode::Char('r') => phase = start_load(args),
                        KeyCode::Char('q') | KeyCode::Esc => break,
                        _ => {}
                    },
                    Phase::Ready(page) => {
                        if page.handle_key(k) {
                            break;
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn draw(frame: &mut Frame, phase: &mut Phase) {
    let area = frame.area();
    match phase {
        Phase::Loading { .. } => placeholder::render_loading(
            frame,
            area,
            SkeletonSpec {
                stat_cards: registry::stages().len() + 1,
                rows: 8,
            },
        ),
        Phase::Failed(err) => placeholder::render_error(frame, area, err),
        Phase::Ready(page) => page.render(frame, area),
    }
}

/// The pipeline page: the run store, the shared selection state, and the
/// two panes plus overlay routing. All shared-state changes go through the
/// `PageState` reducer.
struct Page {
    store: MemoryStore,
    state: PageState,
    funnel: FunnelPane,
    history: HistoryPane,
    focus: Focus,
    overlay: Overlay,
    info: String,
}

impl Page {
    fn new(args: &Cli, runs: Vec<PipelineRun>) -> Self {
        let mut store = MemoryStore::new(runs);
        if args.auto_save {
            if let Some(path) = args.data.clone().or_else(store::default_data_path) {
                store = store.with_write_through(path);
            }
        }
        let state = PageState::new(&store);
        let info = format!("Loaded {} runs", store.runs().len());
        Self {
            store,
            state,
            funnel: FunnelPane::new(),
            history: HistoryPane::new(),
            focus: Focus::Funnel,
            overlay: Overlay::None,
            info,
        }
    }

    /// Handle one key press. Returns true when the app should quit.
    fn handle_key(&mut self, k: KeyEvent) -> bool {
        // Help sits above everything and swallows the next key.
        if matches!(self.overlay, Overlay::Help) {
            self.overlay = Overlay::None;
            return false;
        }

        if let Overlay::Form(form) = &mut self.overlay {
            match form.handle_key(k) {
                FormAction::None => {}
                FormAction::Cancel => self.overlay = Overlay::None,
                FormAction::Launch(run) => {
                    self.overlay = Overlay::None;
                    let label = run.label.clone();
                    match self.state.apply(PageEvent::RunCreated(run), &mut self.store) {
                        Ok(()) => self.info = format!("Launched \"{label}\""),
                        Err(e) => self.info = format!("Launched \"{label}\" (save failed: {e:#})"),
                    }
                }
            }
            return false;
        }

        if self.state.dialog_visible() {
            if matches!(k.code, KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter) {
                let _ = self.state.apply(PageEvent::DialogClosed, &mut self.store);
            }
            return false;
        }

        match k.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('?') => {
                self.overlay = Overlay::Help;
            }
            KeyCode::Char('n') => {
                self.overlay = Overlay::Form(NewRunForm::new());
            }
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Funnel => Focus::History,
                    Focus::History => Focus::Funnel,
                };
            }
            _ => self.route_to_pane(k),
        }
        false
    }

    fn route_to_pane(&mut self, k: KeyEvent) {
        match self.focus {
            Focus::Funnel => {
                let visible_len =
                    filter::runs_matching(self.store.runs(), self.state.stage_filter).len();
                match self.funnel.handle_key(k, self.state.stage_filter, visible_len) {
                    FunnelAction::None => {}
                    FunnelAction::FilterChanged(f) => {
                        let _ = self
                            .state
                            .apply(PageEvent::StageChanged(f), &mut self.store);
                    }
                    FunnelAction::OpenRun(idx) => {
                        let run = filter::runs_matching(self.store.runs(), self.state.stage_filter)
                            .get(idx)
                            .map(|r| (*r).clone());
                        if let Some(run) = run {
                            let _ = self
                                .state
                                .apply(PageEvent::RunSelected(run), &mut self.store);
                        }
                    }
                }
            }
            Focus::History => {
                let len = self.store.runs().len();
                match self.history.handle_key(k, len) {
                    HistoryAction::None => {}
                    HistoryAction::OpenRun(idx) => {
                        let run = most_recent_first(self.store.runs())
                            .get(idx)
                            .map(|r| (*r).clone());
                        if let Some(run) = run {
                            let _ = self
                                .state
                                .apply(PageEvent::RunSelected(run), &mut self.store);
                        }
                    }
                }
            }
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // header
                Constraint::Length(5), // stage map
                Constraint::Min(0),    // panes
                Constraint::Length(2), // footer
            ])
            .split(area);

        self.render_header(frame, chunks[0]);
        self.funnel
            .render_nodes(frame, chunks[1], self.store.runs(), self.state.stage_filter);

        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[2]);

        let visible = filter::runs_matching(self.store.runs(), self.state.stage_filter);
        self.funnel
            .render_badges(frame, body[0], &visible, self.focus == Focus::Funnel);

        let ordered = most_recent_first(self.store.runs());
        self.history
            .render(frame, body[1], &ordered, self.focus == Focus::History);

        self.render_footer(frame, chunks[3]);

        if self.state.dialog_visible() {
            if let Some(run) = &self.state.selected {
                details::render(frame, area, run);
            }
        }
        match &self.overlay {
            Overlay::None => {}
            Overlay::Form(form) => form.render(frame, area),
            Overlay::Help => help::render_overlay(frame, area),
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let sub = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);
        let header = Line::from(vec![
            Span::styled(
                "  funnel-ops",
                Style::default()
                    .fg(theme::ACCENT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(" \u{2502} ", Style::default().fg(theme::BORDER)),
            Span::styled("Pipeline Runs", Style::default().fg(theme::TEXT_SECONDARY)),
        ]);
        frame.render_widget(Paragraph::new(header), sub[0]);
        let sep = Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(theme::BORDER));
        frame.render_widget(sep, sub[1]);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let sub = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(area);

        let (completed, failed) = filter::terminal_counts(self.store.runs());
        let summary = format!(
            "{} runs \u{00b7} {} completed \u{00b7} {} failed",
            self.store.runs().len(),
            completed,
            failed
        );
        let status = Line::from(vec![
            Span::styled(format!("  {summary}"), Style::default().fg(theme::TEXT_MUTED)),
            Span::styled("   ", Style::default()),
            Span::styled(self.info.clone(), Style::default().fg(theme::TEXT_SECONDARY)),
        ]);
        frame.render_widget(Paragraph::new(status), sub[0]);

        let hints = Line::from(vec![
            Span::styled("  [n]", Style::default().fg(theme::ACCENT)),
            Span::styled(" New run  ", Style::default().fg(theme::TEXT_SECONDARY)),
            Span::styled("[Tab]", Style::default().fg(theme::ACCENT)),
            Span::styled(" Focus  ", Style::default().fg(theme::TEXT_SECONDARY)),
            Span::styled("[Enter]", Style::default().fg(theme::ACCENT)),
            Span::styled(" Details  ", Style::default().fg(theme::TEXT_SECONDARY)),
            Span::styled("[?]", Style::default().fg(theme::ACCENT)),
            Span::styled(" Help  ", Style::default().fg(theme::TEXT_SECONDARY)),
            Span::styled("[q]", Style::default().fg(theme::ACCENT)),
            Span::styled(" Quit", Style::default().fg(theme::TEXT_SECONDARY)),
        ]);
        frame.render_widget(Paragraph::new(hints), sub[1]);
    }
}
