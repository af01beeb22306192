use super::*;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame, Terminal,
};
use reasoning_lab_lib::UiEvent;

const TITLE: &str = "Reasoning-lab: Explore, experiment and find scientific solutions";

// ============================================================================
// TUI State
// ============================================================================

/// Which pane receives key presses
#[derive(Clone, Copy, PartialEq)]
enum Focus {
    Sidebar,
    Input,
}

struct TuiApp {
    session: LabSession,
    menu_state: ListState,
    focus: Focus,

    // One input buffer per workflow, like separate widgets
    inputs: [String; 3],

    output_scroll: u16,
    status_message: String,
}

impl TuiApp {
    fn new(mut session: LabSession) -> Self {
        let mut menu_state = ListState::default();
        menu_state.select(Some(0));
        session.select(MenuChoice::ALL[0]);

        Self {
            session,
            menu_state,
            focus: Focus::Sidebar,
            inputs: Default::default(),
            output_scroll: 0,
            status_message: "↑/↓ choose a function · Enter to type · q to quit".to_string(),
        }
    }

    fn selected_index(&self) -> usize {
        self.menu_state.selected().unwrap_or(0)
    }

    fn current_choice(&self) -> MenuChoice {
        MenuChoice::ALL[self.selected_index()]
    }

    fn current_input(&mut self) -> &mut String {
        let idx = self.selected_index();
        &mut self.inputs[idx]
    }

    fn select_index(&mut self, idx: usize) {
        self.menu_state.select(Some(idx));
        self.session.select(MenuChoice::ALL[idx]);
        self.output_scroll = 0;
    }

    fn select_next(&mut self) {
        let idx = (self.selected_index() + 1) % MenuChoice::ALL.len();
        self.select_index(idx);
    }

    fn select_prev(&mut self) {
        let len = MenuChoice::ALL.len();
        let idx = (self.selected_index() + len - 1) % len;
        self.select_index(idx);
    }

    /// Clear the cached result of the current workflow
    fn reset_current(&mut self) {
        match self.current_choice() {
            MenuChoice::PdfAnalysis => {
                self.session.reset_analysis();
                self.status_message = "Cleared cached PDF analysis".to_string();
            }
            MenuChoice::HypotheticalExperiments => {
                self.session.reset_experiment();
                self.status_message = "Cleared cached experiment".to_string();
            }
            MenuChoice::SearchArticles => {}
        }
    }

    /// Build the event for the current panel's trigger button
    fn trigger_event(&mut self) -> Option<UiEvent> {
        let choice = self.current_choice();
        let input = self.current_input().clone();

        match choice {
            MenuChoice::SearchArticles => Some(UiEvent::SearchClicked(input)),
            MenuChoice::HypotheticalExperiments => Some(UiEvent::GenerateClicked(input)),
            MenuChoice::PdfAnalysis => {
                let path = input.trim();
                if path.is_empty() {
                    self.status_message = "No file selected".to_string();
                    return None;
                }
                match std::fs::read(path) {
                    Ok(bytes) => Some(UiEvent::FileUploaded(bytes)),
                    Err(e) => {
                        self.status_message = format!("Could not read {}: {}", path, e);
                        None
                    }
                }
            }
        }
    }

    async fn trigger(&mut self) {
        let choice = self.current_choice();
        let Some(event) = self.trigger_event() else { return };

        match self.session.handle(event).await {
            Ok(()) => {
                self.status_message = match choice {
                    MenuChoice::SearchArticles => {
                        format!("Found {} articles", self.session.state().last_search_results.len())
                    }
                    _ => format!("{} ready (x clears the cached result)", choice.label()),
                };
            }
            Err(e) => {
                tracing::error!(workflow = choice.label(), error = %e, "Workflow failed");
                self.status_message = format!("{} failed: {}", choice.label(), e);
            }
        }
        self.output_scroll = 0;
    }
}

// ============================================================================
// Main Loop
// ============================================================================

pub(crate) async fn run_tui(session: LabSession) -> LabResult<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = TuiApp::new(session);

    let result = run_tui_loop(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_tui_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut TuiApp,
) -> LabResult<()> {
    loop {
        terminal.draw(|f| draw_ui(f, app))?;

        if !event::poll(std::time::Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else { continue };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.focus {
            Focus::Input => match key.code {
                KeyCode::Esc => {
                    app.focus = Focus::Sidebar;
                }
                KeyCode::Enter => {
                    app.status_message = format!("{}: working...", app.current_choice().label());
                    terminal.draw(|f| draw_ui(f, app))?;
                    // Blocks until the workflow returns
                    app.trigger().await;
                }
                KeyCode::Backspace => {
                    app.current_input().pop();
                }
                KeyCode::Char(c) => {
                    app.current_input().push(c);
                }
                _ => {}
            },
            Focus::Sidebar => match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('j') | KeyCode::Down => app.select_next(),
                KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
                KeyCode::Enter | KeyCode::Tab | KeyCode::Char('i') => {
                    app.focus = Focus::Input;
                    app.status_message = "Enter to run · Esc to go back".to_string();
                }
                KeyCode::Char('x') => app.reset_current(),
                KeyCode::PageDown => app.output_scroll = app.output_scroll.saturating_add(10),
                KeyCode::PageUp => app.output_scroll = app.output_scroll.saturating_sub(10),
                _ => {}
            },
        }
    }
}

// ============================================================================
// Drawing
// ============================================================================

fn draw_ui(f: &mut Frame, app: &TuiApp) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(f.size());

    let title = Paragraph::new(Line::from(Span::styled(
        format!(" {}", TITLE),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )))
    .style(Style::default().bg(Color::Rgb(40, 40, 60)));
    f.render_widget(title, chunks[0]);

    // Sidebar (fixed width) | workflow panel
    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(0)])
        .split(chunks[1]);

    draw_sidebar(f, app, main_chunks[0]);
    draw_workflow(f, app, main_chunks[1]);

    let status_bar = Paragraph::new(app.status_message.clone())
        .style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(status_bar, chunks[2]);
}

fn border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_sidebar(f: &mut Frame, app: &TuiApp, area: Rect) {
    let items: Vec<ListItem> = MenuChoice::ALL
        .iter()
        .map(|choice| ListItem::new(choice.label()))
        .collect();

    let menu = List::new(items)
        .block(Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(app.focus == Focus::Sidebar))
            .title(" Select a function "))
        .highlight_style(Style::default().bg(Color::Blue).fg(Color::White).add_modifier(Modifier::BOLD))
        .highlight_symbol("→ ");

    f.render_stateful_widget(menu, area, &mut app.menu_state.clone());
}

fn draw_workflow(f: &mut Frame, app: &TuiApp, area: Rect) {
    let choice = app.current_choice();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Input
            Constraint::Min(0),    // Output
        ])
        .split(area);

    let editing = app.focus == Focus::Input;
    let input_text = if editing {
        format!("{}_", app.inputs[app.selected_index()])
    } else {
        app.inputs[app.selected_index()].clone()
    };
    let input = Paragraph::new(input_text).block(Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(editing))
        .title(format!(" {} ", choice.input_label())));
    f.render_widget(input, chunks[0]);

    let output = Paragraph::new(markdown_lines(&app.session.render()))
        .block(Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(false))
            .title(format!(" {} ", choice.heading())))
        .wrap(Wrap { trim: false })
        .scroll((app.output_scroll, 0));
    f.render_widget(output, chunks[1]);
}

/// Minimal styling for the session's markdown: bold lines and rules
fn markdown_lines(markdown: &str) -> Text<'static> {
    let lines: Vec<Line> = markdown
        .lines()
        .map(|line| {
            if let Some(bold) = line.strip_prefix("**").and_then(|l| l.strip_suffix("**")) {
                Line::from(Span::styled(
                    bold.to_string(),
                    Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                ))
            } else if line == "---" {
                Line::from(Span::styled("─".repeat(40), Style::default().fg(Color::DarkGray)))
            } else if line.starts_with("[PDF Link](") {
                Line::from(Span::styled(line.to_string(), Style::default().fg(Color::Cyan)))
            } else {
                Line::from(line.to_string())
            }
        })
        .collect();
    Text::from(lines)
}
