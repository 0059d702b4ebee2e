//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Synchronous prediction on submit

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::application::PredictionService;
use crate::config::AppConfig;

use super::ui::{
    dashboard::{render_dashboard, DashboardState, SessionTally},
    form::{render_clinical_form, ClinicalFormState},
    render_disclaimer,
    result::{render_result, ResultState},
};

/// Current screen/view in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    ClinicalForm,
    Result,
}

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,

    /// Owns the loaded artifacts for the process lifetime
    service: PredictionService,

    dashboard_state: DashboardState,
    form_state: ClinicalFormState,
    result_state: ResultState,
    tally: SessionTally,
}

impl App {
    /// Create the application around an already-initialized service.
    #[must_use]
    pub fn new(service: PredictionService, config: AppConfig) -> Self {
        let dashboard_state = DashboardState::from_service(&service, &config);
        Self {
            screen: Screen::Dashboard,
            should_quit: false,
            service,
            dashboard_state,
            form_state: ClinicalFormState::default(),
            result_state: ResultState::default(),
            tally: SessionTally::default(),
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                let content_area = chunks[0];
                match self.screen {
                    Screen::Dashboard => {
                        render_dashboard(f, content_area, &self.dashboard_state, self.tally)
                    }
                    Screen::ClinicalForm => {
                        render_clinical_form(f, content_area, &self.form_state)
                    }
                    Screen::Result => render_result(f, content_area, &self.result_state),
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key(key.code, key.modifiers);
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        // Global quit handling
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::ClinicalForm => self.handle_form_key(key),
            Screen::Result => self.handle_result_key(key),
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('n') | KeyCode::Char('N') => self.open_form(),
            KeyCode::Char('f') | KeyCode::Char('F') => {
                self.dashboard_state.show_full_fingerprints =
                    !self.dashboard_state.show_full_fingerprints;
            }
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.form_state.clear_sensitive();
                self.screen = Screen::Dashboard;
            }
            KeyCode::Up | KeyCode::BackTab => self.form_state.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.form_state.next_field(),
            KeyCode::Left | KeyCode::Right => self.form_state.switch_column(),
            KeyCode::Char('s') | KeyCode::Char('S') => self.form_state.load_sample_data(),
            KeyCode::Char(c) => self.form_state.input_char(c),
            KeyCode::Backspace => self.form_state.delete_char(),
            KeyCode::Delete => self.form_state.clear_field(),
            KeyCode::Enter => self.submit_form(),
            _ => {}
        }
    }

    fn handle_result_key(&mut self, key: KeyCode) {
        match &self.result_state {
            ResultState::Error { .. } => match key {
                KeyCode::Enter => self.screen = Screen::ClinicalForm,
                KeyCode::Esc => self.screen = Screen::Dashboard,
                _ => {}
            },
            _ => match key {
                KeyCode::Enter | KeyCode::Esc => self.screen = Screen::Dashboard,
                KeyCode::Char('n') | KeyCode::Char('N') => self.open_form(),
                _ => {}
            },
        }
    }

    fn open_form(&mut self) {
        self.form_state.clear_sensitive();
        self.screen = Screen::ClinicalForm;
    }

    /// Parse the form, predict, and show the outcome.
    ///
    /// Field parse errors stay on the form; everything past parsing is a
    /// submission and is counted.
    fn submit_form(&mut self) {
        let input = match self.form_state.to_clinical_input() {
            Ok(input) => input,
            Err(e) => {
                self.form_state.error_message = Some(e);
                return;
            }
        };

        let outcome = self.service.predict(&input);
        self.tally.record(&outcome);
        self.result_state = ResultState::from_outcome(&outcome);
        self.screen = Screen::Result;

        // Clear plaintext buffers from the UI immediately.
        self.form_state.clear_sensitive();
    }
}
