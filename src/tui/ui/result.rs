//! Prediction result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::domain::PredictionResult;
use crate::tui::styles::MedicalTheme;
use crate::IldRiskError;

/// Which kind of failure a submission hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ArtifactsNotLoaded,
    ZeroAlbumin,
    Inference,
    Other,
}

impl FailureKind {
    fn of(err: &IldRiskError) -> Self {
        match err {
            IldRiskError::ArtifactLoad(_) | IldRiskError::ModelNotLoaded(_) => {
                Self::ArtifactsNotLoaded
            }
            IldRiskError::Validation(_) => Self::ZeroAlbumin,
            IldRiskError::Inference(_) => Self::Inference,
            IldRiskError::Io(_) | IldRiskError::Serialization(_) => Self::Other,
        }
    }

    #[must_use]
    pub fn heading(self) -> &'static str {
        match self {
            Self::ArtifactsNotLoaded => "Model artifacts not loaded",
            Self::ZeroAlbumin => "Albumin is zero",
            Self::Inference => "Unexpected inference error",
            Self::Other => "Error",
        }
    }
}

/// Result screen state
#[derive(Debug, Clone, Default)]
pub enum ResultState {
    #[default]
    Idle,
    Complete {
        result: PredictionResult,
    },
    Error {
        kind: FailureKind,
        message: String,
    },
}

impl ResultState {
    /// State for the outcome of one submission.
    #[must_use]
    pub fn from_outcome(outcome: &Result<PredictionResult, IldRiskError>) -> Self {
        match outcome {
            Ok(result) => Self::Complete { result: *result },
            Err(e) => Self::Error {
                kind: FailureKind::of(e),
                message: e.user_message(),
            },
        }
    }
}

/// Render the result screen
pub fn render_result(f: &mut Frame, area: Rect, state: &ResultState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_result_header(f, chunks[0]);
    match state {
        ResultState::Idle => render_idle(f, chunks[1]),
        ResultState::Complete { result } => render_prediction(f, chunks[1], result),
        ResultState::Error { kind, message } => render_error(f, chunks[1], *kind, message),
    }
    render_result_footer(f, chunks[2], state);
}

fn render_result_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("ILD Grade Prediction", MedicalTheme::title()),
        Span::styled(" │ Random forest classifier", MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "No prediction yet",
            MedicalTheme::text_secondary(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Enter clinical data to begin",
            MedicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_prediction(f: &mut Frame, area: Rect, result: &PredictionResult) {
    let block = Block::default()
        .title(Span::styled(" Prediction ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // Label
            Constraint::Length(4), // Probability gauge
            Constraint::Length(2), // Exact probability
            Constraint::Min(0),
        ])
        .margin(1)
        .split(inner);

    let label = Paragraph::new(vec![
        Line::from(Span::styled(
            result.label.to_string(),
            MedicalTheme::risk_class(result.label),
        )),
        Line::from(Span::styled(
            result.label.description(),
            MedicalTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(label, chunks[0]);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(
                    " Class 1 Probability ",
                    MedicalTheme::text_secondary(),
                ))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(MedicalTheme::probability_gauge(result.probability))
        .ratio(result.probability.clamp(0.0, 1.0))
        .label(format!("{:.1}%", result.probability * 100.0));
    f.render_widget(gauge, chunks[1]);

    let exact = Paragraph::new(Line::from(vec![
        Span::styled("Probability: ", MedicalTheme::text_secondary()),
        Span::styled(result.probability_display(), MedicalTheme::text()),
        Span::styled("  (threshold 0.5)", MedicalTheme::text_muted()),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(exact, chunks[2]);
}

fn render_error(f: &mut Frame, area: Rect, kind: FailureKind, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("! {}", kind.heading()),
            MedicalTheme::danger(),
        )),
        Line::from(""),
        Line::from(Span::styled(message, MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_result_footer(f: &mut Frame, area: Rect, state: &ResultState) {
    let content = match state {
        ResultState::Complete { .. } => Line::from(vec![
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Dashboard ", MedicalTheme::key_desc()),
            Span::styled("[N] ", MedicalTheme::key_hint()),
            Span::styled("New Prediction", MedicalTheme::key_desc()),
        ]),
        ResultState::Error { .. } => Line::from(vec![
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Back to Form ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Dashboard", MedicalTheme::key_desc()),
        ]),
        ResultState::Idle => Line::from(vec![
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Dashboard", MedicalTheme::key_desc()),
        ]),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
