//! Dashboard view: Main overview screen.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::application::{PredictionService, ServiceState};
use crate::config::AppConfig;
use crate::domain::{ArtifactFile, PredictionResult, RiskClass};
use crate::tui::styles::{MedicalTheme, LOGO_SMALL};
use crate::IldRiskError;

/// In-memory counts for this session. Never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTally {
    pub total: u32,
    pub class0: u32,
    pub class1: u32,
    pub rejected: u32,
}

impl SessionTally {
    /// Count one submission outcome.
    pub fn record(&mut self, outcome: &Result<PredictionResult, IldRiskError>) {
        self.total += 1;
        match outcome {
            Ok(r) if r.label == RiskClass::Class1 => self.class1 += 1,
            Ok(_) => self.class0 += 1,
            Err(_) => self.rejected += 1,
        }
    }
}

/// Artifact details shown when loading succeeded.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactSummary {
    pub scaler: ArtifactFile,
    pub classifier: ArtifactFile,
    pub loaded_at: String,
}

/// Dashboard state for rendering.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub status: ServiceState,
    pub failure: Option<String>,
    pub scaler_path: String,
    pub model_path: String,
    pub artifacts: Option<ArtifactSummary>,
    pub show_full_fingerprints: bool,
}

impl DashboardState {
    /// Snapshot the service's artifact status.
    #[must_use]
    pub fn from_service(service: &PredictionService, config: &AppConfig) -> Self {
        let source = config.artifact_source();
        let artifacts = service.provenance().map(|p| ArtifactSummary {
            scaler: p.scaler.clone(),
            classifier: p.classifier.clone(),
            loaded_at: p.loaded_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        });

        Self {
            status: service.state(),
            failure: service.load_error().map(ToString::to_string),
            scaler_path: source.scaler_path().display().to_string(),
            model_path: source.model_path().display().to_string(),
            artifacts,
            show_full_fingerprints: config.show_full_fingerprints,
        }
    }

    fn fingerprint<'a>(&self, file: &'a ArtifactFile) -> &'a str {
        if self.show_full_fingerprints {
            &file.fingerprint
        } else {
            file.fingerprint.get(..8).unwrap_or(&file.fingerprint)
        }
    }
}

/// Render the main dashboard view.
pub fn render_dashboard(f: &mut Frame, area: Rect, state: &DashboardState, tally: SessionTally) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
        ])
        .split(area);

    render_header(f, chunks[0]);
    render_main_content(f, chunks[1], state, tally);
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled(LOGO_SMALL, MedicalTheme::title()),
        Span::styled(" │ ", MedicalTheme::text_muted()),
        Span::styled(
            "ILD Grade Prediction for MDA5+ Dermatomyositis",
            MedicalTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_main_content(f: &mut Frame, area: Rect, state: &DashboardState, tally: SessionTally) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(55), // Artifact status
            Constraint::Percentage(45), // Session tally + actions
        ])
        .split(area);

    render_artifact_panel(f, chunks[0], state);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(0)])
        .split(chunks[1]);
    render_session_tally(f, right[0], tally);
    render_actions(f, right[1], state);
}

fn render_artifact_panel(f: &mut Frame, area: Rect, state: &DashboardState) {
    let mut lines = vec![format_status_item("Model Artifacts", state.status)];

    lines.push(Line::from(vec![
        Span::styled("  Scaler: ", MedicalTheme::text_secondary()),
        Span::styled(state.scaler_path.as_str(), MedicalTheme::text()),
    ]));
    lines.push(Line::from(vec![
        Span::styled("  Model:  ", MedicalTheme::text_secondary()),
        Span::styled(state.model_path.as_str(), MedicalTheme::text()),
    ]));

    match (&state.artifacts, &state.failure) {
        (Some(a), _) => {
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled("  Scaler FP: ", MedicalTheme::text_secondary()),
                Span::styled(state.fingerprint(&a.scaler), MedicalTheme::text_muted()),
                Span::styled(
                    format!("  ({} bytes)", a.scaler.size_bytes),
                    MedicalTheme::text_muted(),
                ),
            ]));
            lines.push(Line::from(vec![
                Span::styled("  Model FP:  ", MedicalTheme::text_secondary()),
                Span::styled(state.fingerprint(&a.classifier), MedicalTheme::text_muted()),
                Span::styled(
                    format!("  ({} bytes)", a.classifier.size_bytes),
                    MedicalTheme::text_muted(),
                ),
            ]));
            lines.push(Line::from(vec![
                Span::styled("  Loaded at: ", MedicalTheme::text_secondary()),
                Span::styled(a.loaded_at.as_str(), MedicalTheme::text()),
            ]));
        }
        (None, Some(reason)) => {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "  Prediction is disabled until restart:",
                MedicalTheme::warning(),
            )));
            lines.push(Line::from(Span::styled(
                format!("  {reason}"),
                MedicalTheme::danger(),
            )));
        }
        (None, None) => {}
    }

    let block = Block::default()
        .title(Span::styled(" Artifact Status ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn format_status_item(label: &str, status: ServiceState) -> Line<'static> {
    let style = match status {
        ServiceState::Ready => MedicalTheme::success(),
        ServiceState::LoadFailed => MedicalTheme::danger(),
        ServiceState::Unloaded | ServiceState::Loading => MedicalTheme::warning(),
    };
    let icon = if status == ServiceState::Ready {
        "OK"
    } else {
        "FAIL"
    };

    Line::from(vec![
        Span::styled(format!("  {icon} "), style),
        Span::styled(label.to_string(), MedicalTheme::text()),
        Span::styled(format!(" [{status}]"), MedicalTheme::text_muted()),
    ])
}

fn render_session_tally(f: &mut Frame, area: Rect, tally: SessionTally) {
    let block = Block::default()
        .title(Span::styled(" This Session ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    if tally.total == 0 {
        let empty_msg = Paragraph::new(Line::from(vec![Span::styled(
            "No predictions yet. Press [N] to start.",
            MedicalTheme::text_muted(),
        )]))
        .block(block);
        f.render_widget(empty_msg, area);
        return;
    }

    let lines = vec![
        Line::from(vec![
            Span::styled("Submissions: ", MedicalTheme::text_secondary()),
            Span::styled(tally.total.to_string(), MedicalTheme::text()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled("Class 0: ", MedicalTheme::text_secondary()),
            Span::styled(
                tally.class0.to_string(),
                MedicalTheme::risk_class(RiskClass::Class0),
            ),
            Span::styled("  Class 1: ", MedicalTheme::text_secondary()),
            Span::styled(
                tally.class1.to_string(),
                MedicalTheme::risk_class(RiskClass::Class1),
            ),
        ]),
        Line::from(vec![
            Span::styled("Rejected: ", MedicalTheme::text_secondary()),
            Span::styled(tally.rejected.to_string(), MedicalTheme::warning()),
        ]),
    ];

    f.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_actions(f: &mut Frame, area: Rect, state: &DashboardState) {
    let fp_label = if state.show_full_fingerprints {
        "Short Fingerprints"
    } else {
        "Full Fingerprints"
    };

    let actions = vec![
        Line::from(vec![
            Span::styled("[N] ", MedicalTheme::key_hint()),
            Span::styled("New Prediction", MedicalTheme::key_desc()),
        ]),
        Line::from(vec![
            Span::styled("[F] ", MedicalTheme::key_hint()),
            Span::styled(fp_label, MedicalTheme::key_desc()),
        ]),
        Line::from(vec![
            Span::styled("[Q] ", MedicalTheme::key_hint()),
            Span::styled("Quit", MedicalTheme::key_desc()),
        ]),
    ];

    let actions_block = Block::default()
        .title(Span::styled(" Quick Actions ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    f.render_widget(Paragraph::new(actions).block(actions_block), area);
}
