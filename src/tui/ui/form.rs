//! Clinical input form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::ClinicalInput;
use crate::tui::styles::MedicalTheme;

/// What a field accepts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    /// Any finite number.
    Numeric,
    /// A number within `[min, max]`.
    Bounded { min: f64, max: f64 },
    /// Exactly `0` or `1`.
    Binary,
}

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub hint: &'static str,
    pub kind: FieldKind,
    pub value: String,
}

impl FormField {
    fn new(label: &'static str, hint: &'static str, kind: FieldKind) -> Self {
        Self {
            label,
            hint,
            kind,
            value: String::new(),
        }
    }

    fn parse(&self) -> Result<f64, String> {
        let value: f64 = self
            .value
            .parse()
            .ok()
            .filter(|v: &f64| v.is_finite())
            .ok_or_else(|| format!("{}: Invalid number", self.label))?;

        match self.kind {
            FieldKind::Numeric => Ok(value),
            FieldKind::Bounded { min, max } if !(min..=max).contains(&value) => Err(format!(
                "{}: Value must be between {} and {}",
                self.label, min, max
            )),
            FieldKind::Bounded { .. } => Ok(value),
            FieldKind::Binary if value == 0.0 || value == 1.0 => Ok(value),
            FieldKind::Binary => Err(format!("{}: Must be 0 or 1", self.label)),
        }
    }
}

// Field order; must stay in sync with `to_clinical_input`.
const TITER: usize = 0;
const LDH: usize = 1;
const TRIGLYCERIDE: usize = 2;
const FIBRINOGEN: usize = 3;
const ANTISYNTHETASE: usize = 4;
const WBC: usize = 5;
const HEMOGLOBIN: usize = 6;
const ALBUMIN: usize = 7;

/// Clinical form state
pub struct ClinicalFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for ClinicalFormState {
    fn default() -> Self {
        Self {
            fields: vec![
                FormField::new(
                    "Anti-RO52 Titer",
                    "0-3",
                    FieldKind::Bounded { min: 0.0, max: 3.0 },
                ),
                FormField::new("LDH", "U/L", FieldKind::Numeric),
                FormField::new("Triglyceride", "mmol/L", FieldKind::Numeric),
                FormField::new("Fibrinogen", "g/L", FieldKind::Numeric),
                FormField::new(
                    "Antisynthetase Ab",
                    "0=negative, 1=positive",
                    FieldKind::Binary,
                ),
                FormField::new("WBC", "x10^9/L", FieldKind::Numeric),
                FormField::new("Hemoglobin", "g/L", FieldKind::Numeric),
                FormField::new("Albumin", "g/L (non-zero)", FieldKind::Numeric),
            ],
            selected_field: 0,
            error_message: None,
        }
    }
}

impl ClinicalFormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Jump to the same row in the other column.
    pub fn switch_column(&mut self) {
        let mid = self.column_split();
        self.selected_field = if self.selected_field < mid {
            (self.selected_field + mid).min(self.fields.len() - 1)
        } else {
            self.selected_field - mid
        };
    }

    fn column_split(&self) -> usize {
        (self.fields.len() + 1) / 2
    }

    /// Add a character to the current field
    pub fn input_char(&mut self, c: char) {
        let field = &mut self.fields[self.selected_field];
        match field.kind {
            FieldKind::Binary => {
                if c == '0' || c == '1' {
                    field.value.zeroize();
                    field.value.push(c);
                    self.error_message = None;
                }
            }
            FieldKind::Bounded { min, .. } => {
                if c.is_ascii_digit() || c == '.' || (c == '-' && min < 0.0) {
                    field.value.push(c);
                    self.error_message = None;
                }
            }
            FieldKind::Numeric => {
                if c.is_ascii_digit() || c == '.' || c == '-' {
                    field.value.push(c);
                    self.error_message = None;
                }
            }
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        self.fields[self.selected_field].value.pop();
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        self.fields[self.selected_field].value.zeroize();
    }

    /// Wipe all field buffers from memory and clear values.
    ///
    /// Called right after a submission so typed lab values do not linger in
    /// UI state.
    pub fn clear_sensitive(&mut self) {
        for field in self.fields.iter_mut() {
            field.value.zeroize();
        }
        self.error_message = None;
        self.selected_field = 0;
    }

    /// Validate entries and build a `ClinicalInput`.
    ///
    /// Zero albumin is accepted here; the feature builder rejects it.
    pub fn to_clinical_input(&self) -> Result<ClinicalInput, String> {
        let mut values = [0.0_f64; 8];
        for (slot, field) in values.iter_mut().zip(&self.fields) {
            *slot = field.parse()?;
        }

        Ok(ClinicalInput {
            ro52_titer: values[TITER],
            ldh: values[LDH],
            triglyceride: values[TRIGLYCERIDE],
            fibrinogen: values[FIBRINOGEN],
            antisynthetase_positive: u8::from(values[ANTISYNTHETASE] == 1.0),
            wbc: values[WBC],
            hemoglobin: values[HEMOGLOBIN],
            albumin: values[ALBUMIN],
        })
    }

    /// Load a sample case (antisynthetase-positive, raised LDH)
    pub fn load_sample_data(&mut self) {
        let sample = [
            "2.5", // anti-RO52 titer
            "480", // LDH (U/L)
            "2.1", // triglyceride (mmol/L)
            "4.1", // fibrinogen (g/L)
            "1",   // antisynthetase antibody
            "9.4", // WBC (x10^9/L)
            "104", // hemoglobin (g/L)
            "31",  // albumin (g/L)
        ];
        for (field, val) in self.fields.iter_mut().zip(sample) {
            field.value.zeroize();
            field.value.push_str(val);
        }
        self.error_message = None;
    }
}

/// Render the clinical input form
pub fn render_clinical_form(f: &mut Frame, area: Rect, state: &ClinicalFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled("Clinical Data Entry", MedicalTheme::title()),
        Span::styled(
            " │ MDA5+ dermatomyositis laboratory panel",
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

fn render_form_fields(f: &mut Frame, area: Rect, state: &ClinicalFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = state.column_split();

    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[mid..],
        mid,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let field_height = 3;
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(field_height))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (MedicalTheme::border_focused(), MedicalTheme::focused())
        } else {
            (MedicalTheme::border(), MedicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let value_display = if field.value.is_empty() {
            Span::styled(field.hint, MedicalTheme::text_muted())
        } else {
            Span::styled(field.value.as_str(), MedicalTheme::text())
        };

        let content = Paragraph::new(Line::from(vec![
            Span::raw(" "),
            value_display,
            if is_selected {
                Span::styled("▌", MedicalTheme::cursor())
            } else {
                Span::raw("")
            },
        ]))
        .block(block);

        f.render_widget(content, chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &ClinicalFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", MedicalTheme::danger()),
            Span::styled(err.as_str(), MedicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓/Tab] ", MedicalTheme::key_hint()),
            Span::styled("Navigate ", MedicalTheme::key_desc()),
            Span::styled("[←→] ", MedicalTheme::key_hint()),
            Span::styled("Column ", MedicalTheme::key_desc()),
            Span::styled("[Enter] ", MedicalTheme::key_hint()),
            Span::styled("Submit ", MedicalTheme::key_desc()),
            Span::styled("[S] ", MedicalTheme::key_hint()),
            Span::styled("Sample Data ", MedicalTheme::key_desc()),
            Span::styled("[Esc] ", MedicalTheme::key_hint()),
            Span::styled("Cancel", MedicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}
