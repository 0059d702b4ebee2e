//! Log sanitization for clinical values and identifiers.
//!
//! Log output is passed through these patterns before reaching its sink:
//! - Laboratory key/value pairs (`ldh=300`, `albumin: 40.0`)
//! - Feature vectors (`features=[...]`)
//! - Identifiers (UUIDs, MRNs, emails, phone numbers)
//!
//! Prediction code logs labels and fingerprints, not raw inputs; this is the
//! fallback for anything that slips through (e.g. a serde error echoing input).
//!
//! Input is capped at `ILDRISK_SANITIZE_MAX_BYTES` (default 16 KiB) per call.

use regex::{Regex, RegexSet};
use std::sync::OnceLock;
use tracing_subscriber::fmt::MakeWriter;

/// Compiled patterns for clinical value detection and sanitization.
static CLINICAL_PATTERNS: OnceLock<ClinicalPatterns> = OnceLock::new();

const DEFAULT_SANITIZE_MAX_BYTES: usize = 16 * 1024;

struct RedactionRule {
    regex: Regex,
    replacement: &'static str,
}

struct ClinicalPatterns {
    set: RegexSet,
    rules: Vec<RedactionRule>,
}

fn truncate_to_char_boundary(input: &str, max_bytes: usize) -> (&str, bool) {
    if input.len() <= max_bytes {
        return (input, false);
    }

    let mut end = max_bytes.min(input.len());
    while end > 0 && !input.is_char_boundary(end) {
        end -= 1;
    }
    (&input[..end], true)
}

fn max_sanitize_bytes() -> usize {
    std::env::var("ILDRISK_SANITIZE_MAX_BYTES")
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_SANITIZE_MAX_BYTES)
}

fn get_patterns() -> &'static ClinicalPatterns {
    CLINICAL_PATTERNS.get_or_init(|| {
        let rules: Vec<(&'static str, &'static str)> = vec![
            // Lab values keyed by field or feature name; the key is kept.
            (
                r#"(?i)\b(ro52(?:_titer)?|anti_ro52_titer|ldh|triglyceride|fibrinogen|antisynthetase(?:_positive)?|wbc|hemoglobin|albumin|hemoglobin_albumin_ratio)"?\s*[:=]\s*-?(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?"#,
                "$1=[REDACTED]",
            ),
            // Whole feature vectors.
            (
                r"(?i)\b(features|feature_vector|scaled)\s*[:=]\s*\[[^\]]{0,512}\]",
                "$1=[REDACTED-FEATURES]",
            ),
            (
                r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
                "[REDACTED-UUID]",
            ),
            (r"\bMRN[:\s]?\d{6,10}\b", "[REDACTED-MRN]"),
            (
                r"(?i)\b[a-z0-9](?:[a-z0-9._%+-]{0,62}[a-z0-9])?@(?:[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?\.)+[a-z]{2,}\b",
                "[REDACTED-EMAIL]",
            ),
            (
                r"\b(?:\+?\d{1,3}[-.\s]?)?\(?[0-9]{3}\)?[-.\s][0-9]{3,4}[-.\s][0-9]{4}\b",
                "[REDACTED-PHONE]",
            ),
        ];

        let set = RegexSet::new(rules.iter().map(|(p, _)| *p)).expect("Valid regex set");
        let rules = rules
            .into_iter()
            .map(|(pattern, replacement)| RedactionRule {
                regex: Regex::new(pattern).expect("Valid regex"),
                replacement,
            })
            .collect();

        ClinicalPatterns { set, rules }
    })
}

/// Sanitize a string by replacing clinical values and identifiers.
#[must_use]
pub fn sanitize(input: &str) -> String {
    sanitize_with_limit(input, max_sanitize_bytes())
}

fn sanitize_with_limit(input: &str, max_bytes: usize) -> String {
    let patterns = get_patterns();
    let (prefix, truncated) = truncate_to_char_boundary(input, max_bytes);

    let matched: Vec<usize> = patterns.set.matches(prefix).into_iter().collect();
    let mut result = prefix.to_string();
    for idx in matched {
        let rule = &patterns.rules[idx];
        result = rule.regex.replace_all(&result, rule.replacement).to_string();
    }

    if truncated {
        result.push_str(" [TRUNCATED]");
    }
    result
}

/// A `tracing_subscriber` writer wrapper that sanitizes formatted log output
/// line by line before it is written to the underlying sink.
#[derive(Debug)]
pub struct SanitizingMakeWriter<M> {
    inner: M,
}

impl<M> SanitizingMakeWriter<M> {
    #[must_use]
    pub fn new(inner: M) -> Self {
        Self { inner }
    }
}

impl<M> Clone for SanitizingMakeWriter<M>
where
    M: Clone,
{
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

pub struct SanitizingWriter<W> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W> SanitizingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }
}

impl<W> SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn flush_lines(&mut self) -> std::io::Result<()> {
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line = self.buffer.drain(..=pos).collect::<Vec<u8>>();
            let sanitized = sanitize(&String::from_utf8_lossy(&line));
            self.inner.write_all(sanitized.as_bytes())?;
        }
        Ok(())
    }
}

impl<W> std::io::Write for SanitizingWriter<W>
where
    W: std::io::Write,
{
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.extend_from_slice(buf);

        // A single line with no newline must not grow the buffer without bound.
        let hard_cap = max_sanitize_bytes().saturating_mul(2);
        if hard_cap > 0 && self.buffer.len() > hard_cap {
            let sanitized = sanitize(&String::from_utf8_lossy(&self.buffer));
            self.inner.write_all(sanitized.as_bytes())?;
            self.inner.write_all(b"\n[TRUNCATED]\n")?;
            self.buffer.clear();
            return Ok(buf.len());
        }

        self.flush_lines()?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_lines()?;

        if !self.buffer.is_empty() {
            let sanitized = sanitize(&String::from_utf8_lossy(&self.buffer));
            self.inner.write_all(sanitized.as_bytes())?;
            self.buffer.clear();
        }

        self.inner.flush()
    }
}

impl<'a, M> MakeWriter<'a> for SanitizingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = SanitizingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        SanitizingWriter::new(self.inner.make_writer())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn contains_sensitive(input: &str) -> bool {
        let (prefix, _truncated) = truncate_to_char_boundary(input, max_sanitize_bytes());
        get_patterns().set.is_match(prefix)
    }

    #[test]
    fn test_sanitize_lab_values() {
        let input = "submitted ldh=300.5 albumin: 40 hemoglobin=120";
        let sanitized = sanitize(input);
        assert!(!sanitized.contains("300.5"));
        assert!(!sanitized.contains("40"));
        assert!(!sanitized.contains("120"));
        assert!(sanitized.contains("ldh=[REDACTED]"));
        assert!(sanitized.contains("albumin=[REDACTED]"));
    }

    #[test]
    fn test_sanitize_json_echo() {
        let input = r#"bad input {"albumin": 0.0, "wbc":6.5}"#;
        let sanitized = sanitize(input);
        assert!(!sanitized.contains("6.5"));
        assert!(sanitized.contains("wbc=[REDACTED]"));
    }

    #[test]
    fn test_sanitize_feature_vector() {
        let input = "features=[1.5, 300, 1.2, 3, 1, 6.5, 2.99] scaled";
        let sanitized = sanitize(input);
        assert!(sanitized.contains("features=[REDACTED-FEATURES]"));
        assert!(!sanitized.contains("300"));
    }

    #[test]
    fn test_sanitize_uuid() {
        let input = "Case ID: 550e8400-e29b-41d4-a716-446655440000 processed";
        let sanitized = sanitize(input);
        assert!(sanitized.contains("[REDACTED-UUID]"));
        assert!(!sanitized.contains("550e8400"));
    }

    #[test]
    fn test_sanitize_mrn_and_email() {
        assert!(sanitize("MRN:12345678 found").contains("[REDACTED-MRN]"));
        assert!(sanitize("Contact: patient@hospital.com").contains("[REDACTED-EMAIL]"));
    }

    #[test]
    fn test_leaves_operational_text_alone() {
        let input = "Prediction complete: label=Class 1, probability=0.8123, fingerprint=ab12cd34ef56ab78";
        assert_eq!(sanitize(input), input);
        assert!(!contains_sensitive("Loaded classifier from \"rf_model.json\""));
    }

    #[test]
    fn test_contains_sensitive() {
        assert!(contains_sensitive("triglyceride = 1.2"));
        assert!(contains_sensitive("ID: 550e8400-e29b-41d4-a716-446655440000"));
        assert!(!contains_sensitive("Just normal log text"));
    }

    #[test]
    fn test_sanitize_truncates_large_inputs() {
        let input = "prefix with plenty of text beyond the cap";
        let sanitized = sanitize_with_limit(input, 16);
        assert!(sanitized.ends_with("[TRUNCATED]"));
    }

    #[test]
    fn test_writer_sanitizes_per_line() {
        let mut sink = Vec::new();
        {
            let mut writer = SanitizingWriter::new(&mut sink);
            writer.write_all(b"first ldh=3").expect("write");
            writer.write_all(b"00 line\nsecond line\n").expect("write");
            writer.flush().expect("flush");
        }
        let out = String::from_utf8(sink).expect("utf8");
        assert_eq!(out, "first ldh=[REDACTED] line\nsecond line\n");
    }
}
