//! Diagnostics collected during a parse pass.

use serde::{Deserialize, Serialize};

use crate::dialect::Dialect;

/// A structural line that could not be decoded and was skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedLine {
    /// 1-based line number.
    pub line: usize,
    pub text: String,
    pub reason: String,
}

/// What happened during one pass, beyond the resulting table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParseDiagnostics {
    /// Dialect used for the pass; `None` when auto-detection found nothing.
    pub dialect: Option<Dialect>,
    pub total_lines: usize,
    pub recognized_lines: usize,
    pub malformed: Vec<MalformedLine>,
    /// Features dropped because every license for them had expired.
    pub expired_features: Vec<String>,
}

impl ParseDiagnostics {
    pub(crate) fn for_dialect(dialect: Option<Dialect>) -> Self {
        Self {
            dialect,
            ..Self::default()
        }
    }

    pub(crate) fn malformed(&mut self, line: usize, text: &str, reason: &str) {
        tracing::debug!(line, reason, text, "Skipping malformed line");
        self.malformed.push(MalformedLine {
            line,
            text: text.to_string(),
            reason: reason.to_string(),
        });
    }

    /// Human-readable warnings summarizing skipped content.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.dialect.is_none() && self.total_lines > 0 {
            warnings.push("Input did not look like any known license dump dialect".to_string());
        }

        if !self.malformed.is_empty() {
            warnings.push(format!(
                "Skipped {} malformed line(s): {}",
                self.malformed.len(),
                self.malformed
                    .iter()
                    .map(|entry| entry.line.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }

        if !self.expired_features.is_empty() {
            warnings.push(format!(
                "Dropped expired feature(s): {}",
                self.expired_features.join(", ")
            ));
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_empty_for_clean_pass() {
        let diagnostics = ParseDiagnostics::for_dialect(Some(Dialect::Simple));
        assert!(diagnostics.warnings().is_empty());
    }

    #[test]
    fn test_warnings_list_malformed_line_numbers() {
        let mut diagnostics = ParseDiagnostics::for_dialect(Some(Dialect::Verbose));
        diagnostics.malformed(4, "x", "bad");
        diagnostics.malformed(9, "y", "bad");
        diagnostics.expired_features.push("Safe 19".to_string());

        let warnings = diagnostics.warnings();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0], "Skipped 2 malformed line(s): 4, 9");
        assert_eq!(warnings[1], "Dropped expired feature(s): Safe 19");
    }
}
