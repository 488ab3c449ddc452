//! Critical Entry Extractor
//!
//! Scans raw log text for critical-severity entries and yields structured
//! occurrences (timestamp + multi-line message).

use regex::Regex;

/// One parsed critical-severity log entry.
///
/// The timestamp keeps its exact lexical form from the log file
/// (`YYYY-MM-DD HH:MM:SS,mmm`). The message is trimmed of surrounding
/// whitespace and may span multiple lines (stack traces).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub timestamp: String,
    pub message: String,
}

impl Occurrence {
    /// First line of the message body, used as the group summary
    /// under the root-line strategy.
    pub fn root_line(&self) -> Option<&str> {
        self.message.lines().next().map(str::trim)
    }
}

/// Extracts critical entries from log text.
///
/// Recognized header shape: `CRIT|<app>|<timestamp>|<field>||<message>`.
/// Continuation lines (lines beginning with whitespace, or empty lines)
/// following a header are absorbed into the same message. Lines that look
/// like a critical header but have a malformed timestamp are skipped
/// entirely, including their continuation lines.
pub struct Extractor {
    header_re: Regex,
}

impl Extractor {
    pub fn new() -> Self {
        // Timestamp field must match the fixed lexical format; any other
        // CRIT-prefixed line is considered malformed and dropped.
        let header_re = Regex::new(
            r"^CRIT\|[^|]*\|(\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2},\d+)\|[^|]*\|\|(.*)$",
        )
        .unwrap();
        Extractor { header_re }
    }

    /// Scan the full log text and return all critical entries in file order.
    ///
    /// Empty input or input without matches yields an empty vector.
    pub fn extract(&self, log_text: &str) -> Vec<Occurrence> {
        let mut occurrences: Vec<Occurrence> = Vec::new();
        // (timestamp, accumulated message lines) of the entry being built
        let mut current: Option<(String, Vec<String>)> = None;

        for line in log_text.lines() {
            if let Some(caps) = self.header_re.captures(line) {
                if let Some(finished) = current.take() {
                    occurrences.push(Self::finish(finished));
                }
                let timestamp = caps[1].to_string();
                let first_line = caps[2].to_string();
                current = Some((timestamp, vec![first_line]));
                continue;
            }

            let is_continuation = line.is_empty()
                || line.chars().next().map(char::is_whitespace).unwrap_or(false);

            match current.as_mut() {
                Some((_, lines)) if is_continuation => {
                    lines.push(line.to_string());
                }
                Some(_) => {
                    // Non-whitespace-led line ends the current entry.
                    // A malformed CRIT header also lands here and starts
                    // nothing new, so its own continuation lines are dropped.
                    let finished = current.take().unwrap();
                    occurrences.push(Self::finish(finished));
                }
                None => {}
            }
        }

        if let Some(finished) = current.take() {
            occurrences.push(Self::finish(finished));
        }

        log::debug!("Extracted {} critical entries", occurrences.len());
        occurrences
    }

    fn finish((timestamp, lines): (String, Vec<String>)) -> Occurrence {
        let message = lines.join("\n").trim().to_string();
        Occurrence { timestamp, message }
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}
