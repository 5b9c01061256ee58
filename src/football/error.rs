/// Per-row diagnostics, reported through the `parse_error` column.
#[derive(Debug, Clone, Default)]
pub struct ErrorAccumulator {
    messages: Vec<String>,
}

impl ErrorAccumulator {
    /// Start a row with the note carried by its input file, if any.
    pub fn with_note(note: Option<&str>) -> Self {
        let mut accumulator = Self::default();
        if let Some(note) = note {
            accumulator.push(note);
        }
        accumulator
    }

    /// Record `msg` once; repeats within the same row are dropped.
    pub fn push(&mut self, msg: impl AsRef<str>) {
        let msg = msg.as_ref();
        if !self.messages.iter().any(|existing| existing == msg) {
            self.messages.push(msg.to_string());
        }
    }

    /// Drain the row's messages as one `; `-separated string.
    pub fn take(&mut self) -> Option<String> {
        if self.messages.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.messages).join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::ErrorAccumulator;

    #[test]
    fn test_push_joins_row_diagnostics() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("Invalid UTF-8 replaced in cl.txt");
        accumulator.push("Sanitized interior NUL in home_team");

        assert_eq!(
            accumulator.take().as_deref(),
            Some("Invalid UTF-8 replaced in cl.txt; Sanitized interior NUL in home_team")
        );
    }

    #[test]
    fn test_push_drops_repeated_message() {
        let mut accumulator = ErrorAccumulator::default();
        accumulator.push("Date out of range: 262143-01-01");
        accumulator.push(String::from("Date out of range: 262143-01-01"));

        assert_eq!(
            accumulator.take().as_deref(),
            Some("Date out of range: 262143-01-01")
        );
    }

    #[test]
    fn test_with_note_seeds_first_message() {
        let mut accumulator = ErrorAccumulator::with_note(Some("Invalid UTF-8 replaced in wc.txt"));
        accumulator.push("Sanitized interior NUL in away");
        assert_eq!(
            accumulator.take().as_deref(),
            Some("Invalid UTF-8 replaced in wc.txt; Sanitized interior NUL in away")
        );

        assert!(ErrorAccumulator::with_note(None).take().is_none());
    }

    #[test]
    fn test_take_leaves_accumulator_empty() {
        let mut accumulator = ErrorAccumulator::default();
        assert!(accumulator.take().is_none());

        accumulator.push("error");
        assert_eq!(accumulator.take().as_deref(), Some("error"));
        assert!(accumulator.take().is_none());
    }
}
