use crate::errors::{KenoResult, ValidationError};
use crate::games::types::{DRAW_COUNT, MAX_NUMBER, MAX_PICK, MIN_NUMBER};
use std::collections::BTreeSet;

/// Counts matches between a player's selection and the house draw
#[derive(Debug, Clone, Copy, Default)]
pub struct HitDetector;

impl HitDetector {
    pub fn new() -> Self {
        Self
    }

    pub fn calculate_hits(&self, selection: &[u8], drawn: &[u8]) -> KenoResult<usize> {
        if !self.validate_selection(selection) {
            return Err(ValidationError::InvalidSelection(format!(
                "expected 1-{} distinct numbers in [{}, {}], got {:?}",
                MAX_PICK, MIN_NUMBER, MAX_NUMBER, selection
            ))
            .into());
        }
        if !self.validate_draw(drawn) {
            return Err(ValidationError::InvalidDraw(format!(
                "expected {} distinct numbers in [{}, {}], got {} numbers",
                DRAW_COUNT,
                MIN_NUMBER,
                MAX_NUMBER,
                drawn.len()
            ))
            .into());
        }

        Ok(self.get_matched_numbers(selection, drawn).len())
    }

    /// Intersection of selection and draw, ascending
    pub fn get_matched_numbers(&self, selection: &[u8], drawn: &[u8]) -> Vec<u8> {
        let drawn: BTreeSet<u8> = drawn.iter().copied().collect();
        let picked: BTreeSet<u8> = selection.iter().copied().collect();
        picked.intersection(&drawn).copied().collect()
    }

    pub fn validate_selection(&self, selection: &[u8]) -> bool {
        (1..=MAX_PICK).contains(&selection.len()) && Self::distinct_in_range(selection)
    }

    pub fn validate_draw(&self, drawn: &[u8]) -> bool {
        drawn.len() == DRAW_COUNT && Self::distinct_in_range(drawn)
    }

    fn distinct_in_range(numbers: &[u8]) -> bool {
        let unique: BTreeSet<u8> = numbers.iter().copied().collect();
        unique.len() == numbers.len() && numbers.iter().all(|n| (MIN_NUMBER..=MAX_NUMBER).contains(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::KenoError;

    fn draw() -> Vec<u8> {
        // 1, 5, 9, ... 77
        (0..20).map(|i| 1 + i * 4).collect()
    }

    #[test]
    fn test_counts_hits() {
        let detector = HitDetector::new();
        assert_eq!(detector.calculate_hits(&[1, 5, 9], &draw()).unwrap(), 3);
        assert_eq!(detector.calculate_hits(&[2, 3, 4], &draw()).unwrap(), 0);
        assert_eq!(detector.calculate_hits(&[77, 2, 13], &draw()).unwrap(), 2);
    }

    #[test]
    fn test_matched_numbers_sorted() {
        let detector = HitDetector::new();
        assert_eq!(detector.get_matched_numbers(&[77, 13, 2, 1], &draw()), vec![1, 13, 77]);
    }

    #[test]
    fn test_rejects_bad_selection() {
        let detector = HitDetector::new();
        let bad: Vec<Vec<u8>> = vec![
            vec![],
            vec![1, 1],
            vec![0, 5],
            vec![81],
            (1..=11).collect(),
        ];
        for selection in bad {
            match detector.calculate_hits(&selection, &draw()) {
                Err(KenoError::Validation(ValidationError::InvalidSelection(_))) => {}
                other => panic!("expected InvalidSelection for {:?}, got {:?}", selection, other),
            }
        }
    }

    #[test]
    fn test_rejects_bad_draw() {
        let detector = HitDetector::new();
        let mut duplicate = draw();
        duplicate[19] = duplicate[0];
        let short: Vec<u8> = draw().into_iter().take(19).collect();
        let mut out_of_range = draw();
        out_of_range[0] = 81;

        for drawn in [duplicate, short, out_of_range] {
            match detector.calculate_hits(&[1, 2], &drawn) {
                Err(KenoError::Validation(ValidationError::InvalidDraw(_))) => {}
                other => panic!("expected InvalidDraw, got {:?}", other),
            }
        }
    }
}
