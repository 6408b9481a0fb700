//! Lock-screen puzzle: spell the name with a few letters blanked out.
//!
//! Letters fill blanks left to right. Once every blank is filled the answer
//! can be submitted; a wrong answer counts an attempt and blanks out a fresh
//! random set of positions.

use rand::seq::index::sample;
use rand::Rng;

use crate::config::PuzzleConfig;
use crate::error::{GateError, Result};

pub const BLANK: char = '_';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Solved,
    /// Some blanks are still empty; nothing was checked.
    Incomplete,
    Wrong,
}

#[derive(Debug, Clone)]
pub struct LockPuzzle {
    word: Vec<char>,
    min_blanks: usize,
    max_blanks: usize,
    blanks: Vec<usize>,
    input: Vec<Option<char>>,
    attempts: u32,
    solved: bool,
}

impl LockPuzzle {
    pub fn new<R: Rng + ?Sized>(config: &PuzzleConfig, rng: &mut R) -> Result<Self> {
        let word: Vec<char> = config.word.trim().to_ascii_uppercase().chars().collect();
        if word.is_empty() || !word.iter().all(char::is_ascii_uppercase) {
            return Err(GateError::Validation {
                field: "puzzle.word",
                reason: format!("expected letters A-Z, got {:?}", config.word),
            });
        }
        if config.min_blanks == 0 || config.min_blanks > config.max_blanks {
            return Err(GateError::Validation {
                field: "puzzle blanks",
                reason: format!("{}..={}", config.min_blanks, config.max_blanks),
            });
        }

        let mut puzzle = Self {
            word,
            min_blanks: config.min_blanks,
            max_blanks: config.max_blanks,
            blanks: Vec::new(),
            input: Vec::new(),
            attempts: 0,
            solved: false,
        };
        puzzle.reshuffle(rng);
        Ok(puzzle)
    }

    fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let len = self.word.len();
        let count = rng
            .gen_range(self.min_blanks..=self.max_blanks)
            .min(len);
        let mut blanks = sample(rng, len, count).into_vec();
        blanks.sort_unstable();
        self.input = vec![None; blanks.len()];
        self.blanks = blanks;
    }

    /// Sorted indices of the blanked letters.
    pub fn blanks(&self) -> &[usize] {
        &self.blanks
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn is_filled(&self) -> bool {
        self.input.iter().all(Option::is_some)
    }

    /// The word as currently shown, blanks rendered as `_`.
    pub fn display(&self) -> String {
        let mut shown = self.word.clone();
        for (slot, &pos) in self.blanks.iter().enumerate() {
            shown[pos] = self.input[slot].unwrap_or(BLANK);
        }
        shown.into_iter().collect()
    }

    /// Types a letter into the first empty blank. Returns false when the key
    /// is not a letter, every blank is filled, or the puzzle is solved.
    pub fn press(&mut self, key: char) -> bool {
        if self.solved || !key.is_ascii_alphabetic() {
            return false;
        }
        match self.input.iter_mut().find(|slot| slot.is_none()) {
            Some(slot) => {
                *slot = Some(key.to_ascii_uppercase());
                true
            }
            None => false,
        }
    }

    /// Clears the most recently filled blank.
    pub fn erase(&mut self) -> bool {
        if self.solved {
            return false;
        }
        match self.input.iter_mut().rev().find(|slot| slot.is_some()) {
            Some(slot) => {
                *slot = None;
                true
            }
            None => false,
        }
    }

    pub fn submit<R: Rng + ?Sized>(&mut self, rng: &mut R) -> SubmitOutcome {
        if self.solved {
            return SubmitOutcome::Solved;
        }
        if !self.is_filled() {
            return SubmitOutcome::Incomplete;
        }

        let correct = self
            .blanks
            .iter()
            .zip(&self.input)
            .all(|(&pos, typed)| *typed == Some(self.word[pos]));

        if correct {
            self.solved = true;
            tracing::debug!(attempts = self.attempts, "Lock puzzle solved");
            SubmitOutcome::Solved
        } else {
            self.attempts += 1;
            tracing::debug!(attempts = self.attempts, "Lock puzzle answer wrong; reshuffling");
            self.reshuffle(rng);
            SubmitOutcome::Wrong
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn config(word: &str) -> PuzzleConfig {
        PuzzleConfig {
            word: word.to_string(),
            ..PuzzleConfig::default()
        }
    }

    fn answer(puzzle: &LockPuzzle, word: &str) -> Vec<char> {
        let letters: Vec<char> = word.chars().collect();
        puzzle.blanks().iter().map(|&pos| letters[pos]).collect()
    }

    #[test]
    fn blanks_are_sorted_distinct_and_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let puzzle = LockPuzzle::new(&config("MANVEER"), &mut rng).unwrap();
            let blanks = puzzle.blanks();
            assert!((2..=4).contains(&blanks.len()));
            assert!(blanks.windows(2).all(|w| w[0] < w[1]));
            assert!(blanks.iter().all(|&p| p < 7));
            assert_eq!(
                puzzle.display().chars().filter(|&c| c == BLANK).count(),
                blanks.len()
            );
        }
    }

    #[test]
    fn blank_count_is_clamped_to_word_length() {
        let mut rng = StdRng::seed_from_u64(1);
        let puzzle = LockPuzzle::new(&config("AB"), &mut rng).unwrap();
        assert_eq!(puzzle.blanks(), &[0, 1]);
        assert_eq!(puzzle.display(), "__");
    }

    #[test]
    fn correct_answer_solves_and_lowercase_is_accepted() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut puzzle = LockPuzzle::new(&config("manveer"), &mut rng).unwrap();
        assert_eq!(puzzle.submit(&mut rng), SubmitOutcome::Incomplete);

        for letter in answer(&puzzle, "MANVEER") {
            assert!(puzzle.press(letter.to_ascii_lowercase()));
        }
        assert!(puzzle.is_filled());
        assert!(!puzzle.press('Z'));
        assert_eq!(puzzle.display(), "MANVEER");
        assert_eq!(puzzle.submit(&mut rng), SubmitOutcome::Solved);
        assert!(puzzle.is_solved());
        assert!(!puzzle.press('A'));
    }

    #[test]
    fn wrong_answer_counts_attempt_and_resets_input() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut puzzle = LockPuzzle::new(&config("MANVEER"), &mut rng).unwrap();
        for _ in 0..puzzle.blanks().len() {
            puzzle.press('Q');
        }
        assert_eq!(puzzle.submit(&mut rng), SubmitOutcome::Wrong);
        assert_eq!(puzzle.attempts(), 1);
        assert!(!puzzle.is_filled());
        assert!(!puzzle.is_solved());
    }

    #[test]
    fn non_letters_are_ignored_and_erase_undoes_last() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut puzzle = LockPuzzle::new(&config("MANVEER"), &mut rng).unwrap();
        assert!(!puzzle.press('1'));
        assert!(!puzzle.erase());
        assert!(puzzle.press('x'));
        assert!(puzzle.display().contains('X'));
        assert!(puzzle.erase());
        assert!(!puzzle.display().contains('X'));
    }

    #[test]
    fn rejects_invalid_words() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(LockPuzzle::new(&config("  "), &mut rng).is_err());
        assert!(LockPuzzle::new(&config("AB-C"), &mut rng).is_err());
    }
}
