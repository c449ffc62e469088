//! Puzzle generator: two-digit addition, or a fixed puzzle in testing mode.

use rand::seq::SliceRandom;
use rand::Rng;

/// Digits used for both tens and units (zero excluded).
pub const DIGITS: [i64; 9] = [1, 2, 3, 4, 5, 6, 7, 8, 9];

pub const TEST_PUZZLE_TEXT: &str = "12 + 34 = ";
pub const TEST_PUZZLE_SOLUTION: i64 = 46;

/// Question text and its ground-truth answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    pub text: String,
    pub solution: i64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PuzzleGenerator {
    testing: bool,
}

impl PuzzleGenerator {
    pub fn new(testing: bool) -> Self {
        Self { testing }
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Puzzle {
        if self.testing {
            return Puzzle {
                text: TEST_PUZZLE_TEXT.to_string(),
                solution: TEST_PUZZLE_SOLUTION,
            };
        }
        let a = two_digit(rng);
        let b = two_digit(rng);
        Puzzle {
            text: format!("{a} + {b} = "),
            solution: a + b,
        }
    }
}

fn two_digit<R: Rng + ?Sized>(rng: &mut R) -> i64 {
    // DIGITS is non-empty, so choose never returns None.
    let tens = DIGITS.choose(rng).copied().unwrap_or(1);
    let units = DIGITS.choose(rng).copied().unwrap_or(1);
    tens * 10 + units
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn testing_mode_is_fixed() {
        let gen = PuzzleGenerator::new(true);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..3 {
            let p = gen.generate(&mut rng);
            assert_eq!(p.text, "12 + 34 = ");
            assert_eq!(p.solution, 46);
        }
    }

    #[test]
    fn operands_have_no_zero_digit() {
        let gen = PuzzleGenerator::new(false);
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..500 {
            let p = gen.generate(&mut rng);
            let parts: Vec<&str> = p.text.split(" + ").collect();
            assert_eq!(parts.len(), 2);
            let a: i64 = parts[0].parse().unwrap();
            let b: i64 = parts[1].trim_end_matches(" = ").parse().unwrap();
            for n in [a, b] {
                assert!((11..=99).contains(&n));
                assert_ne!(n % 10, 0);
            }
            assert_eq!(p.solution, a + b);
            assert!(p.text.ends_with(" = "));
        }
    }

    #[test]
    fn same_seed_same_puzzles() {
        let gen = PuzzleGenerator::default();
        let mut r1 = StdRng::seed_from_u64(1);
        let mut r2 = StdRng::seed_from_u64(1);
        assert_eq!(gen.generate(&mut r1), gen.generate(&mut r2));
    }
}
