/// Standard average word length used to turn characters into words.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Characters at or before the cursor that are currently marked correct.
pub fn net_correct(cursor: usize, errors: usize) -> usize {
    cursor.saturating_sub(errors)
}

/// Percentage of attempted characters marked correct, 0 when nothing was typed.
pub fn accuracy(cursor: usize, errors: usize) -> u32 {
    if cursor == 0 {
        return 0;
    }

    (100.0 * net_correct(cursor, errors) as f64 / cursor as f64).round() as u32
}

/// Words per minute over the net-correct characters, 0 before the first second elapsed.
pub fn wpm(cursor: usize, errors: usize, elapsed_secs: u64) -> u32 {
    if elapsed_secs == 0 {
        return 0;
    }

    let words = net_correct(cursor, errors) as f64 / CHARS_PER_WORD;
    let minutes = elapsed_secs as f64 / 60.0;

    (words / minutes).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_net_correct_saturates() {
        assert_eq!(net_correct(5, 1), 4);
        assert_eq!(net_correct(2, 2), 0);
        assert_eq!(net_correct(0, 3), 0);
    }

    #[test]
    fn test_accuracy_at_start_is_zero() {
        assert_eq!(accuracy(0, 0), 0);
    }

    #[test]
    fn test_accuracy_rounds() {
        assert_eq!(accuracy(10, 2), 80);
        assert_eq!(accuracy(5, 1), 80);
        assert_eq!(accuracy(3, 1), 67);
        assert_eq!(accuracy(3, 3), 0);
        assert_eq!(accuracy(7, 0), 100);
    }

    #[test]
    fn test_wpm_without_elapsed_time_is_zero() {
        assert_eq!(wpm(0, 0, 0), 0);
        assert_eq!(wpm(250, 0, 0), 0);
    }

    #[test]
    fn test_wpm_one_word_per_minute() {
        assert_eq!(wpm(5, 0, 60), 1);
    }

    #[test]
    fn test_wpm_excludes_errors() {
        // (4 / 5) words over half a minute
        assert_eq!(wpm(5, 1, 30), 2);
        assert_eq!(wpm(300, 0, 60), 60);
        assert_eq!(wpm(300, 50, 60), 50);
    }
}
