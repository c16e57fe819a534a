//! Maps opaque task ids onto the small non-negative integers that local
//! notification APIs key their pending notifications by.
//!
//! There is no id table: two task ids may land on the same integer, in which
//! case the later schedule replaces the earlier one's platform slot.

use crate::models::IdStrategy;

const LOW_32_BITS: i64 = 0xFFFF_FFFF;
const SIGN_BIT_32: i64 = 0x8000_0000;
const WRAP_32: i64 = 0x1_0000_0000;
const MAX_DIGITS: usize = 9;

pub fn derive_notification_id(task_id: &str, strategy: IdStrategy) -> i32 {
    match strategy {
        IdStrategy::Hash => hash_id(task_id),
        IdStrategy::Digits => digits_id(task_id),
    }
}

/// `h = h * 31 + unit` over UTF-16 code units, kept in the signed 32-bit range
/// by masking, then made non-negative.
fn hash_id(task_id: &str) -> i32 {
    let mut hash: i64 = 0;
    for unit in task_id.encode_utf16() {
        hash = wrap_to_i32_range(hash * 31 + i64::from(unit));
    }
    // |i32::MIN| has no i32 representation.
    i32::try_from(hash.abs()).unwrap_or(i32::MAX)
}

fn wrap_to_i32_range(value: i64) -> i64 {
    let low = value & LOW_32_BITS;
    if low >= SIGN_BIT_32 {
        low - WRAP_32
    } else {
        low
    }
}

/// First nine ASCII digits of the id. Ids without digits all map to 0.
fn digits_id(task_id: &str) -> i32 {
    let digits: String = task_id
        .chars()
        .filter(|c| c.is_ascii_digit())
        .take(MAX_DIGITS)
        .collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const UUID: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn hash_is_deterministic_for_the_same_id() {
        let first = derive_notification_id("abc-123", IdStrategy::Hash);
        let second = derive_notification_id("abc-123", IdStrategy::Hash);
        assert_eq!(first, second);
        assert_eq!(first, 1_207_981_497);
    }

    #[test]
    fn hash_matches_the_31_multiplier_rolling_hash() {
        assert_eq!(derive_notification_id("abc", IdStrategy::Hash), 96_354);
        assert_eq!(derive_notification_id("t1", IdStrategy::Hash), 3_645);
        assert_eq!(
            derive_notification_id("hello world", IdStrategy::Hash),
            1_794_106_052
        );
        assert_eq!(derive_notification_id(UUID, IdStrategy::Hash), 1_716_781_005);
    }

    #[test]
    fn hash_walks_utf16_code_units() {
        assert_eq!(derive_notification_id("ğ", IdStrategy::Hash), 287);
        // Surrogate pair: 0xD83D * 31 + 0xDE00.
        assert_eq!(derive_notification_id("😀", IdStrategy::Hash), 1_772_899);
    }

    #[test]
    fn hash_is_never_negative() {
        for id in ["", "a", "abc-123", UUID, "zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz", "ÿÿÿÿÿÿÿÿ"] {
            assert!(derive_notification_id(id, IdStrategy::Hash) >= 0, "{id}");
        }
    }

    #[test]
    fn hash_of_i32_min_saturates() {
        // This string hashes to exactly -2^31.
        assert_eq!(
            derive_notification_id("polygenelubricants", IdStrategy::Hash),
            i32::MAX
        );
    }

    #[test]
    fn hash_collisions_are_tolerated() {
        // Known collision: both fold to 2112 and would share a platform slot.
        assert_eq!(
            derive_notification_id("Aa", IdStrategy::Hash),
            derive_notification_id("BB", IdStrategy::Hash)
        );
    }

    #[test]
    fn digits_keeps_the_first_nine_digits() {
        assert_eq!(derive_notification_id(UUID, IdStrategy::Digits), 550_840_029);
        assert_eq!(derive_notification_id("t-42", IdStrategy::Digits), 42);
    }

    #[test]
    fn digits_collapses_ids_without_digits_to_zero() {
        assert_eq!(derive_notification_id("abcdef", IdStrategy::Digits), 0);
        assert_eq!(derive_notification_id("t-000", IdStrategy::Digits), 0);
    }
}
