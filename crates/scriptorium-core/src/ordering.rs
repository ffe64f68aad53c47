//! Chronological ordering of manuscripts
//!
//! Listing cards carry a century label such as `Siglo XIV`. The numeral is
//! turned into an integer key and items are stable-sorted on it, so cards
//! from the same century keep their discovery order.

use crate::error::OrderingError;
use crate::types::Item;

fn numeral_value(symbol: char) -> Option<u32> {
    match symbol.to_ascii_uppercase() {
        'I' => Some(1),
        'V' => Some(5),
        'X' => Some(10),
        'L' => Some(50),
        'C' => Some(100),
        'D' => Some(500),
        'M' => Some(1000),
        _ => None,
    }
}

/// Convert a roman numeral into its value
///
/// Subtractive pairs (`IV`, `IX`, `XC`, ...) are honoured by scanning from the
/// right and subtracting any symbol smaller than its right neighbour.
///
/// # Errors
/// - `OrderingError::EmptyLabel` for an empty string
/// - `OrderingError::InvalidNumeral` for any non-numeral character
pub fn roman_to_int(numeral: &str) -> Result<u32, OrderingError> {
    if numeral.is_empty() {
        return Err(OrderingError::EmptyLabel);
    }

    let mut total: i64 = 0;
    let mut previous = 0;

    for symbol in numeral.chars().rev() {
        let value = numeral_value(symbol).ok_or_else(|| OrderingError::InvalidNumeral {
            label: numeral.to_string(),
            symbol,
        })?;
        if value < previous {
            total -= i64::from(value);
        } else {
            total += i64::from(value);
        }
        previous = value;
    }

    // Non-canonical input such as "IIX" is accepted, never negative.
    Ok(u32::try_from(total.max(0)).unwrap_or(u32::MAX))
}

/// Ordering key for a listing label
///
/// The numeral is the last whitespace-separated token, so both `XIV` and
/// `Siglo XIV` map to 14.
///
/// # Errors
/// Propagates [`roman_to_int`] failures.
pub fn ordering_key(label: &str) -> Result<u32, OrderingError> {
    let numeral = label
        .split_whitespace()
        .last()
        .ok_or(OrderingError::EmptyLabel)?;
    roman_to_int(numeral)
}

/// Sort items into chain order (stable)
pub fn sort_chain(items: &mut [Item]) {
    items.sort_by_key(|item| item.ordering_key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Group;

    #[test]
    fn converts_common_numerals() {
        assert_eq!(roman_to_int("I").unwrap(), 1);
        assert_eq!(roman_to_int("IV").unwrap(), 4);
        assert_eq!(roman_to_int("IX").unwrap(), 9);
        assert_eq!(roman_to_int("XIV").unwrap(), 14);
        assert_eq!(roman_to_int("XIX").unwrap(), 19);
        assert_eq!(roman_to_int("XC").unwrap(), 90);
        assert_eq!(roman_to_int("MCMXCIV").unwrap(), 1994);
    }

    #[test]
    fn lowercase_is_accepted() {
        assert_eq!(roman_to_int("xvii").unwrap(), 17);
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(roman_to_int(""), Err(OrderingError::EmptyLabel));
        assert_eq!(
            roman_to_int("X2"),
            Err(OrderingError::InvalidNumeral {
                label: "X2".to_string(),
                symbol: '2'
            })
        );
    }

    #[test]
    fn label_prefix_is_ignored() {
        assert_eq!(ordering_key("Siglo XIV").unwrap(), 14);
        assert_eq!(ordering_key("  XII ").unwrap(), 12);
        assert_eq!(ordering_key("   "), Err(OrderingError::EmptyLabel));
    }

    #[test]
    fn ordering_is_monotonic_for_small_numerals() {
        let keys: Vec<u32> = ["II", "IV", "IX", "X"]
            .iter()
            .map(|n| roman_to_int(n).unwrap())
            .collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn sort_is_stable_on_ties() {
        let mut items = vec![
            Item::new("late", Group(1), "Siglo XVIII", 18),
            Item::new("first-xiv", Group(1), "Siglo XIV", 14),
            Item::new("second-xiv", Group(2), "Siglo XIV", 14),
            Item::new("early", Group(2), "Siglo XII", 12),
        ];

        sort_chain(&mut items);

        let titles: Vec<&str> = items.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["early", "first-xiv", "second-xiv", "late"]);
    }
}
