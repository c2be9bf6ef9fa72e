use chrono::{DateTime, Utc};
use rand::Rng;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const SUFFIX_LEN: usize = 3;

/// Builds `PREFIX-<base36 ms timestamp>-<3 random base36 chars>`.
///
/// Uniqueness is probabilistic; the `orders.order_number` unique index catches
/// the rare collision and the creation transaction is retried with a new number.
pub fn generate_order_number(prefix: &str, now: DateTime<Utc>) -> String {
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}-{}-{}", prefix, to_base36(millis), suffix)
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn base36_encodes_known_values() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "Z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(1_700_000_000_000), "LOYW3V28");
    }

    #[test]
    fn number_has_prefix_timestamp_and_suffix() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        let number = generate_order_number("ORD", now);
        let parts: Vec<_> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1], "LOYW3V28");
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2].bytes().all(|b| BASE36.contains(&b)));
    }

    #[test]
    fn numbers_in_same_millisecond_usually_differ() {
        let now = Utc::now();
        let numbers: std::collections::HashSet<_> =
            (0..20).map(|_| generate_order_number("ORD", now)).collect();
        assert!(numbers.len() > 1);
    }
}
