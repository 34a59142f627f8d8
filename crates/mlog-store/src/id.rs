//! Record id generation: unix millis followed by a random base-36 suffix.

use rand::Rng;

const SUFFIX_LEN: usize = 9;
const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// New opaque record id, unique with overwhelming probability.
pub fn generate_record_id() -> String {
    let mut rng = rand::thread_rng();
    let suffix: String = (0..SUFFIX_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect();
    format!("{}{}", chrono::Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_timestamp_then_suffix() {
        let id = generate_record_id();
        let (millis, suffix) = id.split_at(id.len() - SUFFIX_LEN);
        assert!(millis.parse::<i64>().is_ok());
        assert!(suffix.bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn ids_do_not_repeat_within_a_burst() {
        let ids: HashSet<String> = (0..10_000).map(|_| generate_record_id()).collect();
        assert_eq!(ids.len(), 10_000);
    }
}
