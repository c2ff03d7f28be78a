//! Writer-local entry identifiers
//!
//! Ids are a base-62 encoding of a process-local counter followed by a
//! writer-scoped suffix. The counter part is dense and short; the suffix
//! keeps ids from different writers apart. Digits are emitted least
//! significant first.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::Level;
use wmem_core::IdentifierStyle;

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";
const BASE: u64 = ALPHABET.len() as u64;

/// Separator between the counter part and the writer suffix
pub const SUFFIX_SEPARATOR: char = ':';

/// Encode a counter value (0 encodes as `"0"`)
pub fn encode(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut out = String::new();
    while n != 0 {
        out.push(ALPHABET[(n % BASE) as usize] as char);
        n /= BASE;
    }
    out
}

fn digit_value(c: char) -> Option<u64> {
    match c {
        '0'..='9' => Some(c as u64 - '0' as u64),
        'A'..='Z' => Some(c as u64 - 'A' as u64 + 10),
        'a'..='z' => Some(c as u64 - 'a' as u64 + 36),
        _ => None,
    }
}

/// Recover the counter value from a generated id, ignoring the suffix
pub fn decode_identifier(id: &str) -> Option<u64> {
    let counter = id.split(SUFFIX_SEPARATOR).next()?;
    if counter.is_empty() {
        return None;
    }
    let mut value: u64 = 0;
    for c in counter.chars().rev() {
        value = value.checked_mul(BASE)?.checked_add(digit_value(c)?)?;
    }
    Some(value)
}

/// Generates ids that never repeat for one writer
///
/// The suffix is chosen per id: verbose when configured, or whenever TRACE
/// is enabled for this module, compact otherwise. Both forms share one
/// counter, so switching verbosity mid-run never repeats an id.
#[derive(Debug)]
pub struct IdentifierGenerator {
    counter: AtomicU64,
    style: IdentifierStyle,
    compact: String,
    verbose: String,
}

impl IdentifierGenerator {
    /// Create a generator for the given writer
    pub fn new(style: IdentifierStyle, component_id: &str, component_number: u32) -> Self {
        Self {
            counter: AtomicU64::new(0),
            style,
            compact: format!("{SUFFIX_SEPARATOR}{}", encode(u64::from(component_number))),
            verbose: format!("{SUFFIX_SEPARATOR}{component_id}{SUFFIX_SEPARATOR}data"),
        }
    }

    fn suffix(&self) -> &str {
        if self.style == IdentifierStyle::Verbose || tracing::enabled!(Level::TRACE) {
            &self.verbose
        } else {
            &self.compact
        }
    }

    /// Next unused id
    pub fn next(&self) -> String {
        // fetch_add wraps on overflow
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let mut id = encode(n);
        id.push_str(self.suffix());
        id
    }

    /// How many ids have been handed out
    pub fn issued(&self) -> u64 {
        self.counter.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    #[test]
    fn test_zero_encodes_as_digit() {
        assert_eq!(encode(0), "0");
        assert_eq!(encode(9), "9");
        assert_eq!(encode(10), "A");
        assert_eq!(encode(61), "z");
        // least significant digit first
        assert_eq!(encode(62), "01");
        assert_eq!(encode(63), "11");
    }

    fn at_level<R>(level: Level, f: impl FnOnce() -> R) -> R {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_test_writer()
            .finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    #[test]
    fn test_compact_suffix() {
        at_level(Level::DEBUG, || {
            let ids = IdentifierGenerator::new(IdentifierStyle::Compact, "planner", 12);
            assert_eq!(ids.next(), "0:C");
            assert_eq!(ids.next(), "1:C");
            assert_eq!(ids.issued(), 2);
        });
    }

    #[test]
    fn test_verbose_suffix() {
        at_level(Level::INFO, || {
            let ids = IdentifierGenerator::new(IdentifierStyle::Verbose, "planner", 12);
            assert_eq!(ids.next(), "0:planner:data");
        });
        assert_eq!(decode_identifier("0:planner:data"), Some(0));
    }

    #[test]
    fn test_trace_verbosity_switches_to_verbose_suffix() {
        let ids = IdentifierGenerator::new(IdentifierStyle::Compact, "planner", 12);

        assert_eq!(at_level(Level::DEBUG, || ids.next()), "0:C");
        assert_eq!(at_level(Level::TRACE, || ids.next()), "1:planner:data");
        assert_eq!(at_level(Level::DEBUG, || ids.next()), "2:C");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(decode_identifier(""), None);
        assert_eq!(decode_identifier(":C"), None);
        assert_eq!(decode_identifier("a-b:C"), None);
    }

    #[test]
    fn test_concurrent_generation_is_distinct() {
        let ids = std::sync::Arc::new(IdentifierGenerator::new(IdentifierStyle::Compact, "c", 1));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let ids = ids.clone();
                std::thread::spawn(move || (0..250).map(|_| ids.next()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id));
            }
        }
        assert_eq!(seen.len(), 1000);
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(n in any::<u64>(), number in any::<u32>()) {
            let id = format!("{}{}{}", encode(n), SUFFIX_SEPARATOR, encode(u64::from(number)));
            prop_assert_eq!(decode_identifier(&id), Some(n));
        }

        #[test]
        fn generated_ids_are_pairwise_distinct(count in 1usize..300) {
            let ids = IdentifierGenerator::new(IdentifierStyle::Compact, "c", 7);
            let generated: Vec<String> = (0..count).map(|_| ids.next()).collect();
            let unique: HashSet<&String> = generated.iter().collect();
            prop_assert_eq!(unique.len(), count);
            for (i, id) in generated.iter().enumerate() {
                prop_assert_eq!(decode_identifier(id), Some(i as u64));
            }
        }
    }
}
