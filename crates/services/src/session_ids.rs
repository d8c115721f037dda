use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use rand::Rng;

use crate::Clock;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const RANDOM_LEN: usize = 9;

/// Opaque identifier scoping one multi-turn agent conversation.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({})", self.0)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Issues `session_<random>_<millis>` identifiers.
///
/// The millisecond part never goes backwards for a given generator, even if
/// the wall clock does.
#[derive(Debug)]
pub struct SessionIdGenerator {
    clock: Clock,
    last_millis: AtomicI64,
}

impl SessionIdGenerator {
    #[must_use]
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            last_millis: AtomicI64::new(i64::MIN),
        }
    }

    #[must_use]
    pub fn new_session_id(&self) -> SessionId {
        let now = self.clock.now().timestamp_millis();
        let previous = self.last_millis.fetch_max(now, Ordering::AcqRel);
        let millis = previous.max(now);

        let mut rng = rand::rng();
        let random: String = (0..RANDOM_LEN)
            .map(|_| char::from(ALPHABET[rng.random_range(0..ALPHABET.len())]))
            .collect();

        SessionId(format!("session_{random}_{millis}"))
    }
}

/// Session identifiers for the two agent conversations, fixed for the
/// lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationSessions {
    pub tutor: SessionId,
    pub knowledge: SessionId,
}

impl ConversationSessions {
    #[must_use]
    pub fn new(generator: &SessionIdGenerator) -> Self {
        Self {
            tutor: generator.new_session_id(),
            knowledge: generator.new_session_id(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tutor_core::time::{FIXED_TEST_TIMESTAMP, fixed_clock, fixed_now};

    fn parts(id: &SessionId) -> (String, i64) {
        let mut split = id.as_str().splitn(3, '_');
        assert_eq!(split.next(), Some("session"));
        let random = split.next().unwrap().to_owned();
        let millis = split.next().unwrap().parse().unwrap();
        (random, millis)
    }

    #[test]
    fn ids_have_random_and_timestamp_parts() {
        let generator = SessionIdGenerator::new(fixed_clock());
        let id = generator.new_session_id();
        let (random, millis) = parts(&id);

        assert_eq!(random.len(), RANDOM_LEN);
        assert!(random.bytes().all(|b| ALPHABET.contains(&b)));
        assert_eq!(millis, FIXED_TEST_TIMESTAMP * 1000);
    }

    #[test]
    fn timestamp_part_never_decreases() {
        let generator = SessionIdGenerator::new(Clock::fixed(fixed_now() + Duration::seconds(5)));
        let first = parts(&generator.new_session_id()).1;

        // Same generator state, earlier wall clock.
        let rewound = SessionIdGenerator {
            clock: fixed_clock(),
            last_millis: AtomicI64::new(first),
        };
        let second = parts(&rewound.new_session_id()).1;
        assert_eq!(second, first);
    }

    #[test]
    fn conversations_get_distinct_ids() {
        let generator = SessionIdGenerator::new(fixed_clock());
        let sessions = ConversationSessions::new(&generator);
        assert_ne!(sessions.tutor, sessions.knowledge);
    }
}
