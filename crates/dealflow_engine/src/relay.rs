use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::seq::SliceRandom;
use rand::Rng;

/// Characters left alone by JavaScript's `encodeURIComponent`.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A CORS relay endpoint prefix.
///
/// Templates that already carry a query (`...?` or `...?quest=`) take the
/// target percent-encoded as the query value; path-style templates take the
/// raw target appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayTemplate(String);

impl RelayTemplate {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self(prefix.into())
    }

    pub fn wrap(&self, target: &str) -> String {
        if self.0.contains('?') {
            format!("{}{}", self.0, utf8_percent_encode(target, URI_COMPONENT))
        } else {
            format!("{}{}", self.0, target)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayPool {
    relays: Vec<RelayTemplate>,
}

impl RelayPool {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            relays: prefixes.into_iter().map(RelayTemplate::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.relays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.relays.is_empty()
    }

    /// Relay-wrapped URLs for `target`, one per relay, in a fresh uniform random order.
    pub fn attempt_order(&self, target: &str) -> Vec<String> {
        self.attempt_order_with(target, &mut rand::thread_rng())
    }

    pub fn attempt_order_with<R: Rng + ?Sized>(&self, target: &str, rng: &mut R) -> Vec<String> {
        let mut order: Vec<&RelayTemplate> = self.relays.iter().collect();
        order.shuffle(rng);
        order.into_iter().map(|relay| relay.wrap(target)).collect()
    }
}
