//! Replays recorded interactions from a cassette.
//!
//! Jobs call the generator concurrently, so call order differs between the
//! recording and the replay. Interactions are therefore matched on their
//! recorded input first, and served in sequence only as a fallback.

use std::collections::HashMap;

use super::format::{Cassette, Interaction};

/// Key for indexing interactions by port and method.
#[derive(Debug, Clone, Hash, Eq, PartialEq)]
struct PortMethodKey {
    port: String,
    method: String,
}

/// Interactions for one port/method with a consumed flag per entry.
#[derive(Debug, Default)]
struct Queue {
    interactions: Vec<Interaction>,
    consumed: Vec<bool>,
}

impl Queue {
    fn take(&mut self, pos: usize) -> &Interaction {
        self.consumed[pos] = true;
        &self.interactions[pos]
    }
}

/// Serves each recorded interaction at most once.
#[derive(Debug)]
pub struct CassetteReplayer {
    queues: HashMap<PortMethodKey, Queue>,
}

impl CassetteReplayer {
    /// Create a new replayer from a loaded cassette.
    #[must_use]
    pub fn new(cassette: &Cassette) -> Self {
        let mut queues: HashMap<PortMethodKey, Queue> = HashMap::new();
        for interaction in &cassette.interactions {
            let key = PortMethodKey {
                port: interaction.port.clone(),
                method: interaction.method.clone(),
            };
            let queue = queues.entry(key).or_default();
            queue.interactions.push(interaction.clone());
            queue.consumed.push(false);
        }
        Self { queues }
    }

    /// Return the first unconsumed interaction whose input equals `input`,
    /// or else the first unconsumed interaction for the port and method.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette has no (more) interactions for the
    /// given port/method combination.
    pub fn next_interaction(
        &mut self,
        port: &str,
        method: &str,
        input: &serde_json::Value,
    ) -> Result<&Interaction, String> {
        let key = PortMethodKey { port: port.to_string(), method: method.to_string() };

        if !self.queues.contains_key(&key) {
            let mut available: Vec<String> =
                self.queues.keys().map(|k| format!("{}::{}", k.port, k.method)).collect();
            available.sort();
            return Err(format!(
                "Cassette exhausted: no interactions recorded for port={port:?} method={method:?}. \
                 Available port::method pairs: [{}]",
                available.join(", ")
            ));
        }
        let queue = self.queues.get_mut(&key).ok_or("cassette queue vanished")?;

        let unconsumed = |i: &usize| !queue.consumed[*i];
        let matching = (0..queue.interactions.len())
            .filter(unconsumed)
            .find(|&i| &queue.interactions[i].input == input);
        let pos = matching.or_else(|| (0..queue.interactions.len()).find(|i| unconsumed(i)));

        match pos {
            Some(pos) => Ok(queue.take(pos)),
            None => Err(format!(
                "Cassette exhausted: all {count} interactions for port={port:?} method={method:?} \
                 have been consumed.",
                count = queue.interactions.len(),
            )),
        }
    }
}
