use crossterm::event::KeyCode;
use std::{
    sync::Mutex,
    time::{Duration, SystemTime},
};

/// A thread-safe record of recent keypresses.
/// Terminals only report presses, so a key counts as held
/// for `timeout` after it was last pressed.
/// Wrap it in an `std::sync::Arc` and you are good to go.
pub struct KeyBuffer {
    timeout: Duration,
    presses: Mutex<Vec<(KeyCode, SystemTime)>>,
}

impl KeyBuffer {

    /// Create a new `KeyBuffer`, but forget keypresses that are older than `timeout`.
    pub fn new(timeout: Duration) -> KeyBuffer {
        KeyBuffer {
            timeout,
            presses: Mutex::new(Vec::new()),
        }
    }

    /// Record a keypress.
    pub fn push(&self, key_code: KeyCode) {
        let mut presses = self.presses.lock().unwrap();
        let now = SystemTime::now();
        match presses.iter_mut().find(|(kc, _)| *kc == key_code) {
            Some(press) => press.1 = now,
            None => presses.push((key_code, now)),
        }
    }

    /// All keys pressed recently enough to count as held.
    pub fn held(&self) -> Vec<KeyCode> {
        let mut presses = self.presses.lock().unwrap();
        let timeout = self.timeout;
        presses.retain(|(_, ts)| ts.elapsed().map(|age| age < timeout).unwrap_or(false));
        presses.iter().map(|(kc, _)| *kc).collect()
    }

    pub fn is_held(&self, key_code: KeyCode) -> bool {
        self.held().contains(&key_code)
    }
}
