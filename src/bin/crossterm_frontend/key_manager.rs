use super::key_buffer::KeyBuffer;
use crossterm::event::{poll, read, Event, KeyCode};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

const HOLD_TIMEOUT: Duration = Duration::from_millis(250);
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A struct for managing keypresses that will automatically
/// start a thread that grabs keypresses.
pub struct KeyManager {
    stop: Arc<Mutex<bool>>,
    key_buffer: Arc<KeyBuffer>,
    event_listener: Option<JoinHandle<()>>,
}

impl KeyManager {
    // Start event listener thread
    pub fn new() -> KeyManager {
        let stop = Arc::new(Mutex::new(false));
        let key_buffer = Arc::new(KeyBuffer::new(HOLD_TIMEOUT));
        let event_listener = event_listener(stop.clone(), key_buffer.clone());
        KeyManager {
            stop,
            key_buffer,
            event_listener: Some(event_listener),
        }
    }

    /// The keys that are currently held down
    pub fn held_keys(&self) -> Vec<KeyCode> {
        self.key_buffer.held()
    }

    pub fn is_held(&self, key_code: KeyCode) -> bool {
        self.key_buffer.is_held(key_code)
    }
}

impl Drop for KeyManager {
    fn drop(&mut self) {
        // Tell the event listener to stop, and wait for it
        *self.stop.lock().unwrap() = true;
        if let Some(handle) = self.event_listener.take() {
            let _ = handle.join();
        }
    }
}

/// Starts a thread that listens for key events and pushes them to the key buffer.
fn event_listener(stop: Arc<Mutex<bool>>, key_buffer: Arc<KeyBuffer>) -> JoinHandle<()> {
    thread::spawn(move || {
        while !*stop.lock().unwrap() {
            // Wake up regularly to check whether we should stop
            match poll(POLL_INTERVAL) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(error) => {
                    log::error!("Could not poll for events: {}", error);
                    break;
                }
            }

            match read() {
                Ok(Event::Key(key_event)) => {
                    log::debug!("Got key {:?}", key_event);
                    key_buffer.push(key_event.code);
                }
                Ok(_) => {}
                Err(error) => {
                    log::error!("Could not read event: {}", error);
                    break;
                }
            }
        }
    })
}
