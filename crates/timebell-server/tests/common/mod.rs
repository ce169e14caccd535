#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use timebell_server::{AppState, Clock, WallTime};
use timebell_store::ConfigStore;
use timebell_types::PlayRequest;
use timebell_voice::{Announcer, TtsClient, TtsConfig};

/// A clock that reads whatever the test last set.
#[derive(Debug)]
pub struct FixedClock(Mutex<WallTime>);

impl FixedClock {
    pub fn at(hour: u8, minute: u8) -> Arc<Self> {
        Arc::new(Self(Mutex::new(WallTime::new(hour, minute))))
    }

    pub fn set(&self, hour: u8, minute: u8) {
        *self.0.lock().unwrap() = WallTime::new(hour, minute);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> WallTime {
        *self.0.lock().unwrap()
    }
}

/// An announcer that only records what it was asked to dispatch.
#[derive(Debug, Default)]
pub struct RecordingAnnouncer {
    dispatched: Mutex<Vec<PlayRequest>>,
}

impl RecordingAnnouncer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn dispatched(&self) -> Vec<PlayRequest> {
        self.dispatched.lock().unwrap().clone()
    }
}

impl Announcer for RecordingAnnouncer {
    fn dispatch(&self, request: PlayRequest) {
        self.dispatched.lock().unwrap().push(request);
    }
}

pub fn store_in(dir: &Path) -> ConfigStore {
    ConfigStore::open(dir.join("config.json")).unwrap()
}

pub fn state(
    store: ConfigStore,
    announcer: Arc<dyn Announcer>,
    clock: Arc<dyn Clock>,
    tts_url: &str,
) -> AppState {
    AppState {
        store,
        announcer,
        tts: TtsClient::new(&TtsConfig::new(tts_url)),
        clock,
        frontend_dir: None,
    }
}
