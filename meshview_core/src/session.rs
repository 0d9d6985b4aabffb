use log::{debug, info};
use meshview_shared::loader;
use meshview_shared::prelude::*;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Identifies one submission to a session, later ones are larger
pub type RequestId = u64;

/// What the session currently holds
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// Nothing has been submitted yet
    Idle,
    /// The newest submission is still decoding
    Loading(RequestId),
    /// The newest submission decoded to this model
    Ready(Arc<GeometryModel>),
    /// The newest submission failed
    Failed(DecodeError),
}

/// Gets told about every state change a session applies
///
/// Called while the session is locked, so implementations must not call
/// back into the session.
pub trait SessionObserver: Send + Sync {
    fn state_changed(&self, state: &SessionState);
}

struct Slot {
    current: RequestId,
    state: SessionState,
}

/// Owns the currently loaded model
///
/// Only the latest submission can change the state. A decode that finishes
/// after a newer submission was made is dropped, even if it succeeded and
/// even if the newer one is still running.
pub struct IngestionSession {
    settings: Settings,
    slot: Mutex<Slot>,
    observers: Mutex<Vec<Arc<dyn SessionObserver>>>,
}

impl IngestionSession {
    pub fn new(settings: Settings) -> Self {
        IngestionSession {
            settings,
            slot: Mutex::new(Slot {
                current: 0,
                state: SessionState::Idle,
            }),
            observers: Mutex::new(vec![]),
        }
    }

    pub fn add_observer(&self, observer: Arc<dyn SessionObserver>) {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(observer);
    }

    pub fn current_state(&self) -> SessionState {
        self.lock_slot().state.clone()
    }

    /// The model if the session is ready
    pub fn current_model(&self) -> Option<Arc<GeometryModel>> {
        match &self.lock_slot().state {
            SessionState::Ready(model) => Some(model.clone()),
            _ => None,
        }
    }

    /// Start a new load and supersede whatever came before
    pub fn begin(&self) -> RequestId {
        let mut slot = self.lock_slot();
        slot.current += 1;
        let id = slot.current;

        debug!("Request {} started", id);
        self.apply(&mut slot, SessionState::Loading(id));
        id
    }

    /// Hand in the result for `id`
    ///
    /// Returns false and changes nothing when `id` is no longer the newest
    /// request.
    pub fn complete(&self, id: RequestId, result: Result<GeometryModel, DecodeError>) -> bool {
        let mut slot = self.lock_slot();

        if slot.current != id {
            debug!(
                "Discarding stale result for request {}, current is {}",
                id, slot.current
            );
            return false;
        }

        let state = match result {
            Ok(model) => {
                info!(
                    "Request {} ready: {} vertices, {} triangles",
                    id,
                    model.vertices().len(),
                    model.triangles().len()
                );
                SessionState::Ready(Arc::new(model))
            }
            Err(err) => {
                info!("Request {} failed: {}", id, err);
                SessionState::Failed(err)
            }
        };

        self.apply(&mut slot, state);
        true
    }

    /// Decode on the calling thread
    pub fn load_now(&self, data: &[u8], filename: &str) -> SessionState {
        let id = self.begin();
        let result = loader::load(data, filename, &self.settings);
        self.complete(id, result);
        self.current_state()
    }

    /// Decode on the rayon pool and return straight away
    ///
    /// Unsupported or oversized input fails before anything is spawned.
    pub fn submit(self: &Arc<Self>, data: Vec<u8>, filename: String) -> RequestId {
        let id = self.begin();

        let format = match loader::check(&data, &filename, &self.settings) {
            Ok(format) => format,
            Err(err) => {
                self.complete(id, Err(err));
                return id;
            }
        };

        let session = Arc::clone(self);
        rayon::spawn(move || {
            let result = loader::decode(format, &data, &session.settings);
            session.complete(id, result);
        });

        id
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, slot: &mut Slot, state: SessionState) {
        slot.state = state;

        let observers = self
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for observer in observers.iter() {
            observer.state_changed(&slot.state);
        }
    }
}
