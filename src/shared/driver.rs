// This is free and unencumbered software released into the public domain.

use crate::shared::{
    CameraError, CameraPlatform, CameraSession, Facing, Frame, SessionMsg, SessionState,
};
use std::{
    sync::{
        Arc, RwLock,
        mpsc::{Receiver, SyncSender, TrySendError, sync_channel},
    },
    thread::JoinHandle,
};
use tracing::{debug, error};

pub type FrameSink = Arc<dyn Fn(&Frame) + Send + Sync + 'static>;

/// Consumers of converted frames, shared between the host and the camera
/// thread.
#[derive(Clone, Default)]
pub struct FrameSinks(Arc<RwLock<Vec<FrameSink>>>);

impl core::fmt::Debug for FrameSinks {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("FrameSinks").field(&self.len()).finish()
    }
}

impl FrameSinks {
    pub fn add(&self, sink: FrameSink) {
        if let Ok(mut g) = self.0.write() {
            g.push(sink);
        }
    }

    pub fn len(&self) -> usize {
        self.0.read().map(|g| g.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sinks run outside the lock, so they may add further sinks.
    pub fn publish(&self, frame: &Frame) {
        let list = match self.0.read() {
            Ok(list) => list.clone(),
            Err(_) => return,
        };
        for s in list.iter() {
            (s)(frame);
        }
    }
}

#[derive(Debug)]
pub enum CameraEvent {
    Started,
    Stopped,
    StateChanged {
        from: SessionState,
        to: SessionState,
    },
    FrameDropped {
        sequence: u64,
    },
    Error {
        error: CameraError,
    },
}

/// The dedicated background thread that owns a [`CameraSession`].
///
/// Host commands and platform callbacks go through the same bounded queue
/// and are handled strictly in order, one at a time.
pub struct CameraThread {
    tx: SyncSender<SessionMsg>,
    sinks: FrameSinks,
    events_rx: Receiver<CameraEvent>,
    join: Option<JoinHandle<()>>,
}

impl core::fmt::Debug for CameraThread {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CameraThread")
            .field("sinks", &self.sinks)
            .field("running", &self.join.is_some())
            .finish()
    }
}

impl CameraThread {
    /// Builds the session with a sender the platform can post callbacks to,
    /// then moves it onto a new thread.
    pub fn spawn<P, F>(capacity: usize, build: F) -> Result<Self, CameraError>
    where
        P: CameraPlatform + 'static,
        F: FnOnce(SyncSender<SessionMsg>) -> Result<CameraSession<P>, CameraError>,
    {
        let (tx, rx) = sync_channel::<SessionMsg>(capacity.max(1));
        let (events_tx, events_rx) = sync_channel::<CameraEvent>(capacity.max(1) * 4);

        let mut session = build(tx.clone())?;
        session.set_events(events_tx.clone());
        let sinks = session.sinks();

        let join = std::thread::Builder::new()
            .name("camera".into())
            .spawn(move || run(session, rx, events_tx))
            .map_err(|e| CameraError::driver("spawning camera thread", e))?;

        Ok(Self {
            tx,
            sinks,
            events_rx,
            join: Some(join),
        })
    }

    pub fn sender(&self) -> SyncSender<SessionMsg> {
        self.tx.clone()
    }

    pub fn send(&self, msg: SessionMsg) -> Result<(), CameraError> {
        self.tx.send(msg).map_err(|_| CameraError::Closed)
    }

    /// Like [`send`](Self::send) but gives up when the queue is full.
    pub fn try_send(&self, msg: SessionMsg) -> Result<bool, CameraError> {
        match self.tx.try_send(msg) {
            Ok(()) => Ok(true),
            Err(TrySendError::Full(_)) => Ok(false),
            Err(TrySendError::Disconnected(_)) => Err(CameraError::Closed),
        }
    }

    pub fn open(&self, facing: Facing) -> Result<(), CameraError> {
        self.send(SessionMsg::Open { facing })
    }

    pub fn close(&self) -> Result<(), CameraError> {
        self.send(SessionMsg::Close)
    }

    pub fn start_preview(&self) -> Result<(), CameraError> {
        self.send(SessionMsg::StartPreview)
    }

    pub fn change_resolution(&self, width: u32, height: u32) -> Result<(), CameraError> {
        self.send(SessionMsg::ChangeResolution { width, height })
    }

    pub fn switch_camera(&self) -> Result<(), CameraError> {
        self.send(SessionMsg::SwitchCamera)
    }

    pub fn add_sink(&self, sink: FrameSink) {
        self.sinks.add(sink);
    }

    pub fn events(&self) -> &Receiver<CameraEvent> {
        &self.events_rx
    }

    /// Closes the camera and joins the thread.
    pub fn stop(&mut self) {
        let Some(join) = self.join.take() else {
            return;
        };
        let _ = self.tx.send(SessionMsg::Shutdown);
        if join.join().is_err() {
            error!("camera thread panicked");
        }
    }
}

impl Drop for CameraThread {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<P: CameraPlatform>(
    mut session: CameraSession<P>,
    rx: Receiver<SessionMsg>,
    events_tx: SyncSender<CameraEvent>,
) {
    let _ = events_tx.try_send(CameraEvent::Started);
    debug!(platform = %session.platform().name(), "camera thread started");

    while let Ok(msg) = rx.recv() {
        if msg == SessionMsg::Shutdown {
            break;
        }
        if let Err(error) = session.handle(msg) {
            error!(%error, "camera command failed");
            let _ = events_tx.try_send(CameraEvent::Error { error });
        }
    }

    session.close();
    debug!("camera thread stopped");
    let _ = events_tx.try_send(CameraEvent::Stopped);
}
