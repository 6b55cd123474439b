// This is free and unencumbered software released into the public domain.

use super::{
    CameraDevice, CameraResult, CameraStatus, CaptureRequest, CaptureSessionOutputContainer,
    MessageContext,
};
use crate::shared::SessionMsg;
use core::{
    ffi::{c_int, c_void},
    mem::zeroed,
    ptr::null_mut,
};
use ndk_sys::{
    ACameraCaptureSession, ACameraCaptureSession_captureCallbacks, ACameraCaptureSession_close,
    ACameraCaptureSession_setRepeatingRequest, ACameraCaptureSession_stateCallbacks,
    ACameraCaptureSession_stopRepeating, ACameraDevice_createCaptureSession,
};
use tracing::{debug, trace, warn};

/// A capture session over the outputs it was created with.
#[derive(Debug)]
pub struct CameraCaptureSession {
    handle: *mut ACameraCaptureSession,
    _state_callbacks: Box<ACameraCaptureSession_stateCallbacks>,
    capture_callbacks: Box<ACameraCaptureSession_captureCallbacks>,
    // Outputs and the repeating request stay alive with the session.
    _outputs: CaptureSessionOutputContainer,
    request: Option<CaptureRequest>,
}

impl Drop for CameraCaptureSession {
    fn drop(&mut self) {
        self.close()
    }
}

impl CameraCaptureSession {
    pub fn open(
        device: &CameraDevice,
        outputs: CaptureSessionOutputContainer,
        context: &MessageContext,
    ) -> CameraResult<Self> {
        unsafe extern "C" fn on_ready(_context: *mut c_void, session: *mut ACameraCaptureSession) {
            trace!(?session, "capture session ready");
        }

        unsafe extern "C" fn on_active(_context: *mut c_void, session: *mut ACameraCaptureSession) {
            trace!(?session, "capture session active");
        }

        unsafe extern "C" fn on_closed(_context: *mut c_void, session: *mut ACameraCaptureSession) {
            debug!(?session, "capture session closed");
        }

        unsafe extern "C" fn on_sequence_completed(
            context: *mut c_void,
            _session: *mut ACameraCaptureSession,
            sequence_id: c_int,
            frame_number: i64,
        ) {
            let msg = SessionMsg::CaptureSequenceCompleted {
                sequence_id,
                frame_number,
            };
            unsafe { MessageContext::post(context, msg) };
        }

        let mut state_callbacks: Box<ACameraCaptureSession_stateCallbacks> =
            Box::new(unsafe { zeroed() });
        state_callbacks.context = context.as_ptr();
        state_callbacks.onReady = Some(on_ready);
        state_callbacks.onActive = Some(on_active);
        state_callbacks.onClosed = Some(on_closed);

        let mut capture_callbacks: Box<ACameraCaptureSession_captureCallbacks> =
            Box::new(unsafe { zeroed() });
        capture_callbacks.context = context.as_ptr();
        capture_callbacks.onCaptureSequenceCompleted = Some(on_sequence_completed);

        let mut handle = null_mut();
        // See: https://developer.android.com/ndk/reference/group/camera#acameradevice_createcapturesession
        CameraStatus::check(unsafe {
            ACameraDevice_createCaptureSession(
                device.handle,
                outputs.handle,
                &*state_callbacks,
                &mut handle,
            )
        })?;

        Ok(Self {
            handle,
            _state_callbacks: state_callbacks,
            capture_callbacks,
            _outputs: outputs,
            request: None,
        })
    }

    /// Replaces the repeating request.
    ///
    /// See: https://developer.android.com/ndk/reference/group/camera#acameracapturesession_setrepeatingrequest
    pub fn set_repeating_request(&mut self, request: CaptureRequest) -> CameraResult {
        let mut requests = request.handle;
        let mut sequence_id = 0;
        CameraStatus::check(unsafe {
            ACameraCaptureSession_setRepeatingRequest(
                self.handle,
                &mut *self.capture_callbacks,
                1,
                &mut requests,
                &mut sequence_id,
            )
        })?;
        trace!(sequence_id, "repeating request set");
        self.request = Some(request);
        Ok(())
    }

    /// See: https://developer.android.com/ndk/reference/group/camera#acameracapturesession_stoprepeating
    pub fn stop_repeating(&mut self) -> CameraResult {
        CameraStatus::check(unsafe { ACameraCaptureSession_stopRepeating(self.handle) })
    }

    pub fn close(&mut self) {
        if self.handle.is_null() {
            return;
        }
        if self.request.is_some() {
            if let Err(status) = self.stop_repeating() {
                warn!(%status, "failed to stop repeating request");
            }
        }
        unsafe { ACameraCaptureSession_close(self.handle) };
        self.handle = null_mut();
        self.request = None;
    }
}
