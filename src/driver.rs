//! Driver façade tying the pieces together.
//!
//! One `PadDriver` exclusively owns one open device session. Protocol
//! state lives in an explicit [`DeviceProfile`] owned here and passed by
//! reference to the decoder and reconstructor. Input reports must be fed
//! in arrival order; samples are never reordered or dropped silently.

use std::sync::{Mutex, MutexGuard};

use crate::config::Config;
use crate::device::{DeviceProfile, Rgb, WritingArea};
use crate::error::{PadError, Result};
use crate::event::{EventBus, PadEvent, Subscription};
use crate::export::{self, SigningOptions};
use crate::negotiate;
use crate::protocol::codec;
use crate::protocol::pen::{decode_sample, PenSample};
use crate::protocol::{
    REPORT_BACKGROUND_COLOR, REPORT_BRIGHTNESS, REPORT_CLEAR_SCREEN, REPORT_INK_MODE,
    REPORT_PEN_COLOR_WIDTH, REPORT_WRITING_AREA, REPORT_WRITING_MODE,
};
use crate::stroke::{StrokeReconstructor, StrokeSegment};
use crate::transport::Transport;
use crate::upload::ImageUploader;

struct DriverState {
    profile: Option<DeviceProfile>,
    samples: Vec<PenSample>,
    strokes: StrokeReconstructor,
}

pub struct PadDriver<T: Transport> {
    transport: Mutex<T>,
    state: Mutex<DriverState>,
    uploader: ImageUploader,
    events: Mutex<EventBus>,
    config: Config,
}

impl<T: Transport> PadDriver<T> {
    pub fn new(transport: T, config: Config) -> Result<Self> {
        config.validate().map_err(|e| PadError::InvalidParameter(e.into()))?;
        let strokes = StrokeReconstructor::with_threshold(config.pressure_split_threshold);
        Ok(Self {
            transport: Mutex::new(transport),
            state: Mutex::new(DriverState { profile: None, samples: Vec::new(), strokes }),
            uploader: ImageUploader::new(),
            events: Mutex::new(EventBus::new()),
            config,
        })
    }

    // Lock order is state before transport; nothing acquires state while
    // holding transport.
    fn lock_state(&self) -> MutexGuard<'_, DriverState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_transport(&self) -> MutexGuard<'_, T> {
        self.transport.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: PadEvent) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).emit(&event);
    }

    /// Run capability negotiation and start a capture session.
    pub fn connect(&self) -> Result<()> {
        let profile = {
            let mut transport = self.lock_transport();
            negotiate::negotiate(&mut *transport, &self.config)?
        };
        {
            let mut state = self.lock_state();
            state.profile = Some(profile);
            state.samples.clear();
            state.strokes.reset();
        }
        self.emit(PadEvent::HidConnect);
        Ok(())
    }

    /// Drop the session: profile and capture state do not outlive it.
    pub fn disconnect(&self) {
        {
            let mut state = self.lock_state();
            state.profile = None;
            state.samples.clear();
            state.strokes.reset();
        }
        log::info!("Disconnected");
        self.emit(PadEvent::HidDisconnect);
    }

    pub fn is_connected(&self) -> bool {
        self.lock_state().profile.is_some()
    }

    /// Snapshot of the negotiated profile.
    pub fn profile(&self) -> Result<DeviceProfile> {
        self.lock_state().profile.clone().ok_or(PadError::NotConnected)
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&PadEvent) + Send + 'static,
    {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).subscribe(listener)
    }

    pub fn unsubscribe(&self, subscription: Subscription) {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).unsubscribe(subscription);
    }

    /// Feed one unsolicited input report, in arrival order. Non-pen report
    /// ids are ignored; qualifying events append exactly one sample to the
    /// log and advance the stroke scene.
    pub fn handle_input_report(&self, report_id: u8, payload: &[u8]) -> Result<()> {
        let sample = {
            let mut state = self.lock_state();
            let DriverState { profile, samples, strokes } = &mut *state;
            let profile = profile.as_ref().ok_or(PadError::NotConnected)?;
            let Some(sample) = decode_sample(profile, report_id, payload)? else {
                return Ok(());
            };
            samples.push(sample);
            strokes.feed(&sample, profile);
            sample
        };
        self.emit(PadEvent::PenSample(sample));
        Ok(())
    }

    /// The append-only sample log for the current capture session.
    pub fn samples(&self) -> Vec<PenSample> {
        self.lock_state().samples.clone()
    }

    /// Current vector scene.
    pub fn stroke_segments(&self) -> Vec<StrokeSegment> {
        self.lock_state().strokes.snapshot()
    }

    /// Set pen color and width class, skipping the device write when the
    /// cached profile already matches.
    pub fn set_pen(&self, color: Rgb, width: u8) -> Result<()> {
        let payload = codec::encode_pen_color_width(color, width)?;
        let mut state = self.lock_state();
        let profile = state.profile.as_mut().ok_or(PadError::NotConnected)?;
        if profile.pen_color == color && profile.pen_width == width {
            log::debug!("Pen color/width already {} class {}, skipping write", color, width);
            return Ok(());
        }
        self.lock_transport().send_feature_report(REPORT_PEN_COLOR_WIDTH, &payload)?;
        profile.pen_color = color;
        profile.pen_width = width;
        Ok(())
    }

    pub fn set_background(&self, color: Rgb) -> Result<()> {
        let payload = codec::encode_background_color(color);
        let mut state = self.lock_state();
        let profile = state.profile.as_mut().ok_or(PadError::NotConnected)?;
        if profile.background == color {
            return Ok(());
        }
        self.lock_transport().send_feature_report(REPORT_BACKGROUND_COLOR, &payload)?;
        profile.background = color;
        Ok(())
    }

    pub fn set_backlight(&self, intensity: u8) -> Result<()> {
        let payload = codec::encode_brightness(intensity)?;
        let mut state = self.lock_state();
        let profile = state.profile.as_mut().ok_or(PadError::NotConnected)?;
        if profile.backlight == intensity {
            return Ok(());
        }
        self.lock_transport().send_feature_report(REPORT_BRIGHTNESS, &payload)?;
        profile.backlight = intensity;
        Ok(())
    }

    pub fn set_ink_enabled(&self, enabled: bool) -> Result<()> {
        let payload = codec::encode_ink_mode(enabled);
        let mut state = self.lock_state();
        let profile = state.profile.as_mut().ok_or(PadError::NotConnected)?;
        if profile.ink_enabled == enabled {
            return Ok(());
        }
        self.lock_transport().send_feature_report(REPORT_INK_MODE, &payload)?;
        profile.ink_enabled = enabled;
        Ok(())
    }

    pub fn set_writing_mode(&self, mode: u8) -> Result<()> {
        let payload = codec::encode_writing_mode(mode)?;
        let mut state = self.lock_state();
        let profile = state.profile.as_mut().ok_or(PadError::NotConnected)?;
        if profile.writing_mode == mode {
            return Ok(());
        }
        self.lock_transport().send_feature_report(REPORT_WRITING_MODE, &payload)?;
        profile.writing_mode = mode;
        Ok(())
    }

    pub fn set_writing_area(&self, area: WritingArea) -> Result<()> {
        let payload = codec::encode_writing_area(&area)?;
        let mut state = self.lock_state();
        let profile = state.profile.as_mut().ok_or(PadError::NotConnected)?;
        if profile.writing_area == area {
            return Ok(());
        }
        self.lock_transport().send_feature_report(REPORT_WRITING_AREA, &payload)?;
        profile.writing_area = area;
        Ok(())
    }

    /// Clear the device screen and atomically reset the capture session.
    pub fn clear_screen(&self) -> Result<()> {
        let mut state = self.lock_state();
        if state.profile.is_none() {
            return Err(PadError::NotConnected);
        }
        self.lock_transport()
            .send_feature_report(REPORT_CLEAR_SCREEN, &codec::encode_clear_screen())?;
        state.samples.clear();
        state.strokes.reset();
        log::debug!("Screen cleared, sample log reset");
        Ok(())
    }

    /// Upload a full-screen BGR24 bitmap. On success the sample log and
    /// stroke scene are reset: the device screen no longer matches them.
    /// On failure both are left untouched.
    pub fn upload_image(&self, bitmap: &[u8], width: usize, height: usize) -> Result<()> {
        let chunk_size = {
            let state = self.lock_state();
            let profile = state.profile.as_ref().ok_or(PadError::NotConnected)?;
            profile.image_chunk_size
        };
        self.uploader.upload(&self.transport, chunk_size, bitmap, width, height)?;
        let mut state = self.lock_state();
        state.samples.clear();
        state.strokes.reset();
        Ok(())
    }

    /// Serialize the current scene, optionally signing it.
    pub fn export(&self, signing: Option<&SigningOptions>) -> Result<String> {
        let state = self.lock_state();
        let profile = state.profile.as_ref().ok_or(PadError::NotConnected)?;
        export::export(profile, &state.samples, &state.strokes.snapshot(), signing)
    }
}
