//! Presentation-side scan state: cooldown between repeated scans, flash
//! mode, and the result currently on screen.
//!
//! The state is owned by whoever drives the capture loop and passed by
//! reference; nothing here is global.

use crate::models::ScanResult;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum FlashMode {
    #[default]
    Off,
    On,
    Auto,
}

impl FlashMode {
    pub(crate) fn next(self) -> Self {
        match self {
            FlashMode::Off => FlashMode::On,
            FlashMode::On => FlashMode::Auto,
            FlashMode::Auto => FlashMode::Off,
        }
    }
}

/// Why a decoded payload was not passed on for classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Rejection {
    Blank,
    /// Same payload as the last accepted one, inside the cooldown window.
    Cooldown,
}

#[derive(Debug)]
pub(crate) struct ScanSession {
    cooldown: Duration,
    last_accepted: Option<(String, Instant)>,
    current: Option<ScanResult>,
    flash: FlashMode,
    accepted: u64,
    rejected: u64,
}

impl ScanSession {
    pub(crate) fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_accepted: None,
            current: None,
            flash: FlashMode::default(),
            accepted: 0,
            rejected: 0,
        }
    }

    /// Decides whether a decoded payload should be classified.
    ///
    /// Blank input is always rejected. A payload identical to the previously
    /// accepted one is rejected until `cooldown` has elapsed since it was accepted.
    pub(crate) fn admit(&mut self, raw: &str, now: Instant) -> Result<(), Rejection> {
        if raw.trim().is_empty() {
            self.rejected += 1;
            return Err(Rejection::Blank);
        }

        if let Some((last, at)) = &self.last_accepted {
            if last == raw && now.saturating_duration_since(*at) < self.cooldown {
                tracing::trace!(target: "scan_session", "Ignoring repeated scan inside cooldown");
                self.rejected += 1;
                return Err(Rejection::Cooldown);
            }
        }

        self.last_accepted = Some((raw.to_string(), now));
        self.accepted += 1;
        Ok(())
    }

    /// Puts a result on screen, replacing the previous one.
    pub(crate) fn show(&mut self, result: ScanResult) {
        self.current = Some(result);
    }

    pub(crate) fn current(&self) -> Option<&ScanResult> {
        self.current.as_ref()
    }

    /// Dismisses the current result. The cooldown is reset so the same code
    /// can be scanned again right away.
    pub(crate) fn dismiss(&mut self) -> Option<ScanResult> {
        self.last_accepted = None;
        self.current.take()
    }

    pub(crate) fn toggle_flash(&mut self) -> FlashMode {
        self.flash = self.flash.next();
        self.flash
    }

    pub(crate) fn flash(&self) -> FlashMode {
        self.flash
    }

    /// Returns `(accepted, rejected)` scan counts.
    pub(crate) fn counts(&self) -> (u64, u64) {
        (self.accepted, self.rejected)
    }
}
