#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize, tsify::Tsify,
)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    #[default]
    Start,
    ReviewCenter,
    LevelSelection,
    LessonSelection,
    Lesson,
    Practice,
    WritingExercise,
    SessionComplete,
}

/// Which screen is showing and where the generic back button leads.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Navigator {
    current: Screen,
    previous: Screen,
}

impl Navigator {
    pub fn current(&self) -> Screen {
        self.current
    }

    pub fn previous(&self) -> Screen {
        self.previous
    }

    /// Switch screens. `from` becomes the back target; without it the back target is
    /// left as it was.
    pub fn show(&mut self, screen: Screen, from: Option<Screen>) {
        if let Some(from) = from {
            self.previous = from;
        }
        log::debug!("Showing {screen:?} (back goes to {:?})", self.previous);
        self.current = screen;
    }

    pub fn back(&mut self) -> Screen {
        self.show(self.previous, None);
        self.current
    }
}

/// A repeating tick that refreshes the review-center countdowns.
pub trait CountdownTimer {
    /// Start ticking every `period_ms`. Re-arming replaces the previous schedule.
    fn arm(&mut self, period_ms: u32);
    fn cancel(&mut self);
    fn is_armed(&self) -> bool;
}

/// A timer that never fires on its own; the host drives ticks by hand.
#[derive(Clone, Debug, Default)]
pub struct ManualTimer {
    period_ms: Option<u32>,
}

impl ManualTimer {
    pub fn period_ms(&self) -> Option<u32> {
        self.period_ms
    }
}

impl CountdownTimer for ManualTimer {
    fn arm(&mut self, period_ms: u32) {
        self.period_ms = Some(period_ms);
    }

    fn cancel(&mut self) {
        self.period_ms = None;
    }

    fn is_armed(&self) -> bool {
        self.period_ms.is_some()
    }
}

#[cfg(target_arch = "wasm32")]
pub use browser::IntervalTimer;

#[cfg(target_arch = "wasm32")]
mod browser {
    use super::CountdownTimer;

    /// `setInterval` calling back into JS, which then asks the app for status changes.
    pub struct IntervalTimer {
        callback: js_sys::Function,
        handle: Option<i32>,
    }

    impl IntervalTimer {
        pub fn new(callback: js_sys::Function) -> Self {
            Self {
                callback,
                handle: None,
            }
        }
    }

    impl CountdownTimer for IntervalTimer {
        fn arm(&mut self, period_ms: u32) {
            self.cancel();
            let Some(window) = web_sys::window() else {
                log::warn!("No window, countdown timer not started");
                return;
            };
            let timeout = i32::try_from(period_ms).unwrap_or(i32::MAX);
            match window
                .set_interval_with_callback_and_timeout_and_arguments_0(&self.callback, timeout)
            {
                Ok(handle) => self.handle = Some(handle),
                Err(e) => log::error!("Failed to start countdown timer: {e:?}"),
            }
        }

        fn cancel(&mut self) {
            let Some(handle) = self.handle.take() else {
                return;
            };
            if let Some(window) = web_sys::window() {
                window.clear_interval_with_handle(handle);
            }
        }

        fn is_armed(&self) -> bool {
            self.handle.is_some()
        }
    }

    impl Drop for IntervalTimer {
        fn drop(&mut self) {
            self.cancel();
        }
    }
}
