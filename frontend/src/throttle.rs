/// Leading-edge throttle with a coalesced trailing run.
///
/// The first call in a quiet period runs immediately and opens a window.
/// Calls that land inside the window are folded into a single run once the
/// window is released, so the last reading is never dropped. The caller owns
/// the clock: it arms a timer of [`Throttle::window_ms`] on
/// [`Admission::Run`] and calls [`Throttle::release`] when it fires.
#[derive(Clone, Debug)]
pub struct Throttle {
    window_ms: u32,
    waiting: bool,
    pending: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Run now and arm the release timer.
    Run,
    /// Swallowed; a trailing run is owed at release.
    Coalesced,
}

impl Throttle {
    pub fn new(window_ms: u32) -> Self {
        Throttle { window_ms, waiting: false, pending: false }
    }

    pub fn window_ms(&self) -> u32 {
        self.window_ms
    }

    pub fn is_waiting(&self) -> bool {
        self.waiting
    }

    pub fn admit(&mut self) -> Admission {
        if self.waiting {
            self.pending = true;
            Admission::Coalesced
        } else {
            self.waiting = true;
            Admission::Run
        }
    }

    /// Closes the window. Returns true when calls were coalesced, in which
    /// case the caller should [`admit`](Self::admit) once more.
    pub fn release(&mut self) -> bool {
        self.waiting = false;
        std::mem::take(&mut self.pending)
    }

    pub fn reset(&mut self) {
        self.waiting = false;
        self.pending = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_call_runs() {
        let mut throttle = Throttle::new(100);
        assert_eq!(throttle.admit(), Admission::Run);
        assert!(throttle.is_waiting());
    }

    #[test]
    fn burst_collapses_into_one_trailing_run() {
        let mut throttle = Throttle::new(100);
        assert_eq!(throttle.admit(), Admission::Run);
        for _ in 0..5 {
            assert_eq!(throttle.admit(), Admission::Coalesced);
        }
        assert!(throttle.release());
        assert_eq!(throttle.admit(), Admission::Run);
        assert!(!throttle.release());
        assert!(!throttle.is_waiting());
    }

    #[test]
    fn quiet_window_owes_nothing() {
        let mut throttle = Throttle::new(16);
        throttle.admit();
        assert!(!throttle.release());
    }
}
