//! Tick-driven fade state machine shared by one tile or one whole segment.

use std::time::Duration;

use lava_runner_core::DisappearSettings;

/// Observable phase of a disappearing tile.
///
/// The cycle is `Visible`, `FadingOut`, `Hidden` or `WaitingToReappear`, then
/// `FadingIn`. `Pending` is a sub-state of `Visible`: the tile presents as fully
/// visible and solid while the touch delay counts down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisappearPhase {
    /// Fully visible and solid; waiting for a touch.
    Visible,
    /// Visible and solid after a touch, counting down before the fade-out starts.
    Pending,
    /// Alpha decreasing linearly towards zero.
    FadingOut,
    /// Invisible without solid collision; terminal unless a reappear delay is set.
    Hidden,
    /// Invisible without solid collision, counting down to the fade-in.
    WaitingToReappear,
    /// Solid again while alpha increases linearly towards one.
    FadingIn,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    Visible,
    Pending { remaining: Duration },
    FadingOut { progress: Duration },
    Hidden,
    Waiting { remaining: Duration },
    FadingIn { progress: Duration },
}

/// Presentation produced by a machine after it advanced.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Presentation {
    pub(crate) alpha: f32,
    pub(crate) solid: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct DisappearMachine {
    settings: DisappearSettings,
    state: State,
}

impl DisappearMachine {
    pub(crate) fn new(settings: DisappearSettings) -> Self {
        Self {
            settings,
            state: State::Visible,
        }
    }

    pub(crate) fn settings(&self) -> &DisappearSettings {
        &self.settings
    }

    pub(crate) fn phase(&self) -> DisappearPhase {
        match self.state {
            State::Visible => DisappearPhase::Visible,
            State::Pending { .. } => DisappearPhase::Pending,
            State::FadingOut { .. } => DisappearPhase::FadingOut,
            State::Hidden => DisappearPhase::Hidden,
            State::Waiting { .. } => DisappearPhase::WaitingToReappear,
            State::FadingIn { .. } => DisappearPhase::FadingIn,
        }
    }

    /// Starts the countdown; touches outside `Visible` are ignored.
    pub(crate) fn trigger(&mut self) -> bool {
        if self.state != State::Visible {
            return false;
        }
        self.state = State::Pending {
            remaining: self.settings.delay_before_disappear,
        };
        self.settle();
        true
    }

    /// Consumes `dt`, carrying leftover time across every transition it crosses.
    pub(crate) fn advance(&mut self, dt: Duration) {
        let mut budget = dt;
        loop {
            self.settle();
            if budget.is_zero() {
                return;
            }
            match self.state {
                State::Visible | State::Hidden => return,
                State::Pending { remaining } => {
                    let spent = budget.min(remaining);
                    budget -= spent;
                    self.state = State::Pending {
                        remaining: remaining - spent,
                    };
                }
                State::FadingOut { progress } => {
                    let spent = budget.min(self.settings.fade_duration - progress);
                    budget -= spent;
                    self.state = State::FadingOut {
                        progress: progress + spent,
                    };
                }
                State::Waiting { remaining } => {
                    let spent = budget.min(remaining);
                    budget -= spent;
                    self.state = State::Waiting {
                        remaining: remaining - spent,
                    };
                }
                State::FadingIn { progress } => {
                    let spent = budget.min(self.settings.fade_duration - progress);
                    budget -= spent;
                    self.state = State::FadingIn {
                        progress: progress + spent,
                    };
                }
            }
        }
    }

    pub(crate) fn presentation(&self) -> Presentation {
        let fade = self.settings.fade_duration;
        match self.state {
            State::Visible | State::Pending { .. } => Presentation {
                alpha: 1.0,
                solid: true,
            },
            State::FadingOut { progress } => Presentation {
                alpha: 1.0 - fraction(progress, fade),
                solid: true,
            },
            State::Hidden | State::Waiting { .. } => Presentation {
                alpha: 0.0,
                solid: false,
            },
            State::FadingIn { progress } => Presentation {
                alpha: fraction(progress, fade),
                solid: true,
            },
        }
    }

    /// Applies every transition whose timer already expired.
    fn settle(&mut self) {
        loop {
            let next = match self.state {
                State::Pending { remaining } if remaining.is_zero() => State::FadingOut {
                    progress: Duration::ZERO,
                },
                State::FadingOut { progress } if progress >= self.settings.fade_duration => {
                    match self.settings.reappear_delay {
                        Some(delay) => State::Waiting { remaining: delay },
                        None => State::Hidden,
                    }
                }
                State::Waiting { remaining } if remaining.is_zero() => State::FadingIn {
                    progress: Duration::ZERO,
                },
                State::FadingIn { progress } if progress >= self.settings.fade_duration => {
                    State::Visible
                }
                _ => return,
            };
            self.state = next;
        }
    }
}

fn fraction(progress: Duration, total: Duration) -> f32 {
    if total.is_zero() {
        1.0
    } else {
        (progress.as_secs_f32() / total.as_secs_f32()).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lava_runner_core::DisappearScope;

    fn settings(delay_ms: u64, fade_ms: u64, reappear_ms: Option<u64>) -> DisappearSettings {
        DisappearSettings {
            delay_before_disappear: Duration::from_millis(delay_ms),
            fade_duration: Duration::from_millis(fade_ms),
            reappear_delay: reappear_ms.map(Duration::from_millis),
            scope: DisappearScope::Tile,
            exempt_hazard_tiles: true,
        }
    }

    #[test]
    fn fade_out_starts_exactly_after_delay() {
        let mut machine = DisappearMachine::new(settings(500, 250, None));
        assert!(machine.trigger());
        machine.advance(Duration::from_millis(250));
        assert_eq!(machine.phase(), DisappearPhase::Pending);
        assert_eq!(
            machine.presentation(),
            Presentation {
                alpha: 1.0,
                solid: true
            }
        );
        assert!(!machine.trigger());
        machine.advance(Duration::from_millis(250));
        assert_eq!(machine.phase(), DisappearPhase::FadingOut);
        assert_eq!(machine.presentation().alpha, 1.0);
        machine.advance(Duration::from_millis(125));
        assert!((machine.presentation().alpha - 0.5).abs() < 1e-6);
        machine.advance(Duration::from_millis(125));
        assert_eq!(machine.phase(), DisappearPhase::Hidden);
        assert!(!machine.presentation().solid);
    }

    #[test]
    fn leftover_time_crosses_several_transitions() {
        let mut machine = DisappearMachine::new(settings(100, 100, Some(100)));
        assert!(machine.trigger());
        machine.advance(Duration::from_millis(350));
        assert_eq!(machine.phase(), DisappearPhase::FadingIn);
        let presentation = machine.presentation();
        assert!(presentation.solid);
        assert!((presentation.alpha - 0.5).abs() < 1e-6);
        machine.advance(Duration::from_millis(50));
        assert_eq!(machine.phase(), DisappearPhase::Visible);
        assert!(machine.trigger());
    }

    #[test]
    fn hidden_without_reappear_is_terminal() {
        let mut machine = DisappearMachine::new(settings(0, 0, None));
        assert!(machine.trigger());
        assert_eq!(machine.phase(), DisappearPhase::Hidden);
        machine.advance(Duration::from_secs(60));
        assert_eq!(machine.phase(), DisappearPhase::Hidden);
        assert!(!machine.trigger());
    }

    #[test]
    fn touches_while_busy_are_ignored() {
        let mut machine = DisappearMachine::new(settings(500, 250, None));
        assert!(machine.trigger());
        machine.advance(Duration::from_millis(400));
        assert!(!machine.trigger());
        machine.advance(Duration::from_millis(100));
        assert_eq!(machine.phase(), DisappearPhase::FadingOut);
    }
}
