//! Narrative announcement overlays and their fade sequencing.
//!
//! Announcements play strictly one after another. Each goes through
//! `Hidden → FadingIn → Holding → FadingOut → Hidden`; the next one only
//! starts fading in once the previous one has fully faded out. Time is fed in
//! explicitly with [`AnnouncementQueue::advance`], so the same queue runs
//! under a frame loop, a tokio interval or a test script.

use std::collections::VecDeque;
use std::time::Duration;

use lobo_core::role::{Role, UNKNOWN_ROLE};

use crate::phase_timer::Phase;

/// What an announcement is about. Front-ends pick artwork from this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnouncementKind {
    Banner,
    RoleReveal,
    GameStart,
    NightFalls,
    DayBreaks,
    Narration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Announcement {
    pub kind: AnnouncementKind,
    pub text: String,
}

impl Announcement {
    pub fn new(kind: AnnouncementKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Night => Self::new(
                AnnouncementKind::NightFalls,
                "Cae la noche en Castronegro. Los lobos salen de caza.",
            ),
            Phase::Day => Self::new(
                AnnouncementKind::DayBreaks,
                "Amanece en Castronegro. El pueblo se reúne para votar.",
            ),
        }
    }
}

/// The opening sequence: banner, role reveal, "the game begins".
pub fn intro_chain(role: Option<Role>) -> [Announcement; 3] {
    let info = role.map_or(UNKNOWN_ROLE, Role::info);
    [
        Announcement::new(AnnouncementKind::Banner, "Bienvenidos a Castronegro"),
        Announcement::new(
            AnnouncementKind::RoleReveal,
            format!("Eres {}. {}", info.display_name, info.ability_text),
        ),
        Announcement::new(AnnouncementKind::GameStart, "¡Que empiece la partida!"),
    ]
}

/// Fade timings shared by every announcement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub fade_in: Duration,
    pub hold: Duration,
    pub fade_out: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            fade_in: Duration::from_millis(800),
            hold: Duration::from_millis(2_500),
            fade_out: Duration::from_millis(800),
        }
    }
}

/// Where the active announcement is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Stage {
    Hidden,
    FadingIn { elapsed: Duration },
    Holding { elapsed: Duration },
    /// `from` is the opacity the fade-out started at (below 1 after a skip
    /// during fade-in).
    FadingOut { elapsed: Duration, from: f32 },
}

/// Transition notifications produced while advancing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageEvent {
    FadeInStarted(AnnouncementKind),
    FadeInCompleted(AnnouncementKind),
    HoldCompleted(AnnouncementKind),
    FadeOutCompleted(AnnouncementKind),
}

#[derive(Debug, Clone)]
struct Active {
    announcement: Announcement,
    stage: Stage,
}

#[derive(Debug, Clone, Default)]
pub struct AnnouncementQueue {
    pending: VecDeque<Announcement>,
    active: Option<Active>,
    timing: Timing,
}

fn fraction(elapsed: Duration, total: Duration) -> f32 {
    if total.is_zero() {
        1.0
    } else {
        (elapsed.as_secs_f32() / total.as_secs_f32()).clamp(0.0, 1.0)
    }
}

impl AnnouncementQueue {
    pub fn new(timing: Timing) -> Self {
        Self {
            pending: VecDeque::new(),
            active: None,
            timing,
        }
    }

    pub fn push(&mut self, announcement: Announcement) {
        self.pending.push_back(announcement);
    }

    pub fn extend(&mut self, announcements: impl IntoIterator<Item = Announcement>) {
        self.pending.extend(announcements);
    }

    /// Nothing is on screen (there may still be pending announcements
    /// waiting for the next [`advance`](Self::advance)).
    pub fn is_idle(&self) -> bool {
        self.active.is_none()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_none() && self.pending.is_empty()
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn current(&self) -> Option<&Announcement> {
        self.active.as_ref().map(|a| &a.announcement)
    }

    pub fn stage(&self) -> Stage {
        self.active.as_ref().map_or(Stage::Hidden, |a| a.stage)
    }

    /// Opacity of the active announcement, 0 when idle.
    pub fn opacity(&self) -> f32 {
        match self.stage() {
            Stage::Hidden => 0.0,
            Stage::FadingIn { elapsed } => fraction(elapsed, self.timing.fade_in),
            Stage::Holding { .. } => 1.0,
            Stage::FadingOut { elapsed, from } => {
                from * (1.0 - fraction(elapsed, self.timing.fade_out))
            }
        }
    }

    /// Whether an announcement of `kind` is currently on screen.
    pub fn is_visible(&self, kind: AnnouncementKind) -> bool {
        self.current().is_some_and(|a| a.kind == kind)
    }

    /// Interrupt the active announcement's fade-in or hold and send it
    /// straight to its fade-out. Only the active announcement is affected;
    /// the queue resumes normally afterwards. Returns `false` (and changes
    /// nothing) when idle or already fading out.
    pub fn skip(&mut self) -> bool {
        let opacity = self.opacity();
        let Some(active) = self.active.as_mut() else {
            return false;
        };
        match active.stage {
            Stage::FadingIn { .. } | Stage::Holding { .. } => {
                active.stage = Stage::FadingOut {
                    elapsed: Duration::ZERO,
                    from: opacity,
                };
                true
            }
            Stage::FadingOut { .. } | Stage::Hidden => false,
        }
    }

    /// Let `dt` of time pass, returning every transition that happened, in
    /// order. Leftover time after a transition carries into the next stage.
    pub fn advance(&mut self, dt: Duration) -> Vec<StageEvent> {
        let mut events = Vec::new();
        let mut budget = dt;

        loop {
            if self.active.is_none() {
                let Some(next) = self.pending.pop_front() else {
                    break;
                };
                events.push(StageEvent::FadeInStarted(next.kind));
                self.active = Some(Active {
                    announcement: next,
                    stage: Stage::FadingIn {
                        elapsed: Duration::ZERO,
                    },
                });
            }
            let Some(active) = self.active.as_mut() else {
                break;
            };
            let kind = active.announcement.kind;
            let stage = active.stage;

            let (elapsed, total) = match stage {
                Stage::FadingIn { elapsed } => (elapsed, self.timing.fade_in),
                Stage::Holding { elapsed } => (elapsed, self.timing.hold),
                Stage::FadingOut { elapsed, .. } => (elapsed, self.timing.fade_out),
                Stage::Hidden => (Duration::ZERO, Duration::ZERO),
            };
            let left = total.saturating_sub(elapsed);

            if budget < left {
                let elapsed = elapsed + budget;
                active.stage = match stage {
                    Stage::FadingIn { .. } => Stage::FadingIn { elapsed },
                    Stage::Holding { .. } => Stage::Holding { elapsed },
                    Stage::FadingOut { from, .. } => Stage::FadingOut { elapsed, from },
                    Stage::Hidden => Stage::Hidden,
                };
                break;
            }
            budget -= left;

            match stage {
                Stage::FadingIn { .. } => {
                    active.stage = Stage::Holding {
                        elapsed: Duration::ZERO,
                    };
                    events.push(StageEvent::FadeInCompleted(kind));
                }
                Stage::Holding { .. } => {
                    active.stage = Stage::FadingOut {
                        elapsed: Duration::ZERO,
                        from: 1.0,
                    };
                    events.push(StageEvent::HoldCompleted(kind));
                }
                Stage::FadingOut { .. } | Stage::Hidden => {
                    self.active = None;
                    events.push(StageEvent::FadeOutCompleted(kind));
                }
            }
        }
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing() -> Timing {
        Timing {
            fade_in: Duration::from_millis(100),
            hold: Duration::from_millis(300),
            fade_out: Duration::from_millis(100),
        }
    }

    fn intro_queue() -> AnnouncementQueue {
        let mut queue = AnnouncementQueue::new(timing());
        queue.extend(intro_chain(Some(Role::Bruja)));
        queue
    }

    /// Run the queue in fixed steps, stamping each event with the time it
    /// was reported.
    fn run(queue: &mut AnnouncementQueue, step_ms: u64, steps: usize) -> Vec<(u64, StageEvent)> {
        let mut log = Vec::new();
        for i in 0..steps {
            let now = (i as u64 + 1) * step_ms;
            for ev in queue.advance(Duration::from_millis(step_ms)) {
                log.push((now, ev));
            }
        }
        log
    }

    fn position(log: &[(u64, StageEvent)], event: StageEvent) -> usize {
        log.iter().position(|(_, e)| *e == event).unwrap()
    }

    #[test]
    fn intro_stages_never_overlap() {
        use AnnouncementKind::*;
        let mut queue = intro_queue();
        let log = run(&mut queue, 30, 100);

        let chain = [Banner, RoleReveal, GameStart];
        for pair in chain.windows(2) {
            let out = position(&log, StageEvent::FadeOutCompleted(pair[0]));
            let next_in = position(&log, StageEvent::FadeInStarted(pair[1]));
            assert!(out < next_in);
            assert!(log[out].0 <= log[next_in].0);
        }
        for kind in chain {
            let started = position(&log, StageEvent::FadeInStarted(kind));
            let faded_in = position(&log, StageEvent::FadeInCompleted(kind));
            let held = position(&log, StageEvent::HoldCompleted(kind));
            let gone = position(&log, StageEvent::FadeOutCompleted(kind));
            assert!(started < faded_in && faded_in < held && held < gone);
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn full_cycle_timing() {
        let mut queue = AnnouncementQueue::new(timing());
        queue.push(Announcement::for_phase(Phase::Night));

        queue.advance(Duration::ZERO);
        assert_eq!(queue.opacity(), 0.0);
        queue.advance(Duration::from_millis(50));
        assert!((queue.opacity() - 0.5).abs() < 1e-4);
        queue.advance(Duration::from_millis(50));
        assert!(matches!(queue.stage(), Stage::Holding { .. }));
        assert_eq!(queue.opacity(), 1.0);
        queue.advance(Duration::from_millis(350));
        assert!(matches!(queue.stage(), Stage::FadingOut { .. }));
        assert!((queue.opacity() - 0.5).abs() < 1e-4);
        let events = queue.advance(Duration::from_millis(50));
        assert_eq!(
            events,
            vec![StageEvent::FadeOutCompleted(AnnouncementKind::NightFalls)]
        );
        assert!(queue.is_idle());
    }

    #[test]
    fn skip_during_hold_goes_to_fade_out_then_resumes() {
        use AnnouncementKind::*;
        let mut queue = intro_queue();
        queue.advance(Duration::from_millis(150));
        assert!(matches!(queue.stage(), Stage::Holding { .. }));
        assert!(queue.is_visible(Banner));

        assert!(queue.skip());
        assert!(matches!(queue.stage(), Stage::FadingOut { .. }));
        assert_eq!(queue.current().map(|a| a.kind), Some(Banner));
        assert_eq!(queue.pending(), 2);

        let events = queue.advance(Duration::from_millis(100));
        assert_eq!(
            events,
            vec![StageEvent::FadeOutCompleted(Banner), StageEvent::FadeInStarted(RoleReveal)]
        );
        assert!(queue.is_visible(RoleReveal));
    }

    #[test]
    fn skip_during_fade_in_keeps_current_opacity() {
        let mut queue = intro_queue();
        queue.advance(Duration::from_millis(40));
        let before = queue.opacity();
        assert!(queue.skip());
        assert!((queue.opacity() - before).abs() < 1e-4);
        match queue.stage() {
            Stage::FadingOut { from, .. } => assert!((from - 0.4).abs() < 1e-4),
            other => panic!("expected fade-out, got {other:?}"),
        }
    }

    #[test]
    fn skip_never_skips_more_than_current() {
        let mut queue = intro_queue();
        queue.advance(Duration::from_millis(10));
        assert!(queue.skip());
        assert!(!queue.skip());
        assert_eq!(queue.pending(), 2);
    }

    #[test]
    fn skip_when_idle_is_noop() {
        let mut queue = AnnouncementQueue::new(timing());
        assert!(!queue.skip());
        assert!(queue.is_empty());

        // Queued but not yet started is still idle.
        queue.push(Announcement::for_phase(Phase::Day));
        assert!(!queue.skip());
        assert_eq!(queue.pending(), 1);
        assert_eq!(queue.stage(), Stage::Hidden);
    }

    #[test]
    fn role_reveal_names_the_role() {
        let [_, reveal, _] = intro_chain(Some(Role::Bruja));
        assert!(reveal.text.contains("BRUJA"));
        let [_, unknown, _] = intro_chain(None);
        assert!(unknown.text.contains(UNKNOWN_ROLE.display_name));
    }
}
