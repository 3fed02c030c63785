//! PhaseController, the root state machine of a presentation.
//!
//! Holds the current phase and the one mounted scene, owns the scheduler
//! every timer runs on, and turns named events into phase transitions.
//!
//! A transition runs in two stages. `advance` moves the current phase
//! forward at once and starts the exit fade of the mounted scene, which
//! stops taking input but keeps animating. When the exit timer fires the
//! outgoing scene is torn down (tokens cancelled, timers dropped) and only
//! then is the incoming scene mounted and faded in.

use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::Script;
use crate::types::{ConsoleView, SceneFrame};

use super::anim::{Ease, Fade, Keyframes, progress};
use super::clock::{CancelToken, Scheduler, TimerId};
use super::particles::ParticleField;
use super::phase::{Phase, PhaseEvent, transition};
use super::pointer::{Backdrop, PointerCell, normalize};
use super::scene::{MountedScene, SceneContent, SceneId};
use super::typewriter::{TypewriterEngine, TypewriterOutput, TypewriterTick};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timer {
    Typewriter(TypewriterTick),
    Arrival { scene: SceneId },
    ExitFinished { transition: u64 },
    EnterFinished { transition: u64 },
}

impl From<TypewriterTick> for Timer {
    fn from(tick: TypewriterTick) -> Self {
        Timer::Typewriter(tick)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Stage {
    Entering(Fade),
    Shown,
    Exiting(Fade),
}

pub struct PhaseController {
    script: Rc<Script>,
    phase: Phase,
    scheduler: Scheduler<Timer>,
    typewriter: TypewriterEngine,
    scene: Option<MountedScene>,
    stage: Stage,
    stage_timer: Option<TimerId>,
    transitions: u64,
    next_scene: u64,
    last_frame: Option<Duration>,
    flash: Keyframes,
}

impl PhaseController {
    /// Start a presentation at `Intro`, mounted at `now`.
    pub fn new(script: Rc<Script>, now: Duration) -> Self {
        let mut controller = PhaseController {
            script,
            phase: Phase::Intro,
            scheduler: Scheduler::new(now),
            typewriter: TypewriterEngine::new(),
            scene: None,
            stage: Stage::Shown,
            stage_timer: None,
            transitions: 0,
            next_scene: 0,
            last_frame: None,
            flash: Keyframes::timed(&[0.0, 0.0, 1.0], &[0.0, 0.7, 1.0], Ease::InQuad),
        };
        controller.mount(Phase::Intro);
        controller
    }

    pub fn current_phase(&self) -> Phase {
        self.phase
    }

    /// Phase of the scene currently on screen.
    pub fn mounted_phase(&self) -> Option<Phase> {
        self.scene.as_ref().map(|scene| scene.phase)
    }

    pub fn is_transitioning(&self) -> bool {
        matches!(self.stage, Stage::Exiting(_))
    }

    pub fn accepts_input(&self) -> bool {
        self.scene.is_some() && !self.is_transitioning()
    }

    pub fn script(&self) -> &Rc<Script> {
        &self.script
    }

    /// Move to the next phase in order. Does nothing in the terminal phase.
    pub fn advance(&mut self, now: Duration) {
        self.run_timers(now);
        self.step_forward();
    }

    /// Feed a named event through the transition table. Returns whether it
    /// moved the presentation.
    pub fn dispatch(&mut self, event: PhaseEvent, now: Duration) -> bool {
        self.run_timers(now);
        self.apply(event)
    }

    /// The viewer's advance action. Ignored while a scene is exiting.
    pub fn user_advance(&mut self, now: Duration) -> bool {
        self.run_timers(now);
        if !self.accepts_input() {
            debug!(phase = %self.phase, "advance action ignored during transition");
            return false;
        }
        self.apply(PhaseEvent::UserAdvanced)
    }

    /// Raw pointer position from the input boundary.
    pub fn pointer_moved(&self, column: f32, row: f32, width: f32, height: f32) -> bool {
        if !self.accepts_input() {
            return false;
        }
        match self
            .scene
            .as_ref()
            .and_then(|scene| scene.backdrop())
            .filter(|backdrop| backdrop.is_mounted())
        {
            Some(backdrop) => {
                backdrop.pointer().write(normalize(column, row, width, height));
                true
            }
            None => false,
        }
    }

    /// One render tick: run every due timer, then advance the backdrop.
    pub fn tick(&mut self, now: Duration) {
        self.run_timers(now);
        let dt = self
            .last_frame
            .map_or(Duration::ZERO, |last| now.saturating_sub(last));
        self.last_frame = Some(now);
        if let Some(backdrop) = self.scene.as_mut().and_then(|scene| scene.backdrop_mut()) {
            backdrop.tick(dt.as_secs_f32());
        }
    }

    /// Render parameters of the scene on screen at `now`.
    pub fn frame(&self, now: Duration) -> SceneFrame {
        let Some(scene) = &self.scene else {
            return SceneFrame::blank(self.phase);
        };
        let opacity = self.stage_opacity(now);
        let console = match scene.content {
            SceneContent::Intro { .. } => Some(
                self.typewriter
                    .state()
                    .map(|state| ConsoleView {
                        lines: state.lines.clone(),
                        completed: state.completed,
                    })
                    .unwrap_or_default(),
            ),
            _ => None,
        };
        let flash = match scene.content {
            SceneContent::Transit { .. } => self
                .flash
                .sample(progress(scene.elapsed(now), self.script.timings.flash())),
            _ => 0.0,
        };
        SceneFrame {
            scene: scene.phase,
            opacity,
            accepts_input: self.accepts_input(),
            elapsed: scene.elapsed(now),
            backdrop: scene.backdrop().map(|backdrop| backdrop.params()),
            console,
            particles: scene.particles(now),
            flash,
        }
    }

    // -----------------------------------------------------------------------
    // Timers
    // -----------------------------------------------------------------------

    fn run_timers(&mut self, now: Duration) {
        while let Some((_, timer)) = self.scheduler.pop_due(now) {
            self.on_timer(timer);
        }
    }

    fn on_timer(&mut self, timer: Timer) {
        match timer {
            Timer::Typewriter(tick) => {
                let output = self.typewriter.on_tick(tick, &mut self.scheduler);
                if output == Some(TypewriterOutput::Completed) && self.intro_is_live() {
                    self.apply(PhaseEvent::TypewriterCompleted);
                }
            }
            Timer::Arrival { scene } => {
                if self.scene_is_live(scene) {
                    self.apply(PhaseEvent::TimerElapsed);
                }
            }
            Timer::ExitFinished { transition } => {
                if transition == self.transitions && self.is_transitioning() {
                    self.stage_timer = None;
                    self.finish_exit();
                }
            }
            Timer::EnterFinished { transition } => {
                if transition == self.transitions && matches!(self.stage, Stage::Entering(_)) {
                    self.stage_timer = None;
                    self.stage = Stage::Shown;
                }
            }
        }
    }

    fn stage_opacity(&self, now: Duration) -> f32 {
        match self.stage {
            Stage::Entering(fade) | Stage::Exiting(fade) => fade.opacity(now),
            Stage::Shown => 1.0,
        }
    }

    fn scene_is_live(&self, id: SceneId) -> bool {
        !self.is_transitioning()
            && self
                .scene
                .as_ref()
                .is_some_and(|scene| scene.id == id && scene.is_live())
    }

    fn intro_is_live(&self) -> bool {
        self.scene
            .as_ref()
            .is_some_and(|scene| self.scene_is_live(scene.id) && scene.phase == Phase::Intro)
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    fn apply(&mut self, event: PhaseEvent) -> bool {
        match transition(self.phase, event) {
            Some(next) => {
                self.begin_transition(next);
                true
            }
            None => {
                debug!(phase = %self.phase, ?event, "event does not apply");
                false
            }
        }
    }

    fn step_forward(&mut self) {
        match self.phase.next() {
            Some(next) => self.begin_transition(next),
            None => debug!(phase = %self.phase, "already in the terminal phase"),
        }
    }

    fn begin_transition(&mut self, next: Phase) {
        // A transition already in flight is completed on the spot.
        if self.is_transitioning() {
            self.finish_exit();
        }

        let from = self.phase;
        self.phase = next;
        self.transitions += 1;
        self.cancel_stage_timer();

        let exit = self.script.timings.exit(from);
        let started = self.scheduler.now();
        self.stage = Stage::Exiting(Fade::Out {
            started,
            duration: exit,
            from: self.stage_opacity(started),
        });
        self.stage_timer = Some(self.scheduler.schedule(
            exit,
            Timer::ExitFinished {
                transition: self.transitions,
            },
        ));
        info!(%from, to = %next, "phase transition");
    }

    fn finish_exit(&mut self) {
        self.cancel_stage_timer();
        if let Some(scene) = self.scene.take() {
            self.teardown(scene);
        }
        self.mount(self.phase);
    }

    fn cancel_stage_timer(&mut self) {
        if let Some(timer) = self.stage_timer.take() {
            self.scheduler.cancel(timer);
        }
    }

    // -----------------------------------------------------------------------
    // Mounting
    // -----------------------------------------------------------------------

    fn mount(&mut self, phase: Phase) {
        let at = self.scheduler.now();
        let id = SceneId(self.next_scene);
        self.next_scene += 1;
        let fields = &self.script.fields;

        let content = match phase {
            Phase::Intro => {
                let run = self.typewriter.run(
                    &self.script.intro.lines,
                    self.script.timings.typewriter(),
                    &mut self.scheduler,
                );
                SceneContent::Intro {
                    backdrop: Backdrop::mount(PointerCell::new(), self.script.backdrop, false),
                    run,
                }
            }
            Phase::Choice => SceneContent::Choice {
                backdrop: Backdrop::mount(PointerCell::new(), self.script.backdrop, true),
            },
            Phase::Transit => SceneContent::Transit {
                streaks: ParticleField::mount(fields.streaks.count, fields.streaks.config.clone(), at),
                arrival: self
                    .scheduler
                    .schedule(self.script.timings.arrival(), Timer::Arrival { scene: id }),
            },
            Phase::Resolution => SceneContent::Resolution {
                dust: ParticleField::mount(fields.dust.count, fields.dust.config.clone(), at),
                glyphs: ParticleField::mount(fields.glyphs.count, fields.glyphs.config.clone(), at),
            },
        };

        self.scene = Some(MountedScene {
            id,
            phase,
            mounted_at: at,
            token: CancelToken::new(),
            content,
        });
        self.last_frame = None;

        let enter = self.script.timings.enter(phase);
        self.stage = Stage::Entering(Fade::In {
            started: at,
            duration: enter,
        });
        self.stage_timer = Some(self.scheduler.schedule(
            enter,
            Timer::EnterFinished {
                transition: self.transitions,
            },
        ));
        debug!(%phase, scene = id.0, "scene mounted");
    }

    fn teardown(&mut self, scene: MountedScene) {
        scene.token.cancel();
        match &scene.content {
            SceneContent::Intro { backdrop, run } => {
                self.typewriter.cancel_run(run, &mut self.scheduler);
                backdrop.unmount();
            }
            SceneContent::Choice { backdrop } => backdrop.unmount(),
            SceneContent::Transit { arrival, .. } => {
                self.scheduler.cancel(*arrival);
            }
            SceneContent::Resolution { .. } => {}
        }
        debug!(phase = %scene.phase, scene = scene.id.0, "scene torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn quick_script() -> Rc<Script> {
        let mut script = Script::default();
        script.intro.lines = vec!["ok".into()];
        script.timings.char_delay_ms = 10;
        script.timings.line_delay_ms = 10;
        script.timings.settle_ms = 100;
        Rc::new(script)
    }

    #[test]
    fn starts_in_intro_with_a_running_typewriter() {
        let controller = PhaseController::new(quick_script(), Duration::ZERO);
        assert_eq!(controller.current_phase(), Phase::Intro);
        assert_eq!(controller.mounted_phase(), Some(Phase::Intro));
        assert!(controller.typewriter.is_running());
    }

    #[test]
    fn typewriter_completion_moves_to_choice() {
        let mut controller = PhaseController::new(quick_script(), Duration::ZERO);
        // "ok": 0 [""], 0 "o", 10 "ok", 20 pause, 30 settle, 130 done.
        controller.tick(ms(129));
        assert_eq!(controller.current_phase(), Phase::Intro);
        controller.tick(ms(130));
        assert_eq!(controller.current_phase(), Phase::Choice);
        assert_eq!(controller.mounted_phase(), Some(Phase::Intro));
        assert!(controller.is_transitioning());
    }

    #[test]
    fn teardown_cancels_the_typewriter() {
        let mut controller = PhaseController::new(quick_script(), Duration::ZERO);
        controller.advance(ms(1));
        controller.tick(ms(1) + ms(900));
        assert_eq!(controller.mounted_phase(), Some(Phase::Choice));
        assert!(!controller.typewriter.is_running());
        assert!(controller.typewriter.state().is_none());
    }

    #[test]
    fn pointer_reaches_only_a_live_backdrop() {
        let mut controller = PhaseController::new(quick_script(), Duration::ZERO);
        assert!(controller.pointer_moved(0.0, 0.0, 80.0, 24.0));
        controller.advance(ms(5));
        assert!(!controller.pointer_moved(0.0, 0.0, 80.0, 24.0));
    }

    #[test]
    fn frame_fades_out_the_outgoing_scene() {
        let mut controller = PhaseController::new(quick_script(), Duration::ZERO);
        controller.tick(ms(2_000));
        assert_eq!(controller.frame(ms(2_000)).opacity, 1.0);
        controller.advance(ms(2_000));
        let frame = controller.frame(ms(2_450));
        assert_eq!(frame.scene, Phase::Choice);
        assert!(frame.opacity < 1.0);
        assert!(!frame.accepts_input);
    }

    #[test]
    fn interrupting_an_entry_fades_out_from_the_current_level() {
        let mut controller = PhaseController::new(Rc::new(Script::default()), Duration::ZERO);
        controller.tick(ms(300));
        let entering = controller.frame(ms(300)).opacity;
        assert!(entering > 0.0 && entering < 1.0);

        controller.advance(ms(300));
        let mut last = entering;
        for t in (300..=1_200).step_by(50) {
            let opacity = controller.frame(ms(t)).opacity;
            assert!(opacity <= last + 1e-6, "opacity rose to {opacity} at {t}ms");
            last = opacity;
        }
        assert_eq!(last, 0.0);
    }
}
