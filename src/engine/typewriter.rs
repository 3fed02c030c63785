//! Progressive, cancellable text reveal.
//!
//! `Typewriter` is the pure stepper: every call to `step` performs one beat
//! of the reveal and says how long to wait before the next one.
//! `TypewriterEngine` binds a stepper to a `Scheduler`, owns the single
//! active run, and turns due timers into snapshots and one completion.

use std::time::Duration;

use tracing::{debug, trace};
use unicode_segmentation::UnicodeSegmentation;

use super::clock::{CancelToken, Scheduler, TimerId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypewriterTiming {
    pub char_delay: Duration,
    pub line_delay: Duration,
    pub settle: Duration,
}

impl Default for TypewriterTiming {
    fn default() -> Self {
        Self {
            char_delay: Duration::from_millis(32),
            line_delay: Duration::from_millis(560),
            settle: Duration::from_millis(800),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypewriterState {
    pub lines: Vec<String>,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Beat {
    /// The visible lines changed; step again after `wait`.
    Reveal { wait: Duration },
    /// Nothing new is visible; step again after `wait`.
    Pause { wait: Duration },
    /// The run is over.
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cursor {
    StartLine,
    Typing,
    Settling,
    Finished,
}

pub struct Typewriter {
    source: Vec<Vec<String>>,
    timing: TypewriterTiming,
    line: usize,
    unit: usize,
    cursor: Cursor,
    state: TypewriterState,
}

impl Typewriter {
    /// Split every line into user-perceived characters up front so a beat
    /// never exposes half of a combined glyph.
    pub fn new<S: AsRef<str>>(lines: &[S], timing: TypewriterTiming) -> Self {
        let source = lines
            .iter()
            .map(|line| line.as_ref().graphemes(true).map(str::to_owned).collect())
            .collect();
        Self {
            source,
            timing,
            line: 0,
            unit: 0,
            cursor: Cursor::StartLine,
            state: TypewriterState::default(),
        }
    }

    pub fn state(&self) -> &TypewriterState {
        &self.state
    }

    pub fn visible(&self) -> &[String] {
        &self.state.lines
    }

    /// Perform one beat. Returns `None` once `Done` has been reported.
    pub fn step(&mut self) -> Option<Beat> {
        match self.cursor {
            Cursor::StartLine => {
                if self.line >= self.source.len() {
                    self.cursor = Cursor::Settling;
                    return Some(Beat::Pause { wait: self.timing.settle });
                }
                self.state.lines.push(String::new());
                self.unit = 0;
                self.cursor = Cursor::Typing;
                Some(Beat::Reveal { wait: Duration::ZERO })
            }
            Cursor::Typing => {
                let units = &self.source[self.line];
                if let Some(unit) = units.get(self.unit) {
                    if let Some(current) = self.state.lines.last_mut() {
                        current.push_str(unit);
                    }
                    self.unit += 1;
                    return Some(Beat::Reveal { wait: self.timing.char_delay });
                }
                self.line += 1;
                self.cursor = Cursor::StartLine;
                Some(Beat::Pause { wait: self.timing.line_delay })
            }
            Cursor::Settling => {
                self.cursor = Cursor::Finished;
                self.state.completed = true;
                Some(Beat::Done)
            }
            Cursor::Finished => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunId(u64);

/// Timer payload for one typewriter beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypewriterTick {
    pub run: RunId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypewriterOutput {
    Snapshot(Vec<String>),
    Completed,
}

/// Cancels the run it was returned for. Cancelling a finished or replaced
/// run is harmless.
///
/// `cancel` only flags the run: a beat already queued stays in the
/// scheduler and is discarded unrun when it comes due. Pass the handle to
/// `TypewriterEngine::cancel_run` to unqueue it as well.
#[derive(Debug, Clone)]
pub struct RunHandle {
    pub id: RunId,
    token: CancelToken,
}

impl RunHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

struct ActiveRun {
    id: RunId,
    writer: Typewriter,
    token: CancelToken,
    timer: Option<TimerId>,
}

#[derive(Default)]
pub struct TypewriterEngine {
    active: Option<ActiveRun>,
    next_run: u64,
}

impl TypewriterEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start revealing `lines`, cancelling whatever run came before.
    pub fn run<S, E>(
        &mut self,
        lines: &[S],
        timing: TypewriterTiming,
        scheduler: &mut Scheduler<E>,
    ) -> RunHandle
    where
        S: AsRef<str>,
        E: From<TypewriterTick>,
    {
        self.cancel(scheduler);

        let id = RunId(self.next_run);
        self.next_run += 1;
        let token = CancelToken::new();
        let timer = scheduler.schedule(Duration::ZERO, TypewriterTick { run: id }.into());
        debug!(run = id.0, lines = lines.len(), "typewriter run started");

        self.active = Some(ActiveRun {
            id,
            writer: Typewriter::new(lines, timing),
            token: token.clone(),
            timer: Some(timer),
        });
        RunHandle { id, token }
    }

    /// Stop the active run and its pending timer.
    pub fn cancel<E>(&mut self, scheduler: &mut Scheduler<E>) {
        if let Some(run) = self.active.take() {
            run.token.cancel();
            if let Some(timer) = run.timer {
                scheduler.cancel(timer);
            }
            debug!(run = run.id.0, "typewriter run cancelled");
        }
    }

    /// Cancel the run behind `handle` and drop its queued beat. Does
    /// nothing to a newer run that replaced it.
    pub fn cancel_run<E>(&mut self, handle: &RunHandle, scheduler: &mut Scheduler<E>) {
        handle.cancel();
        if self.active.as_ref().is_some_and(|run| run.id == handle.id) {
            self.cancel(scheduler);
        }
    }

    /// Timer continuation for one beat.
    pub fn on_tick<E>(
        &mut self,
        tick: TypewriterTick,
        scheduler: &mut Scheduler<E>,
    ) -> Option<TypewriterOutput>
    where
        E: From<TypewriterTick>,
    {
        let run = self.active.as_mut()?;
        if run.id != tick.run {
            return None;
        }
        run.timer = None;
        if run.token.is_cancelled() {
            self.active = None;
            return None;
        }

        loop {
            match run.writer.step()? {
                Beat::Reveal { wait } => {
                    run.timer = Some(scheduler.schedule(wait, tick.into()));
                    let snapshot = run.writer.visible().to_vec();
                    trace!(run = run.id.0, ?snapshot, "typewriter snapshot");
                    return Some(TypewriterOutput::Snapshot(snapshot));
                }
                Beat::Pause { wait } if wait.is_zero() => continue,
                Beat::Pause { wait } => {
                    run.timer = Some(scheduler.schedule(wait, tick.into()));
                    return None;
                }
                Beat::Done => {
                    debug!(run = run.id.0, "typewriter run completed");
                    return Some(TypewriterOutput::Completed);
                }
            }
        }
    }

    pub fn state(&self) -> Option<&TypewriterState> {
        self.active.as_ref().map(|run| run.writer.state())
    }

    pub fn is_running(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|run| !run.token.is_cancelled() && !run.writer.state().completed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn timing(char_ms: u64, line_ms: u64) -> TypewriterTiming {
        TypewriterTiming {
            char_delay: ms(char_ms),
            line_delay: ms(line_ms),
            settle: ms(800),
        }
    }

    #[test]
    fn stepper_reveals_line_by_line() {
        let mut w = Typewriter::new(&["hi", "yo"], timing(10, 50));
        let mut snapshots = Vec::new();
        while let Some(beat) = w.step() {
            if let Beat::Reveal { .. } = beat {
                snapshots.push(w.visible().to_vec());
            }
        }
        assert_eq!(
            snapshots,
            vec![
                vec![""],
                vec!["h"],
                vec!["hi"],
                vec!["hi", ""],
                vec!["hi", "y"],
                vec!["hi", "yo"],
            ]
        );
        assert!(w.state().completed);
        assert_eq!(w.step(), None);
    }

    #[test]
    fn combined_glyphs_are_one_unit() {
        let mut w = Typewriter::new(&["a❤️"], timing(1, 1));
        let mut grown = Vec::new();
        while let Some(beat) = w.step() {
            if let Beat::Reveal { .. } = beat {
                grown.push(w.visible()[0].clone());
            }
        }
        assert_eq!(grown, vec!["", "a", "a❤️"]);
    }

    #[test]
    fn empty_input_settles_then_finishes() {
        let mut w = Typewriter::new::<&str>(&[], timing(10, 50));
        assert_eq!(w.step(), Some(Beat::Pause { wait: ms(800) }));
        assert_eq!(w.step(), Some(Beat::Done));
        assert!(w.visible().is_empty());
    }

    #[test]
    fn rerun_cancels_the_previous_run() {
        let mut s: Scheduler<TypewriterTick> = Scheduler::new(Duration::ZERO);
        let mut engine = TypewriterEngine::new();
        let first = engine.run(&["abc"], timing(10, 10), &mut s);
        let second = engine.run(&["xyz"], timing(10, 10), &mut s);
        assert_ne!(first.id, second.id);
        assert_eq!(s.pending(), 1);

        let mut outputs = Vec::new();
        while let Some((_, tick)) = s.pop_due(ms(10_000)) {
            assert_eq!(tick.run, second.id);
            if let Some(out) = engine.on_tick(tick, &mut s) {
                outputs.push(out);
            }
        }
        assert_eq!(outputs.last(), Some(&TypewriterOutput::Completed));
        assert!(outputs.iter().all(|out| match out {
            TypewriterOutput::Snapshot(lines) => !lines.concat().contains('a'),
            TypewriterOutput::Completed => true,
        }));
    }

    #[test]
    fn handle_cancel_stops_a_pending_beat() {
        let mut s: Scheduler<TypewriterTick> = Scheduler::new(Duration::ZERO);
        let mut engine = TypewriterEngine::new();
        let handle = engine.run(&["abc"], timing(10, 10), &mut s);
        let (_, tick) = s.pop_due(ms(0)).expect("first beat");
        assert!(engine.on_tick(tick, &mut s).is_some());

        handle.cancel();
        let (_, tick) = s.pop_due(ms(1_000)).expect("pending beat still queued");
        assert_eq!(engine.on_tick(tick, &mut s), None);
        assert!(s.pop_due(ms(10_000)).is_none());
        assert!(!engine.is_running());
    }

    #[test]
    fn cancel_run_unqueues_the_pending_beat() {
        let mut s: Scheduler<TypewriterTick> = Scheduler::new(Duration::ZERO);
        let mut engine = TypewriterEngine::new();
        let handle = engine.run(&["abc"], timing(10, 10), &mut s);
        let (_, tick) = s.pop_due(ms(0)).expect("first beat");
        assert!(engine.on_tick(tick, &mut s).is_some());
        assert_eq!(s.pending(), 1);

        engine.cancel_run(&handle, &mut s);
        assert!(handle.is_cancelled());
        assert_eq!(s.pending(), 0);
        assert!(engine.state().is_none());
    }

    #[test]
    fn stale_handle_leaves_a_newer_run_alone() {
        let mut s: Scheduler<TypewriterTick> = Scheduler::new(Duration::ZERO);
        let mut engine = TypewriterEngine::new();
        let old = engine.run(&["abc"], timing(10, 10), &mut s);
        let new = engine.run(&["xyz"], timing(10, 10), &mut s);

        engine.cancel_run(&old, &mut s);
        assert!(!new.is_cancelled());
        assert_eq!(s.pending(), 1);
        assert!(engine.is_running());
    }
}
