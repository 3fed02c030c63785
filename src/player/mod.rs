//! The runtime loop that drives a presentation in the terminal.
//!
//! `Session` owns the phase controller and decides what reaches the
//! renderer: the live scene, or the fault view once painting a scene has
//! failed. `Player` owns the terminal and the wall clock, and turns
//! keyboard and mouse events into session calls.

use std::io;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::{cursor, execute, terminal};
use tracing::{info, warn};

use crate::config::Script;
use crate::engine::{Phase, PhaseController};
use crate::error::PresenterResult;
use crate::renderer::{Renderer, TerminalRenderer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Live,
    /// A render fault replaced the scene. `painted` is false until the
    /// fault view has been drawn for the current screen contents.
    Fallback { message: String, painted: bool },
}

pub struct Session {
    script: Rc<Script>,
    controller: PhaseController,
    view: View,
}

impl Session {
    pub fn new(script: Rc<Script>, now: Duration) -> Self {
        let controller = PhaseController::new(Rc::clone(&script), now);
        Self {
            script,
            controller,
            view: View::Live,
        }
    }

    pub fn controller(&self) -> &PhaseController {
        &self.controller
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn phase(&self) -> Phase {
        self.controller.current_phase()
    }

    /// Advance the engine to `now` and paint one frame.
    ///
    /// A render fault switches the session to the fault view instead of
    /// ending it. Any other error is returned.
    pub fn frame_tick(&mut self, now: Duration, renderer: &mut dyn Renderer) -> PresenterResult<()> {
        if let View::Fallback { message, painted } = &mut self.view {
            if !*painted {
                renderer.paint_fallback(message)?;
                *painted = true;
            }
            return Ok(());
        }

        self.controller.tick(now);
        let frame = self.controller.frame(now);
        match renderer.paint(&frame) {
            Ok(()) => Ok(()),
            Err(e) if e.is_render_fault() => {
                warn!(phase = %frame.scene, error = %e, "scene failed to render");
                let message = e.to_string();
                renderer.paint_fallback(&message)?;
                self.view = View::Fallback {
                    message,
                    painted: true,
                };
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Start over from `Intro` with a fresh controller.
    pub fn restart(&mut self, now: Duration, renderer: &mut dyn Renderer) {
        info!(from = %self.phase(), "restarting presentation");
        self.controller = PhaseController::new(Rc::clone(&self.script), now);
        self.view = View::Live;
        renderer.invalidate();
    }

    pub fn user_advance(&mut self, now: Duration) -> bool {
        match self.view {
            View::Live => self.controller.user_advance(now),
            View::Fallback { .. } => false,
        }
    }

    pub fn pointer_moved(&self, column: u16, row: u16, width: u16, height: u16) -> bool {
        match self.view {
            View::Live => self.controller.pointer_moved(
                column as f32,
                row as f32,
                width as f32,
                height as f32,
            ),
            View::Fallback { .. } => false,
        }
    }

    /// The screen was cleared or resized; the next tick redraws everything.
    pub fn invalidate(&mut self, renderer: &mut dyn Renderer) {
        renderer.invalidate();
        if let View::Fallback { painted, .. } = &mut self.view {
            *painted = false;
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

pub struct Player {
    script: Rc<Script>,
}

impl Player {
    pub fn new(script: Script) -> Self {
        Self {
            script: Rc::new(script),
        }
    }

    /// Play the presentation in the terminal.
    ///
    /// Sets up the terminal, enters the event loop, and restores the terminal
    /// on exit (even on error).
    pub fn play(&mut self) -> Result<()> {
        let mut renderer = TerminalRenderer::stdout(Rc::clone(&self.script))?;

        let mut stdout = io::stdout();
        terminal::enable_raw_mode()?;
        execute!(
            stdout,
            terminal::EnterAlternateScreen,
            event::EnableMouseCapture,
            cursor::Hide,
            terminal::Clear(terminal::ClearType::All),
        )?;

        let result = self.run_loop(&mut renderer);

        // Always restore terminal state.
        let _ = execute!(
            stdout,
            event::DisableMouseCapture,
            cursor::Show,
            terminal::LeaveAlternateScreen,
        );
        let _ = terminal::disable_raw_mode();

        result
    }

    // -----------------------------------------------------------------------
    // Event loop
    // -----------------------------------------------------------------------

    fn run_loop(&mut self, renderer: &mut TerminalRenderer) -> Result<()> {
        let origin = Instant::now();
        let frame_interval = self.script.timings.frame();
        let mut session = Session::new(Rc::clone(&self.script), origin.elapsed());
        info!(frame_ms = frame_interval.as_millis() as u64, "presentation started");

        loop {
            session.frame_tick(origin.elapsed(), renderer)?;

            if !event::poll(frame_interval)? {
                continue;
            }
            loop {
                let now = origin.elapsed();
                if let Flow::Quit = handle_event(event::read()?, now, &mut session, renderer) {
                    info!(phase = %session.phase(), "presentation closed");
                    return Ok(());
                }
                if !event::poll(Duration::ZERO)? {
                    break;
                }
            }
        }
    }
}

fn handle_event(
    event: Event,
    now: Duration,
    session: &mut Session,
    renderer: &mut TerminalRenderer,
) -> Flow {
    match event {
        Event::Key(KeyEvent {
            code,
            kind: KeyEventKind::Press,
            ..
        }) => match code {
            KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
            KeyCode::Enter | KeyCode::Char(' ') => {
                session.user_advance(now);
            }
            KeyCode::Char('r') => session.restart(now, renderer),
            _ => {}
        },
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            ..
        }) => match kind {
            MouseEventKind::Moved | MouseEventKind::Drag(_) => {
                let (width, height) = renderer.size();
                session.pointer_moved(column, row, width, height);
            }
            MouseEventKind::Down(MouseButton::Left) => {
                session.user_advance(now);
            }
            _ => {}
        },
        Event::Resize(width, height) => {
            renderer.resize(width, height);
            session.invalidate(renderer);
        }
        _ => {}
    }
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PresenterError;
    use crate::types::SceneFrame;

    #[derive(Default)]
    struct FakeRenderer {
        fail: bool,
        painted: Vec<Phase>,
        fallbacks: Vec<String>,
        invalidated: usize,
    }

    impl Renderer for FakeRenderer {
        fn paint(&mut self, frame: &SceneFrame) -> PresenterResult<()> {
            if self.fail {
                return Err(PresenterError::render_fault("boom"));
            }
            self.painted.push(frame.scene);
            Ok(())
        }

        fn paint_fallback(&mut self, message: &str) -> PresenterResult<()> {
            self.fallbacks.push(message.to_string());
            Ok(())
        }

        fn invalidate(&mut self) {
            self.invalidated += 1;
        }
    }

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn session() -> Session {
        Session::new(Rc::new(Script::default()), Duration::ZERO)
    }

    #[test]
    fn live_frames_reach_the_renderer() {
        let mut s = session();
        let mut r = FakeRenderer::default();
        s.frame_tick(ms(16), &mut r).unwrap();
        s.frame_tick(ms(32), &mut r).unwrap();
        assert_eq!(r.painted, vec![Phase::Intro, Phase::Intro]);
        assert_eq!(s.view(), &View::Live);
    }

    #[test]
    fn render_fault_switches_to_fallback_once() {
        let mut s = session();
        let mut r = FakeRenderer {
            fail: true,
            ..Default::default()
        };
        s.frame_tick(ms(16), &mut r).unwrap();
        s.frame_tick(ms(32), &mut r).unwrap();
        assert_eq!(r.fallbacks, vec!["render fault: boom".to_string()]);
        assert!(matches!(s.view(), View::Fallback { .. }));
        assert!(!s.user_advance(ms(40)));
        assert!(!s.pointer_moved(1, 1, 80, 24));
    }

    #[test]
    fn fallback_repaints_after_invalidation() {
        let mut s = session();
        let mut r = FakeRenderer {
            fail: true,
            ..Default::default()
        };
        s.frame_tick(ms(16), &mut r).unwrap();
        s.invalidate(&mut r);
        s.frame_tick(ms(32), &mut r).unwrap();
        assert_eq!(r.fallbacks.len(), 2);
    }

    #[test]
    fn restart_returns_to_intro() {
        let mut s = session();
        let mut r = FakeRenderer::default();
        s.controller.advance(ms(10));
        assert_eq!(s.phase(), Phase::Choice);

        r.fail = true;
        s.frame_tick(ms(20), &mut r).unwrap();
        r.fail = false;
        s.restart(ms(30), &mut r);

        assert_eq!(s.view(), &View::Live);
        assert_eq!(s.phase(), Phase::Intro);
        assert_eq!(r.invalidated, 1);
        s.frame_tick(ms(40), &mut r).unwrap();
        assert_eq!(r.painted.last(), Some(&Phase::Intro));
    }

    #[test]
    fn other_errors_propagate() {
        struct Broken;
        impl Renderer for Broken {
            fn paint(&mut self, _: &SceneFrame) -> PresenterResult<()> {
                Err(io::Error::other("pipe closed").into())
            }
            fn paint_fallback(&mut self, _: &str) -> PresenterResult<()> {
                Ok(())
            }
            fn invalidate(&mut self) {}
        }

        let mut s = session();
        let err = s.frame_tick(ms(16), &mut Broken).unwrap_err();
        assert!(!err.is_render_fault());
        assert_eq!(s.view(), &View::Live);
    }
}
