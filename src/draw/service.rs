use crate::draw::bus::{CommandBus, CommandSender};
use crate::draw::canvas::Canvas;
use crate::draw::follow::{FollowOutcome, OverlayWindow, WindowFollower};
use crate::draw::geometry::WindowGeometry;
use crate::draw::input::{DrawEngine, EngineEffect, EngineEvent};
use crate::draw::scheduler::{
    PeriodicTask, TaskOutcome, COMMAND_POLL_INTERVAL, FOLLOW_POLL_INTERVAL,
};
use crate::draw::status::{ControlPanelView, StatusBarView, StatusObserver, StatusUpdate};
use crate::draw::window_query::WindowQuery;
use crate::settings::PainterConfig;
use std::time::Instant;

/// What one call to [`PainterRuntime::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub commands: TaskOutcome,
    pub follow: TaskOutcome,
    pub follow_outcome: Option<FollowOutcome>,
}

/// Engine plus the two observers it feeds.
#[derive(Debug)]
struct PainterCore {
    engine: DrawEngine,
    bus: CommandBus,
    sender: CommandSender,
    status_bar: StatusBarView,
    control_panel: ControlPanelView,
}

impl PainterCore {
    fn notify(&mut self, update: &StatusUpdate) {
        self.status_bar.update_status(update);
        self.control_panel.update_status(update);
    }

    fn apply(
        &mut self,
        canvas: &mut dyn Canvas,
        overlay: &mut dyn OverlayWindow,
        event: EngineEvent,
    ) {
        for effect in self.engine.apply_event(canvas, event) {
            match effect {
                EngineEffect::Status(update) => self.notify(&update),
                EngineEffect::SetOpacity(alpha) => overlay.set_opacity(alpha),
                EngineEffect::Submit(command) => {
                    self.sender.submit(command);
                }
            }
        }
    }

    fn drain_commands(&mut self, canvas: &mut dyn Canvas, overlay: &mut dyn OverlayWindow) -> usize {
        let commands = self.bus.drain();
        let count = commands.len();
        for command in commands {
            tracing::debug!(command = %command, "dispatching command");
            self.apply(canvas, overlay, EngineEvent::Command(command));
        }
        count
    }
}

/// Owns the drawing engine, the command bus, the window follower and both
/// status observers, and runs the two polling tasks.
#[derive(Debug)]
pub struct PainterRuntime {
    core: PainterCore,
    follower: WindowFollower,
    command_task: PeriodicTask,
    follow_task: PeriodicTask,
    separate: bool,
}

impl PainterRuntime {
    pub fn new(config: &PainterConfig, now: Instant) -> Self {
        let bus = CommandBus::new();
        let sender = bus.sender();
        let mut core = PainterCore {
            engine: DrawEngine::new(config.style, config.mode),
            bus,
            sender,
            status_bar: StatusBarView::default(),
            control_panel: ControlPanelView::default(),
        };
        core.notify(&StatusUpdate::full(&config.style, config.mode, config.separate));
        Self {
            core,
            follower: WindowFollower::new(config.following.clone(), config.ratio),
            command_task: PeriodicTask::new("command-bus", COMMAND_POLL_INTERVAL, now),
            follow_task: PeriodicTask::new("window-follow", FOLLOW_POLL_INTERVAL, now),
            separate: config.separate,
        }
    }

    /// Pushes the loaded style onto the surfaces.
    pub fn start(&mut self, canvas: &mut dyn Canvas, overlay: &mut dyn OverlayWindow) {
        let style = *self.core.engine.style();
        canvas.configure_background(style.background_color);
        overlay.set_opacity(style.opacity);
        self.geometry_changed(overlay.geometry());
    }

    pub fn sender(&self) -> CommandSender {
        self.core.sender.clone()
    }

    pub fn engine(&self) -> &DrawEngine {
        &self.core.engine
    }

    pub fn follower(&self) -> &WindowFollower {
        &self.follower
    }

    pub fn status_bar(&self) -> &StatusBarView {
        &self.core.status_bar
    }

    pub fn control_panel(&self) -> &ControlPanelView {
        &self.core.control_panel
    }

    pub fn separate(&self) -> bool {
        self.separate
    }

    /// Persisted for the next start; the running layout does not change.
    pub fn set_separate(&mut self, separate: bool) {
        self.separate = separate;
        self.core.notify(&StatusUpdate {
            separate: Some(separate),
            ..StatusUpdate::default()
        });
    }

    /// Pointer and key events go straight to the engine.
    pub fn handle_input(
        &mut self,
        canvas: &mut dyn Canvas,
        overlay: &mut dyn OverlayWindow,
        event: EngineEvent,
    ) {
        self.core.apply(canvas, overlay, event);
    }

    /// Drains the bus right away instead of waiting for the next poll.
    pub fn drain_commands(&mut self, canvas: &mut dyn Canvas, overlay: &mut dyn OverlayWindow) -> usize {
        self.core.drain_commands(canvas, overlay)
    }

    pub fn geometry_changed(&mut self, geometry: WindowGeometry) {
        self.core.notify(&StatusUpdate::geometry(geometry));
    }

    /// Runs whichever polling tasks are due at `now`.
    pub fn tick(
        &mut self,
        now: Instant,
        canvas: &mut dyn Canvas,
        overlay: &mut dyn OverlayWindow,
        query: &mut dyn WindowQuery,
    ) -> TickReport {
        let core = &mut self.core;
        let commands = self.command_task.run_if_due(now, || {
            core.drain_commands(canvas, overlay);
            Ok(())
        });

        let follower = &mut self.follower;
        let mut follow_outcome = None;
        let follow = self.follow_task.run_if_due(now, || {
            follow_outcome = Some(follower.tick(query, overlay)?);
            Ok(())
        });
        if let Some(FollowOutcome::Moved(geometry)) = follow_outcome {
            self.geometry_changed(geometry);
        }

        TickReport {
            commands,
            follow,
            follow_outcome,
        }
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do.
    pub fn next_deadline(&self) -> Instant {
        self.command_task.next_due().min(self.follow_task.next_due())
    }

    pub fn snapshot(&self, geometry: Option<WindowGeometry>) -> PainterConfig {
        PainterConfig {
            style: *self.core.engine.style(),
            mode: self.core.engine.mode(),
            geometry,
            separate: self.separate,
            following: self
                .follower
                .target()
                .map(|target| target.pattern().clone()),
            ratio: self.follower.ratio(),
        }
    }
}
