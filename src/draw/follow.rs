use crate::draw::geometry::{aspect_fit, AspectRatio, WindowGeometry};
use crate::draw::window_query::{MapState, NamePattern, WindowHandle, WindowQuery};
use anyhow::{Context, Result};

/// The overlay's own top-level window.
pub trait OverlayWindow {
    fn geometry(&self) -> WindowGeometry;
    fn set_geometry(&mut self, geometry: WindowGeometry);
    fn set_visible(&mut self, visible: bool);
    /// Opacity in percent, 0 to 100.
    fn set_opacity(&mut self, alpha: u8);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowTarget {
    pattern: NamePattern,
    resolved: Option<WindowHandle>,
    last_geometry: Option<WindowGeometry>,
}

impl FollowTarget {
    pub fn new(pattern: NamePattern) -> Self {
        Self {
            pattern,
            resolved: None,
            last_geometry: None,
        }
    }

    pub fn pattern(&self) -> &NamePattern {
        &self.pattern
    }

    pub fn resolved(&self) -> Option<WindowHandle> {
        self.resolved
    }

    pub fn last_geometry(&self) -> Option<WindowGeometry> {
        self.last_geometry
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    /// No target configured.
    Idle,
    /// Target not found yet.
    Pending,
    /// Target unmapped or minimized; overlay hidden.
    Hidden,
    /// Overlay already matched the target.
    Unchanged(WindowGeometry),
    Moved(WindowGeometry),
}

/// Keeps the overlay locked onto a target window.
#[derive(Debug, Clone, Default)]
pub struct WindowFollower {
    target: Option<FollowTarget>,
    ratio: Option<AspectRatio>,
}

impl WindowFollower {
    pub fn new(pattern: Option<NamePattern>, ratio: Option<AspectRatio>) -> Self {
        Self {
            target: pattern.map(FollowTarget::new),
            ratio,
        }
    }

    pub fn target(&self) -> Option<&FollowTarget> {
        self.target.as_ref()
    }

    pub fn ratio(&self) -> Option<AspectRatio> {
        self.ratio
    }

    /// One synchronisation pass. Any query error drops the resolved handle so
    /// the next pass looks the window up again.
    pub fn tick(
        &mut self,
        query: &mut dyn WindowQuery,
        overlay: &mut dyn OverlayWindow,
    ) -> Result<FollowOutcome> {
        let ratio = self.ratio;
        let Some(target) = self.target.as_mut() else {
            return Ok(FollowOutcome::Idle);
        };

        let handle = match target.resolved {
            Some(handle) => handle,
            None => {
                let found = target
                    .pattern
                    .lookup(query)
                    .with_context(|| format!("look up window '{}'", target.pattern))?;
                let Some(handle) = found else {
                    return Ok(FollowOutcome::Pending);
                };
                tracing::info!(window = %handle, pattern = %target.pattern, "following window");
                target.resolved = Some(handle);
                handle
            }
        };

        match reconcile(query, overlay, handle, ratio) {
            Ok(outcome) => {
                if let FollowOutcome::Moved(geometry) | FollowOutcome::Unchanged(geometry) = outcome
                {
                    target.last_geometry = Some(geometry);
                }
                Ok(outcome)
            }
            Err(err) => {
                target.resolved = None;
                Err(err.context(format!("follow window {handle}")))
            }
        }
    }
}

fn reconcile(
    query: &mut dyn WindowQuery,
    overlay: &mut dyn OverlayWindow,
    handle: WindowHandle,
    ratio: Option<AspectRatio>,
) -> Result<FollowOutcome> {
    if query.map_state(handle)? != MapState::Viewable {
        overlay.set_visible(false);
        return Ok(FollowOutcome::Hidden);
    }

    let (width, height) = query.size(handle)?;
    let (x, y) = query.translate_to_root(handle)?;
    let mut wanted = WindowGeometry::new(width, height, x, y);
    if let Some(ratio) = ratio {
        wanted = aspect_fit(wanted, ratio);
    }

    // Geometry strings are compared, as the window system reports them.
    let outcome = if overlay.geometry().to_string() == wanted.to_string() {
        FollowOutcome::Unchanged(wanted)
    } else {
        overlay.set_geometry(wanted);
        FollowOutcome::Moved(wanted)
    };
    overlay.set_visible(true);
    Ok(outcome)
}
