use std::fmt;
use std::sync::Arc;

use log::debug;
use parking_lot::RwLock;

use crate::error::{Result, ViewerError};
use crate::params::{write_color, Color, ParamKind, ParamValue};
use crate::surface::SurfaceId;

/// Draw entry points exported by the backend module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawEntry {
    Draw,
    DrawTriangle,
    DrawSquare,
    GradientDraw,
    PointDraw,
    SinDraw,
    Special,
}

impl DrawEntry {
    pub const ALL: [DrawEntry; 7] = [
        Self::Draw,
        Self::DrawTriangle,
        Self::DrawSquare,
        Self::GradientDraw,
        Self::PointDraw,
        Self::SinDraw,
        Self::Special,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Draw => "draw",
            Self::DrawTriangle => "draw_triangle",
            Self::DrawSquare => "draw_square",
            Self::GradientDraw => "gradient_draw",
            Self::PointDraw => "point_draw",
            Self::SinDraw => "sin_draw",
            Self::Special => "special",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|entry| entry.name() == name)
            .ok_or_else(|| ViewerError::UnknownEntryPoint(name.to_string()))
    }

    /// Whether the entry takes the optional colour argument.
    pub fn accepts_color(self) -> bool {
        matches!(self, Self::DrawTriangle | Self::DrawSquare | Self::Special)
    }
}

/// Parameter setters exported by the backend module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Setter {
    UpdateSides,
    UpdateRotationSpeed,
    UpdateColourSpeed,
    SinResolution,
    SinWavelength,
    SinMouseMove,
    PointResolution,
    PointSides,
    PointBox,
    GradientSides,
}

impl Setter {
    pub const ALL: [Setter; 10] = [
        Self::UpdateSides,
        Self::UpdateRotationSpeed,
        Self::UpdateColourSpeed,
        Self::SinResolution,
        Self::SinWavelength,
        Self::SinMouseMove,
        Self::PointResolution,
        Self::PointSides,
        Self::PointBox,
        Self::GradientSides,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::UpdateSides => "update_sides",
            Self::UpdateRotationSpeed => "update_rotation_speed",
            Self::UpdateColourSpeed => "update_colour_speed",
            Self::SinResolution => "s_update_resolution",
            Self::SinWavelength => "s_update_wavelength",
            Self::SinMouseMove => "s_mouse_move",
            Self::PointResolution => "p_update_resolution",
            Self::PointSides => "p_update_sides",
            Self::PointBox => "p_update_box",
            Self::GradientSides => "g_update_sides",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|setter| setter.name() == name)
            .ok_or_else(|| ViewerError::UnknownEntryPoint(name.to_string()))
    }

    pub fn kind(self) -> ParamKind {
        match self {
            Self::UpdateSides
            | Self::UpdateRotationSpeed
            | Self::SinResolution
            | Self::PointResolution
            | Self::PointSides
            | Self::GradientSides => ParamKind::Int,
            Self::UpdateColourSpeed | Self::SinWavelength | Self::SinMouseMove => ParamKind::Float,
            Self::PointBox => ParamKind::Bool,
        }
    }
}

/// One-time startup calls made before any control is live.
///
/// `point_init` attaches mouse tracking to the page surface. `user_init` and
/// `drag_init` take no argument and start the module's own render loop on
/// the `user_input` canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceHook {
    PointInit,
    UserInit,
    DragInit,
}

impl SurfaceHook {
    pub const ALL: [SurfaceHook; 3] = [Self::PointInit, Self::UserInit, Self::DragInit];

    pub fn name(self) -> &'static str {
        match self {
            Self::PointInit => "point_init",
            Self::UserInit => "user_init",
            Self::DragInit => "drag_init",
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|hook| hook.name() == name)
            .ok_or_else(|| ViewerError::UnknownEntryPoint(name.to_string()))
    }

    /// Whether the entry point receives the page's surface id.
    pub fn takes_surface(self) -> bool {
        matches!(self, Self::PointInit)
    }
}

/// The exported surface of the external drawing module.
///
/// Implementations forward each call to the module; none of them return
/// data to the caller beyond success or failure.
pub trait Backend {
    fn draw(&mut self, entry: DrawEntry, surface: &SurfaceId, color: Option<Color>) -> Result<()>;

    fn set(&mut self, setter: Setter, value: ParamValue) -> Result<()>;

    fn attach(&mut self, hook: SurfaceHook, surface: &SurfaceId) -> Result<()>;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn draw(&mut self, entry: DrawEntry, surface: &SurfaceId, color: Option<Color>) -> Result<()> {
        (**self).draw(entry, surface, color)
    }

    fn set(&mut self, setter: Setter, value: ParamValue) -> Result<()> {
        (**self).set(setter, value)
    }

    fn attach(&mut self, hook: SurfaceHook, surface: &SurfaceId) -> Result<()> {
        (**self).attach(hook, surface)
    }
}

pub(crate) fn check_color_argument(entry: DrawEntry, color: Option<&Color>) -> Result<()> {
    if color.is_some() && !entry.accepts_color() {
        return Err(ViewerError::ArgumentMismatch {
            entry: entry.name(),
            argument: "a colour",
        });
    }
    Ok(())
}

/// Record of a single call made against a backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Draw {
        entry: DrawEntry,
        surface: SurfaceId,
        color: Option<Color>,
    },
    Set {
        setter: Setter,
        value: ParamValue,
    },
    Attach {
        hook: SurfaceHook,
        /// `None` for hooks that take no argument.
        surface: Option<SurfaceId>,
    },
}

impl BackendCall {
    pub fn entry_name(&self) -> &'static str {
        match self {
            Self::Draw { entry, .. } => entry.name(),
            Self::Set { setter, .. } => setter.name(),
            Self::Attach { hook, .. } => hook.name(),
        }
    }
}

impl fmt::Display for BackendCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draw {
                entry,
                surface,
                color,
            } => {
                write!(f, "{}(\"{surface}\"", entry.name())?;
                if let Some(color) = color {
                    f.write_str(", ")?;
                    write_color(f, color)?;
                }
                f.write_str(")")
            }
            Self::Set { setter, value } => write!(f, "{}({value})", setter.name()),
            Self::Attach {
                hook,
                surface: Some(surface),
            } => write!(f, "{}(\"{surface}\")", hook.name()),
            Self::Attach {
                hook,
                surface: None,
            } => write!(f, "{}()", hook.name()),
        }
    }
}

/// Shared, cloneable log of backend calls.
#[derive(Debug, Default, Clone)]
pub struct CallLog {
    calls: Arc<RwLock<Vec<BackendCall>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, call: BackendCall) {
        self.calls.write().push(call);
    }

    /// Returns a snapshot of every recorded call.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.read().clone()
    }

    pub fn len(&self) -> usize {
        self.calls.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.read().is_empty()
    }

    /// Number of draw calls issued through `entry`.
    pub fn draws_of(&self, entry: DrawEntry) -> usize {
        self.calls
            .read()
            .iter()
            .filter(|call| matches!(call, BackendCall::Draw { entry: e, .. } if *e == entry))
            .count()
    }

    pub fn last(&self) -> Option<BackendCall> {
        self.calls.read().last().cloned()
    }
}

/// In-process backend that records calls instead of rendering.
#[derive(Debug, Default)]
pub struct RecordingBackend {
    log: CallLog,
    failing: Option<&'static str>,
}

impl RecordingBackend {
    pub fn new(log: CallLog) -> Self {
        Self { log, failing: None }
    }

    /// Makes every call to the named entry point fail.
    pub fn failing_on(mut self, entry: &'static str) -> Self {
        self.failing = Some(entry);
        self
    }

    pub fn log(&self) -> &CallLog {
        &self.log
    }

    fn record(&self, call: BackendCall) -> Result<()> {
        let entry = call.entry_name();
        if self.failing == Some(entry) {
            return Err(ViewerError::Backend {
                entry,
                message: "rejected by recording backend".into(),
            });
        }
        debug!("backend call {call}");
        self.log.push(call);
        Ok(())
    }
}

impl Backend for RecordingBackend {
    fn draw(&mut self, entry: DrawEntry, surface: &SurfaceId, color: Option<Color>) -> Result<()> {
        check_color_argument(entry, color.as_ref())?;
        self.record(BackendCall::Draw {
            entry,
            surface: surface.clone(),
            color,
        })
    }

    fn set(&mut self, setter: Setter, value: ParamValue) -> Result<()> {
        if value.kind() != setter.kind() {
            return Err(ViewerError::ArgumentMismatch {
                entry: setter.name(),
                argument: kind_label(value.kind()),
            });
        }
        self.record(BackendCall::Set { setter, value })
    }

    fn attach(&mut self, hook: SurfaceHook, surface: &SurfaceId) -> Result<()> {
        self.record(BackendCall::Attach {
            hook,
            surface: hook.takes_surface().then(|| surface.clone()),
        })
    }
}

fn kind_label(kind: ParamKind) -> &'static str {
    match kind {
        ParamKind::Int => "an integer",
        ParamKind::Float => "a float",
        ParamKind::Bool => "a boolean",
        ParamKind::Color => "a colour",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_names_round_trip() {
        for entry in DrawEntry::ALL {
            assert_eq!(DrawEntry::from_name(entry.name()).unwrap(), entry);
        }
        for setter in Setter::ALL {
            assert_eq!(Setter::from_name(setter.name()).unwrap(), setter);
        }
        assert!(matches!(
            Setter::from_name("update_everything"),
            Err(ViewerError::UnknownEntryPoint(_))
        ));
    }

    #[test]
    fn recording_backend_logs_calls_in_order() {
        let log = CallLog::new();
        let mut backend = RecordingBackend::new(log.clone());
        let surface = SurfaceId::from("sin_wave");
        backend
            .set(Setter::SinResolution, ParamValue::Int(25))
            .unwrap();
        backend.draw(DrawEntry::SinDraw, &surface, None).unwrap();

        let calls = log.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].to_string(), "s_update_resolution(25)");
        assert_eq!(calls[1].to_string(), "sin_draw(\"sin_wave\")");
    }

    #[test]
    fn colour_is_rejected_by_colourless_entries() {
        let mut backend = RecordingBackend::default();
        let surface = SurfaceId::from("gradient");
        let err = backend
            .draw(DrawEntry::GradientDraw, &surface, Some([1.0, 0.0, 0.0, 1.0]))
            .unwrap_err();
        assert!(matches!(err, ViewerError::ArgumentMismatch { .. }));
        assert!(backend.log().is_empty());
    }

    #[test]
    fn setter_kind_mismatch_is_rejected() {
        let mut backend = RecordingBackend::default();
        let err = backend
            .set(Setter::PointBox, ParamValue::Int(1))
            .unwrap_err();
        assert!(matches!(err, ViewerError::ArgumentMismatch { .. }));
    }

    #[test]
    fn failing_entry_reports_backend_error() {
        let mut backend = RecordingBackend::default().failing_on("draw_square");
        let err = backend
            .draw(DrawEntry::DrawSquare, &SurfaceId::from("square"), None)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "backend call `draw_square` failed: rejected by recording backend"
        );
    }

    #[test]
    fn startup_hooks_pass_surface_only_when_declared() {
        let log = CallLog::new();
        let mut backend = RecordingBackend::new(log.clone());
        let surface = SurfaceId::from("user_input");
        backend.attach(SurfaceHook::UserInit, &surface).unwrap();
        backend.attach(SurfaceHook::DragInit, &surface).unwrap();
        backend
            .attach(SurfaceHook::PointInit, &SurfaceId::from("point"))
            .unwrap();

        let calls: Vec<String> = log.calls().iter().map(ToString::to_string).collect();
        assert_eq!(calls, ["user_init()", "drag_init()", "point_init(\"point\")"]);
        for hook in SurfaceHook::ALL {
            assert_eq!(SurfaceHook::from_name(hook.name()).unwrap(), hook);
        }
        assert!(SurfaceHook::from_name("mouse_init").is_err());
    }

    #[test]
    fn colour_draw_formats_tuple() {
        let call = BackendCall::Draw {
            entry: DrawEntry::DrawSquare,
            surface: SurfaceId::from("square"),
            color: Some([0.0, 0.5, 0.9, 1.0]),
        };
        assert_eq!(call.to_string(), "draw_square(\"square\", [0, 0.5, 0.9, 1])");
    }
}
