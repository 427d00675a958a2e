//! Scene controller for WebAssembly drawing demos.
//!
//! A page binds HTML controls to setters exported by a drawing module and
//! schedules its draw entry point once, on input or on every animation
//! frame. The lighting rig keeps a small spotlight scene whose parameters
//! follow the same controls. Everything outside [`web`] is platform neutral
//! so it can be driven headlessly by the `webgl-viewer` binary and tests.

pub mod backend;
pub mod controller;
pub mod controls;
pub mod draw_loop;
pub mod error;
pub mod lighting;
pub mod loader;
pub mod page;
pub mod params;
pub mod surface;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use backend::{Backend, BackendCall, CallLog, DrawEntry, RecordingBackend, Setter, SurfaceHook};
pub use controller::SceneController;
pub use controls::{BindingAction, ControlBinder, ControlBinding, ControlSurface, LabelSpec, StaticControls};
pub use draw_loop::{DrawLoop, FrameScheduler, ManualScheduler};
pub use error::{Result, ViewerError};
pub use lighting::{AngleConvention, LightingRig, RigFrame, RigLayout, SpotLight};
pub use loader::{LoadedModule, LoaderState, ModuleLoader};
pub use page::{LoopMode, PageDescriptor, PageSet};
pub use params::{Color, ParamKind, ParamValue};
pub use surface::SurfaceId;
