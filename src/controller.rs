use log::{debug, info, warn};

use crate::backend::Backend;
use crate::controls::{ControlSurface, Dispatch};
use crate::draw_loop::{DrawLoop, FrameScheduler};
use crate::error::Result;
use crate::loader::LoadedModule;
use crate::page::{LoopMode, PageDescriptor};

/// Owns everything one demo page needs: the initialized backend, the
/// control table and the draw loop. Event handlers receive the controller by
/// reference instead of reaching for module-level state.
#[derive(Debug)]
pub struct SceneController<B> {
    backend: B,
    page: PageDescriptor,
    draw_loop: Option<DrawLoop>,
    started: bool,
}

impl<B: Backend> SceneController<B> {
    pub fn new(module: LoadedModule<B>, page: PageDescriptor) -> Self {
        let draw_loop = page
            .draw
            .map(|entry| DrawLoop::new(page.surface.clone(), entry));
        Self {
            backend: module.into_backend(),
            page,
            draw_loop,
            started: false,
        }
    }

    pub fn page(&self) -> &PageDescriptor {
        &self.page
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn frames_drawn(&self) -> u64 {
        self.draw_loop.as_ref().map_or(0, DrawLoop::frames)
    }

    /// Whether the page redraws on every animation frame.
    pub fn wants_frames(&self) -> bool {
        self.page.mode == LoopMode::Continuous
    }

    /// Seeds initial control values, runs the page's startup hooks and
    /// performs the single draw of a `Once` page.
    pub fn start(&mut self, controls: &mut dyn ControlSurface) -> Result<()> {
        if self.started {
            warn!("page `{}` already started", self.page.name);
            return Ok(());
        }
        for initial in &self.page.initial {
            controls.set_value(&initial.control, &initial.value)?;
        }
        for hook in &self.page.hooks {
            self.backend.attach(*hook, &self.page.surface)?;
        }
        if let (LoopMode::Once, Some(entry)) = (self.page.mode, self.page.draw) {
            self.backend
                .draw(entry, &self.page.surface, self.page.color)?;
        }
        self.started = true;
        info!(
            "page `{}` started on surface `{}` ({} binding(s))",
            self.page.name,
            self.page.surface,
            self.page.binder.bindings().len()
        );
        Ok(())
    }

    /// Forwards input on `control` to its setter and redraws if the binding
    /// asks for it.
    pub fn handle_input(
        &mut self,
        control: &str,
        controls: &mut dyn ControlSurface,
    ) -> Result<Dispatch> {
        let dispatch =
            self.page
                .binder
                .dispatch(control, &self.page.surface, controls, &mut self.backend)?;
        if let (true, Some(draw_loop)) = (dispatch.redraw, &self.draw_loop) {
            draw_loop.draw(&mut self.backend)?;
        }
        debug!("dispatched `{control}` = {}", dispatch.value);
        Ok(dispatch)
    }

    /// Body of one animation frame. Pages that do not redraw continuously
    /// ignore it.
    pub fn on_frame<S: FrameScheduler + ?Sized>(&mut self, scheduler: &mut S) -> Result<()> {
        match &mut self.draw_loop {
            Some(draw_loop) if self.page.mode == LoopMode::Continuous => {
                draw_loop.on_frame(&mut self.backend, scheduler)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use pollster::block_on;

    use super::*;
    use crate::backend::{BackendCall, CallLog, DrawEntry, RecordingBackend, Setter, SurfaceHook};
    use crate::controls::StaticControls;
    use crate::draw_loop::ManualScheduler;
    use crate::loader::ModuleLoader;
    use crate::page::PageSet;
    use crate::params::ParamValue;
    use crate::surface::SurfaceId;

    fn controller(page: &str) -> (SceneController<RecordingBackend>, CallLog) {
        let log = CallLog::new();
        let backend = RecordingBackend::new(log.clone());
        let module = block_on(ModuleLoader::new().initialize(async { Ok(backend) })).unwrap();
        let page = PageSet::builtin().unwrap().get(page).unwrap().clone();
        (SceneController::new(module, page), log)
    }

    #[test]
    fn sine_input_sets_then_redraws() {
        let (mut controller, log) = controller("sin_wave");
        let mut controls = StaticControls::new();
        controller.start(&mut controls).unwrap();
        assert!(log.is_empty());
        assert_eq!(controls.value("wavelength").as_deref(), Some("10"));

        controls.set_value("resolution", "25").unwrap();
        controller.handle_input("resolution", &mut controls).unwrap();

        assert_eq!(controls.label("resolution_text"), Some("resolution: 25"));
        assert_eq!(
            log.calls(),
            vec![
                BackendCall::Set {
                    setter: Setter::SinResolution,
                    value: ParamValue::Int(25),
                },
                BackendCall::Draw {
                    entry: DrawEntry::SinDraw,
                    surface: SurfaceId::from("sin_wave"),
                    color: None,
                },
            ]
        );
        assert!(!controller.wants_frames());
        assert_eq!(controller.frames_drawn(), 0);
    }

    #[test]
    fn square_draws_once_with_default_colour() {
        let (mut controller, log) = controller("square");
        controller.start(&mut StaticControls::new()).unwrap();
        assert_eq!(
            log.calls(),
            vec![BackendCall::Draw {
                entry: DrawEntry::DrawSquare,
                surface: SurfaceId::from("square"),
                color: Some([0.0, 0.5, 0.9, 1.0]),
            }]
        );

        let mut scheduler = ManualScheduler::new();
        controller.on_frame(&mut scheduler).unwrap();
        assert_eq!(log.len(), 1);
        assert!(!scheduler.is_pending());
    }

    #[test]
    fn point_page_attaches_mouse_tracking_once() {
        let (mut controller, log) = controller("point");
        let mut controls = StaticControls::new();
        controller.start(&mut controls).unwrap();
        controller.start(&mut controls).unwrap();
        assert_eq!(
            log.calls(),
            vec![BackendCall::Attach {
                hook: SurfaceHook::PointInit,
                surface: Some(SurfaceId::from("point")),
            }]
        );
        assert_eq!(controls.value("shape_sides").as_deref(), Some("10"));
    }

    #[test]
    fn module_driven_page_only_runs_startup_hooks() {
        let (mut controller, log) = controller("user_input");
        controller.start(&mut StaticControls::new()).unwrap();
        let mut scheduler = ManualScheduler::new();
        controller.on_frame(&mut scheduler).unwrap();

        let calls: Vec<String> = controller
            .backend()
            .log()
            .calls()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(calls, ["user_init()", "drag_init()"]);
        assert_eq!(log.len(), 2);
        assert!(!controller.wants_frames());
        assert!(!scheduler.is_pending());
        assert_eq!(controller.frames_drawn(), 0);
    }

    #[test]
    fn continuous_page_draws_every_frame() {
        let (mut controller, log) = controller("gradient");
        controller.start(&mut StaticControls::new()).unwrap();
        let mut scheduler = ManualScheduler::new();
        scheduler.request_frame().unwrap();
        for _ in 0..3 {
            assert!(scheduler.take_frame());
            controller.on_frame(&mut scheduler).unwrap();
        }
        assert_eq!(controller.frames_drawn(), 3);
        assert_eq!(log.draws_of(DrawEntry::GradientDraw), 3);
    }

    #[test]
    fn input_between_frames_lands_before_next_draw() {
        let (mut controller, log) = controller("gradient");
        let mut controls = StaticControls::new().with_value("shape_sides", "6");
        controller.start(&mut controls).unwrap();
        let mut scheduler = ManualScheduler::new();
        scheduler.request_frame().unwrap();

        assert!(scheduler.take_frame());
        controller.on_frame(&mut scheduler).unwrap();
        controller.handle_input("shape_sides", &mut controls).unwrap();
        assert!(scheduler.take_frame());
        controller.on_frame(&mut scheduler).unwrap();

        let calls: Vec<String> = log.calls().iter().map(ToString::to_string).collect();
        assert_eq!(
            calls,
            [
                "gradient_draw(\"gradient\")",
                "g_update_sides(6)",
                "gradient_draw(\"gradient\")",
            ]
        );
        assert_eq!(controls.label("shape_sides_text"), Some("sides: 6"));
    }
}
