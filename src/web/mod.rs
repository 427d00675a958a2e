#![cfg(target_arch = "wasm32")]

mod backend;
mod dom;

use std::cell::RefCell;
use std::rc::Rc;

use anyhow::{anyhow, Context, Result};
use gloo_events::EventListener;
use glam::Vec3;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Window};

use crate::controller::SceneController;
use crate::draw_loop::FrameScheduler;
use crate::error::ViewerError;
use crate::lighting::{AngleConvention, LightingRig, RigLayout};
use crate::loader::ModuleLoader;
use crate::page::PageSet;

pub use backend::JsBackend;
pub use dom::{attach_page_listeners, attach_rig_listeners, DomControls};

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

#[wasm_bindgen(start)]
pub fn bootstrap() {
    console_error_panic_hook::set_once();
    let _ = wasm_logger::init(wasm_logger::Config::default());
}

/// Initializes `module`, then wires the named page's controls to it.
///
/// `config_xml` replaces the built-in page table when given. Listeners are
/// attached only after the module's initializer has resolved.
#[wasm_bindgen]
pub async fn run_page(
    page: String,
    module: JsValue,
    config_xml: Option<String>,
) -> Result<PageHandle, JsValue> {
    launch_page(&page, module, config_xml.as_deref())
        .await
        .map_err(|err| JsValue::from_str(&format!("{err:#}")))
}

async fn launch_page(name: &str, module: JsValue, config_xml: Option<&str>) -> Result<PageHandle> {
    let pages = match config_xml {
        Some(xml) => PageSet::from_xml(xml).context("failed to parse page configuration")?,
        None => PageSet::builtin()?,
    };
    let page = pages.get(name)?.clone();

    let mut loader = ModuleLoader::new();
    let module = loader
        .initialize(JsBackend::initialize(module))
        .await
        .context("failed to initialize drawing module")?;

    let mut controls = DomControls::new()?;
    let mut controller = SceneController::new(module, page);
    controller.start(&mut controls)?;

    let controller = Rc::new(RefCell::new(controller));
    let listeners = attach_page_listeners(&controller, &controls)?;
    let animation = if controller.borrow().wants_frames() {
        Some(start_animation(Rc::clone(&controller))?)
    } else {
        None
    };

    log::info!(
        "page `{name}` running ({} listener(s), animated: {})",
        listeners.len(),
        animation.is_some()
    );
    Ok(PageHandle {
        controller,
        _listeners: listeners,
        _callback: animation,
    })
}

/// Keeps a running page alive. Dropping it detaches the input listeners.
#[wasm_bindgen]
pub struct PageHandle {
    controller: Rc<RefCell<SceneController<JsBackend>>>,
    _listeners: Vec<EventListener>,
    _callback: Option<FrameCallback>,
}

#[wasm_bindgen]
impl PageHandle {
    #[wasm_bindgen(getter)]
    pub fn name(&self) -> String {
        self.controller.borrow().page().name.clone()
    }

    #[wasm_bindgen(js_name = framesDrawn)]
    pub fn frames_drawn(&self) -> f64 {
        self.controller.borrow().frames_drawn() as f64
    }
}

struct AnimationLoop<'a> {
    window: &'a Window,
    callback: &'a Closure<dyn FnMut()>,
}

impl FrameScheduler for AnimationLoop<'_> {
    fn request_frame(&mut self) -> crate::error::Result<()> {
        self.window
            .request_animation_frame(self.callback.as_ref().unchecked_ref())
            .map(drop)
            .map_err(|err| ViewerError::Backend {
                entry: "requestAnimationFrame",
                message: backend::describe(&err),
            })
    }
}

fn start_animation(controller: Rc<RefCell<SceneController<JsBackend>>>) -> Result<FrameCallback> {
    let window = window().ok_or_else(|| anyhow!("window not available"))?;
    let slot: FrameCallback = Rc::new(RefCell::new(None));

    let frame_slot = Rc::clone(&slot);
    let frame_window = window.clone();
    let closure = Closure::wrap(Box::new(move || {
        let slot = frame_slot.borrow();
        let Some(callback) = slot.as_ref() else {
            return;
        };
        let mut scheduler = AnimationLoop {
            window: &frame_window,
            callback,
        };
        if let Err(err) = controller.borrow_mut().on_frame(&mut scheduler) {
            log::error!("draw loop stopped: {err}");
        }
    }) as Box<dyn FnMut()>);

    AnimationLoop {
        window: &window,
        callback: &closure,
    }
    .request_frame()?;
    *slot.borrow_mut() = Some(closure);
    Ok(slot)
}

/// Spotlight rig exposed to the page script that owns the Three.js scene.
#[wasm_bindgen]
pub struct WasmLightingRig {
    rig: Rc<RefCell<LightingRig>>,
    controls: DomControls,
    listeners: Vec<EventListener>,
}

#[wasm_bindgen]
impl WasmLightingRig {
    /// `convention` overrides the layout's angle convention when given.
    #[wasm_bindgen(constructor)]
    pub fn new(layout: &str, convention: Option<String>) -> Result<WasmLightingRig, JsValue> {
        let mut layout = RigLayout::by_name(layout)
            .ok_or_else(|| JsValue::from_str(&format!("unknown rig layout `{layout}`")))?;
        if let Some(name) = convention {
            let convention = AngleConvention::from_name(&name)
                .ok_or_else(|| JsValue::from_str(&format!("unknown angle convention `{name}`")))?;
            layout = layout.with_convention(convention);
        }
        let controls = DomControls::new().map_err(to_js)?;
        Ok(Self {
            rig: Rc::new(RefCell::new(LightingRig::new(layout))),
            controls,
            listeners: Vec::new(),
        })
    }

    /// Listens to the rig's sliders, checkbox and selector and seeds them
    /// from the selected light.
    #[wasm_bindgen(js_name = bindControls)]
    pub fn bind_controls(&mut self) -> Result<usize, JsValue> {
        self.rig
            .borrow()
            .refresh_controls(&mut self.controls)
            .map_err(to_js)?;
        self.listeners = attach_rig_listeners(&self.rig, &self.controls);
        Ok(self.listeners.len())
    }

    /// Applies one control value; used for inputs the DOM listeners do not
    /// see, such as the colour picker.
    #[wasm_bindgen(js_name = applyInput)]
    pub fn apply_input(&mut self, control: &str, value: &str) -> Result<(), JsValue> {
        self.rig
            .borrow_mut()
            .apply_input(control, value)
            .map(drop)
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = selectLight)]
    pub fn select_light(&mut self, index: usize) -> Result<JsValue, JsValue> {
        let controls = self.rig.borrow_mut().select_light(index).map_err(to_js)?;
        self.rig
            .borrow()
            .refresh_controls(&mut self.controls)
            .map_err(to_js)?;
        Ok(serde_wasm_bindgen::to_value(&controls)?)
    }

    #[wasm_bindgen(js_name = dragProxy)]
    pub fn drag_proxy(&mut self, index: usize, x: f32, y: f32, z: f32) -> Result<(), JsValue> {
        self.rig
            .borrow_mut()
            .drag_proxy(index, Vec3::new(x, y, z))
            .map_err(to_js)
    }

    pub fn controls(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.rig.borrow().controls())?)
    }

    /// Advances one frame and returns the scene state to render.
    pub fn frame(&mut self) -> Result<JsValue, JsValue> {
        let frame = self.rig.borrow_mut().frame();
        Ok(serde_wasm_bindgen::to_value(&frame)?)
    }
}

fn to_js(err: ViewerError) -> JsValue {
    JsValue::from_str(&err.to_string())
}
