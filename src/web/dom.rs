use std::cell::RefCell;
use std::rc::Rc;

use gloo_events::EventListener;
use log::{error, warn};
use wasm_bindgen::JsCast;
use web_sys::{window, Document, Element, HtmlElement, HtmlInputElement, HtmlSelectElement};

use crate::backend::Backend;
use crate::controller::SceneController;
use crate::controls::ControlSurface;
use crate::error::{Result, ViewerError};
use crate::lighting::{self, LightingRig, RigUpdate};
use crate::params::parse_bool;

/// [`ControlSurface`] over the page's DOM elements.
#[derive(Clone)]
pub struct DomControls {
    document: Document,
}

impl DomControls {
    pub fn new() -> Result<Self> {
        let document = window()
            .and_then(|window| window.document())
            .ok_or_else(|| ViewerError::Initialization("document not available".into()))?;
        Ok(Self { document })
    }

    pub fn element(&self, id: &str) -> Option<Element> {
        self.document.get_element_by_id(id)
    }
}

impl ControlSurface for DomControls {
    fn value(&self, id: &str) -> Option<String> {
        let element = self.element(id)?;
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            if input.type_() == "checkbox" {
                return Some(input.checked().to_string());
            }
            return Some(input.value());
        }
        if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
            return Some(select.value());
        }
        element.text_content()
    }

    fn set_value(&mut self, id: &str, value: &str) -> Result<()> {
        let Some(element) = self.element(id) else {
            warn!("control `{id}` not found; ignoring value {value}");
            return Ok(());
        };
        if let Some(input) = element.dyn_ref::<HtmlInputElement>() {
            if input.type_() == "checkbox" {
                input.set_checked(parse_bool(value));
            } else {
                input.set_value(value);
            }
            return Ok(());
        }
        if let Some(select) = element.dyn_ref::<HtmlSelectElement>() {
            select.set_value(value);
            return Ok(());
        }
        warn!("`{id}` is not an input; ignoring value {value}");
        Ok(())
    }

    fn set_label(&mut self, id: &str, text: &str) -> Result<()> {
        match self
            .element(id)
            .and_then(|element| element.dyn_into::<HtmlElement>().ok())
        {
            Some(label) => label.set_inner_text(text),
            None => warn!("label element `{id}` not found"),
        }
        Ok(())
    }
}

/// Attaches one `input` listener per binding of the controller's page.
pub fn attach_page_listeners<B: Backend + 'static>(
    controller: &Rc<RefCell<SceneController<B>>>,
    controls: &DomControls,
) -> Result<Vec<EventListener>> {
    let targets: Vec<String> = controller
        .borrow()
        .page()
        .binder
        .listen_targets()
        .map(str::to_string)
        .collect();

    let mut listeners = Vec::with_capacity(targets.len());
    for target in targets {
        let element = controls
            .element(&target)
            .ok_or_else(|| ViewerError::MissingControl(target.clone()))?;
        let controller = Rc::clone(controller);
        let mut controls = controls.clone();
        listeners.push(EventListener::new(&element, "input", move |event| {
            event.prevent_default();
            if let Err(err) = controller.borrow_mut().handle_input(&target, &mut controls) {
                error!("input on `{target}` failed: {err}");
            }
        }));
    }
    Ok(listeners)
}

/// Attaches listeners for every rig control present in the document.
pub fn attach_rig_listeners(
    rig: &Rc<RefCell<LightingRig>>,
    controls: &DomControls,
) -> Vec<EventListener> {
    let bindings = [
        (lighting::LEFT_RIGHT, "input"),
        (lighting::UP_DOWN, "input"),
        (lighting::INTENSITY, "input"),
        (lighting::SIZE, "input"),
        (lighting::FOCUS, "input"),
        (lighting::HELP_LINES, "change"),
        (lighting::LIGHT_SELECTOR, "change"),
    ];

    let mut listeners = Vec::new();
    for (id, event_type) in bindings {
        let Some(element) = controls.element(id) else {
            continue;
        };
        let rig = Rc::clone(rig);
        let mut controls = controls.clone();
        listeners.push(EventListener::new(&element, event_type, move |_event| {
            let Some(raw) = controls.value(id) else {
                return;
            };
            let mut rig = rig.borrow_mut();
            match rig.apply_input(id, &raw) {
                Ok(RigUpdate::Selected(_)) => {
                    if let Err(err) = rig.refresh_controls(&mut controls) {
                        error!("failed to refresh rig controls: {err}");
                    }
                }
                Ok(_) => {}
                Err(err) => error!("input on `{id}` failed: {err}"),
            }
        }));
    }
    listeners
}
