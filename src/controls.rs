use std::collections::BTreeMap;

use log::{debug, warn};

use crate::backend::{Backend, DrawEntry, Setter};
use crate::error::{Result, ViewerError};
use crate::params::{assemble_color, parse_param, ParamValue};
use crate::surface::SurfaceId;

/// Access to the UI controls of a page.
pub trait ControlSurface {
    /// Current string value of a control, `None` if the element is absent.
    fn value(&self, id: &str) -> Option<String>;

    fn set_value(&mut self, id: &str, value: &str) -> Result<()>;

    fn set_label(&mut self, id: &str, text: &str) -> Result<()>;
}

/// Controls held in memory, used by the headless runner and tests.
#[derive(Debug, Clone, Default)]
pub struct StaticControls {
    values: BTreeMap<String, String>,
    labels: BTreeMap<String, String>,
}

impl StaticControls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, id: &str, value: &str) -> Self {
        self.values.insert(id.to_string(), value.to_string());
        self
    }

    pub fn label(&self, id: &str) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    pub fn labels(&self) -> impl Iterator<Item = (&str, &str)> {
        self.labels.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl ControlSurface for StaticControls {
    fn value(&self, id: &str) -> Option<String> {
        self.values.get(id).cloned()
    }

    fn set_value(&mut self, id: &str, value: &str) -> Result<()> {
        self.values.insert(id.to_string(), value.to_string());
        Ok(())
    }

    fn set_label(&mut self, id: &str, text: &str) -> Result<()> {
        self.labels.insert(id.to_string(), text.to_string());
        Ok(())
    }
}

/// Status label mirrored after each input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSpec {
    pub id: String,
    pub prefix: String,
}

impl LabelSpec {
    pub fn new(id: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            prefix: prefix.into(),
        }
    }

    pub fn text(&self, raw: &str) -> String {
        label_text(&self.prefix, raw)
    }
}

pub fn label_text(prefix: &str, raw: &str) -> String {
    format!("{prefix}{raw}")
}

/// What a binding forwards to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BindingAction {
    Set(Setter),
    /// Re-sends all three channels (plus alpha) to a colour draw entry.
    Color {
        entry: DrawEntry,
        channels: [String; 3],
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ControlBinding {
    /// Element the input listener is attached to.
    pub control: String,
    pub action: BindingAction,
    pub label: Option<LabelSpec>,
    /// Redraw the page surface after the setter runs.
    pub redraw: bool,
}

impl ControlBinding {
    pub fn setter(control: impl Into<String>, setter: Setter) -> Self {
        Self {
            control: control.into(),
            action: BindingAction::Set(setter),
            label: None,
            redraw: false,
        }
    }

    pub fn color(form: impl Into<String>, entry: DrawEntry, channels: [&str; 3]) -> Self {
        Self {
            control: form.into(),
            action: BindingAction::Color {
                entry,
                channels: channels.map(str::to_string),
            },
            label: None,
            redraw: false,
        }
    }

    pub fn with_label(mut self, label: LabelSpec) -> Self {
        self.label = Some(label);
        self
    }

    pub fn redrawing(mut self) -> Self {
        self.redraw = true;
        self
    }

    /// Ids whose input fires this binding: the control, plus the channels
    /// of a colour form.
    pub fn triggers(&self) -> impl Iterator<Item = &str> {
        let channels: &[String] = match &self.action {
            BindingAction::Color { channels, .. } => channels,
            BindingAction::Set(_) => &[],
        };
        std::iter::once(self.control.as_str()).chain(channels.iter().map(String::as_str))
    }

    /// Whether input on `id` should fire this binding.
    pub fn triggered_by(&self, id: &str) -> bool {
        self.triggers().any(|trigger| trigger == id)
    }
}

/// Outcome of one dispatched input.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub control: String,
    pub value: ParamValue,
    pub label: Option<(String, String)>,
    pub redraw: bool,
}

/// Table of control bindings for one page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlBinder {
    bindings: Vec<ControlBinding>,
}

impl ControlBinder {
    pub fn new(bindings: Vec<ControlBinding>) -> Self {
        Self { bindings }
    }

    pub fn bindings(&self) -> &[ControlBinding] {
        &self.bindings
    }

    pub fn binding_for(&self, id: &str) -> Option<&ControlBinding> {
        self.bindings.iter().find(|binding| binding.triggered_by(id))
    }

    /// Element ids that need an input listener.
    pub fn listen_targets(&self) -> impl Iterator<Item = &str> {
        self.bindings.iter().map(|binding| binding.control.as_str())
    }

    /// Reads the control behind `id`, forwards it to its single backend entry
    /// point and mirrors the raw value into the binding's label.
    pub fn dispatch<B: Backend + ?Sized>(
        &self,
        id: &str,
        surface: &SurfaceId,
        controls: &mut dyn ControlSurface,
        backend: &mut B,
    ) -> Result<Dispatch> {
        let binding = self
            .binding_for(id)
            .ok_or_else(|| ViewerError::UnboundControl(id.to_string()))?;

        let (value, raw) = match &binding.action {
            BindingAction::Set(setter) => {
                let raw = controls
                    .value(&binding.control)
                    .ok_or_else(|| ViewerError::MissingControl(binding.control.clone()))?;
                let value = parse_param(setter.kind(), &raw);
                debug!("{} -> {}({value})", binding.control, setter.name());
                backend.set(*setter, value)?;
                (value, raw)
            }
            BindingAction::Color { entry, channels } => {
                let raws = channels.clone().map(|channel| {
                    controls.value(&channel).unwrap_or_else(|| {
                        warn!("colour channel `{channel}` not found, treating as 0");
                        String::new()
                    })
                });
                let color = assemble_color([&raws[0], &raws[1], &raws[2]]);
                let value = ParamValue::Color(color);
                debug!("{} -> {}({value})", binding.control, entry.name());
                backend.draw(*entry, surface, Some(color))?;
                (value, value.to_string())
            }
        };

        let label = match &binding.label {
            Some(spec) => {
                let text = spec.text(&raw);
                controls.set_label(&spec.id, &text)?;
                Some((spec.id.clone(), text))
            }
            None => None,
        };

        Ok(Dispatch {
            control: binding.control.clone(),
            value,
            label,
            redraw: binding.redraw,
        })
    }
}
