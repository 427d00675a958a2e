use std::collections::BTreeSet;

use roxmltree::{Document, Node};

use crate::backend::{DrawEntry, Setter, SurfaceHook};
use crate::controls::{ControlBinder, ControlBinding, LabelSpec};
use crate::error::{Result, ViewerError};
use crate::params::{parse_param, Color, ParamKind, ParamValue};
use crate::surface::SurfaceId;

/// Demo pages shipped with the viewer.
pub const BUILTIN_PAGES: &str = r#"
<pages>
    <page name="square" surface="square" draw="draw_square" mode="once" colour="0.0 0.5 0.9 1.0">
        <colour form="color-changer" draw="draw_square" red="red" green="green" blue="blue"/>
    </page>
    <page name="triangle" surface="triangle" draw="draw_triangle" mode="once" colour="1.0 0.0 0.0 1.0">
        <colour form="color-changer" draw="draw_triangle" red="red" green="green" blue="blue"/>
    </page>
    <page name="special" surface="special" draw="draw" mode="continuous">
        <bind control="shape_sides" setter="update_sides"/>
        <bind control="rotation_speed" setter="update_rotation_speed"/>
        <bind control="colour_speed" setter="update_colour_speed"/>
    </page>
    <page name="gradient" surface="gradient" draw="gradient_draw" mode="continuous">
        <bind control="shape_sides" setter="g_update_sides" label="shape_sides_text" prefix="sides: "/>
    </page>
    <page name="point" surface="point" draw="point_draw" mode="continuous">
        <startup hook="point_init"/>
        <initial control="shape_sides" value="10"/>
        <bind control="shape_sides" setter="p_update_resolution" label="shape_sides_text" prefix="resolution: "/>
    </page>
    <page name="sin_wave" surface="sin_wave" draw="sin_draw" mode="on-input">
        <initial control="wavelength" value="10"/>
        <bind control="resolution" setter="s_update_resolution" label="resolution_text" prefix="resolution: " redraw="true"/>
        <bind control="wavelength" setter="s_update_wavelength" label="wavelength_text" prefix="wavelength: " redraw="true"/>
    </page>
    <page name="user_input" surface="user_input" mode="module">
        <startup hook="user_init"/>
        <startup hook="drag_init"/>
    </page>
</pages>
"#;

/// How a page schedules its draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMode {
    /// Redraw on every animation frame.
    Continuous,
    /// Redraw only when a binding asks for it.
    OnInput,
    /// Draw once after initialization; bindings draw on their own.
    Once,
    /// The module runs its own frames once its startup hooks have run. Such
    /// pages have no draw entry.
    Module,
}

impl LoopMode {
    fn parse(value: &str) -> Result<Self> {
        match value {
            "continuous" => Ok(Self::Continuous),
            "on-input" => Ok(Self::OnInput),
            "once" => Ok(Self::Once),
            "module" => Ok(Self::Module),
            other => Err(ViewerError::Config(format!("unknown loop mode `{other}`"))),
        }
    }
}

/// Control value written before the page becomes interactive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitialValue {
    pub control: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageDescriptor {
    pub name: String,
    pub surface: SurfaceId,
    /// Absent only for [`LoopMode::Module`] pages.
    pub draw: Option<DrawEntry>,
    pub mode: LoopMode,
    pub color: Option<Color>,
    pub initial: Vec<InitialValue>,
    pub hooks: Vec<SurfaceHook>,
    pub binder: ControlBinder,
}

/// Collection of page descriptors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PageSet {
    pages: Vec<PageDescriptor>,
}

impl PageSet {
    pub fn builtin() -> Result<Self> {
        Self::from_xml(BUILTIN_PAGES)
    }

    /// Parses a `<pages>` document.
    pub fn from_xml(xml: &str) -> Result<Self> {
        let document = Document::parse(xml)?;
        let mut pages = Vec::new();
        for node in document.descendants().filter(|n| n.has_tag_name("page")) {
            let page = parse_page(&node)?;
            if pages.iter().any(|p: &PageDescriptor| p.name == page.name) {
                return Err(ViewerError::Config(format!(
                    "page `{}` is defined twice",
                    page.name
                )));
            }
            pages.push(page);
        }
        Ok(Self { pages })
    }

    pub fn pages(&self) -> &[PageDescriptor] {
        &self.pages
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().map(|page| page.name.as_str())
    }

    pub fn get(&self, name: &str) -> Result<&PageDescriptor> {
        self.pages
            .iter()
            .find(|page| page.name == name)
            .ok_or_else(|| ViewerError::UnknownPage(name.to_string()))
    }
}

fn parse_page(node: &Node<'_, '_>) -> Result<PageDescriptor> {
    let name = required_attr(node, "name")?;
    let surface = optional_attr(node, "surface").unwrap_or_else(|| name.clone());
    let mode = match optional_attr(node, "mode") {
        Some(mode) => LoopMode::parse(&mode)?,
        None => LoopMode::Continuous,
    };
    let draw = match (mode, optional_attr(node, "draw")) {
        (LoopMode::Module, None) => None,
        (LoopMode::Module, Some(_)) => {
            return Err(ViewerError::Config(format!(
                "page `{name}`: module-driven pages take no draw entry"
            )))
        }
        (_, Some(draw)) => Some(DrawEntry::from_name(&draw)?),
        (_, None) => {
            return Err(ViewerError::Config(format!(
                "page `{name}` is missing the `draw` attribute"
            )))
        }
    };
    let color = match (optional_attr(node, "colour"), draw) {
        (Some(raw), Some(entry)) if entry.accepts_color() => {
            match parse_param(ParamKind::Color, &raw) {
                ParamValue::Color(color) => Some(color),
                _ => None,
            }
        }
        (Some(_), _) => {
            return Err(ViewerError::Config(format!(
                "page `{name}`: {} does not take a colour",
                draw.map_or("a page without a draw entry", DrawEntry::name)
            )))
        }
        (None, _) => None,
    };

    let mut initial = Vec::new();
    let mut hooks = Vec::new();
    let mut bindings = Vec::new();
    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "initial" => initial.push(InitialValue {
                control: required_attr(&child, "control")?,
                value: required_attr(&child, "value")?,
            }),
            "startup" => hooks.push(SurfaceHook::from_name(&required_attr(&child, "hook")?)?),
            "bind" => bindings.push(parse_binding(&child)?),
            "colour" => bindings.push(parse_colour_binding(&child)?),
            other => {
                return Err(ViewerError::Config(format!(
                    "page `{name}`: unexpected <{other}> element"
                )))
            }
        }
    }

    let mut triggers = BTreeSet::new();
    for binding in &bindings {
        for id in binding.triggers() {
            if !triggers.insert(id) {
                return Err(ViewerError::Config(format!(
                    "page `{name}`: control `{id}` is bound more than once"
                )));
            }
        }
        if binding.redraw && draw.is_none() {
            return Err(ViewerError::Config(format!(
                "page `{name}`: `{}` asks for a redraw but the page has no draw entry",
                binding.control
            )));
        }
    }

    Ok(PageDescriptor {
        name,
        surface: SurfaceId::new(surface),
        draw,
        mode,
        color,
        initial,
        hooks,
        binder: ControlBinder::new(bindings),
    })
}

fn parse_binding(node: &Node<'_, '_>) -> Result<ControlBinding> {
    let control = required_attr(node, "control")?;
    let setter = Setter::from_name(&required_attr(node, "setter")?)?;
    let mut binding = ControlBinding::setter(control, setter);
    binding.label = parse_label(node)?;
    binding.redraw = parse_bool_attr(node, "redraw")?;
    Ok(binding)
}

fn parse_colour_binding(node: &Node<'_, '_>) -> Result<ControlBinding> {
    let form = required_attr(node, "form")?;
    let entry = DrawEntry::from_name(&required_attr(node, "draw")?)?;
    if !entry.accepts_color() {
        return Err(ViewerError::Config(format!(
            "colour form `{form}` targets `{}`, which does not take a colour",
            entry.name()
        )));
    }
    let channels = [
        required_attr(node, "red")?,
        required_attr(node, "green")?,
        required_attr(node, "blue")?,
    ];
    let mut binding = ControlBinding::color(
        form,
        entry,
        [
            channels[0].as_str(),
            channels[1].as_str(),
            channels[2].as_str(),
        ],
    );
    binding.label = parse_label(node)?;
    binding.redraw = parse_bool_attr(node, "redraw")?;
    Ok(binding)
}

fn parse_label(node: &Node<'_, '_>) -> Result<Option<LabelSpec>> {
    match (node.attribute("label"), node.attribute("prefix")) {
        (Some(id), prefix) => Ok(Some(LabelSpec::new(id, prefix.unwrap_or_default()))),
        (None, Some(_)) => Err(ViewerError::Config(
            "label prefix given without a label element".into(),
        )),
        (None, None) => Ok(None),
    }
}

fn parse_bool_attr(node: &Node<'_, '_>, name: &str) -> Result<bool> {
    match node.attribute(name) {
        None | Some("false") => Ok(false),
        Some("true") => Ok(true),
        Some(other) => Err(ViewerError::Config(format!(
            "attribute `{name}` must be true or false, got `{other}`"
        ))),
    }
}

fn required_attr(node: &Node<'_, '_>, name: &str) -> Result<String> {
    optional_attr(node, name).ok_or_else(|| {
        ViewerError::Config(format!(
            "<{}> is missing the `{name}` attribute",
            node.tag_name().name()
        ))
    })
}

fn optional_attr(node: &Node<'_, '_>, name: &str) -> Option<String> {
    node.attribute(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
