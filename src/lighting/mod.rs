//! Spotlight rigs: a ground plane, ambient light and one to three spotlights
//! whose parameters are driven by a single set of controls.
//!
//! Controls never close over a particular light. Every input goes through
//! [`LightingRig::apply_input`], which mutates `lights[selected]`; after the
//! selection changes, [`LightingRig::refresh_controls`] pulls the newly
//! selected light's parameters back into the UI.

mod angle;

use glam::{Vec2, Vec3};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::controls::ControlSurface;
use crate::error::{Result, ViewerError};
use crate::params::parse_bool;

pub use angle::{target_offset, AngleConvention};

pub const LEFT_RIGHT: &str = "left_right";
pub const UP_DOWN: &str = "up_down";
pub const INTENSITY: &str = "intensity";
pub const SIZE: &str = "size";
pub const FOCUS: &str = "focus";
pub const PICKER: &str = "picker";
pub const HELP_LINES: &str = "help_lines";
pub const LIGHT_SELECTOR: &str = "light-selector";

/// Distance between a light and its target in the horizontal plane.
pub const TARGET_RADIUS: f32 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    pub position: Vec3,
    pub target: Vec3,
    pub color: Vec3,
    pub intensity: f32,
    /// Cone angle in radians.
    pub angle: f32,
    pub penumbra: f32,
    /// Zero means the beam never falls off.
    pub distance: f32,
    /// Polar heading of the target in degrees.
    pub heading: f32,
}

impl SpotLight {
    pub fn new(position: Vec3, target_height: f32, heading: f32) -> Self {
        Self {
            position,
            target: Vec3::new(position.x, target_height, position.z),
            color: Vec3::ONE,
            intensity: 1.0,
            angle: 0.1,
            penumbra: 0.6,
            distance: 0.0,
            heading,
        }
    }

    fn aim(&mut self, radius: f32, convention: AngleConvention) {
        let offset: Vec2 = target_offset(self.heading, radius, convention);
        self.target.x = self.position.x + offset.x;
        self.target.z = self.position.z + offset.y;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmbientLight {
    pub color: Vec3,
    pub intensity: f32,
}

/// Horizontal plane centred on the origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    pub name: String,
    pub size: f32,
    pub height: f32,
    pub color: Vec3,
}

/// Draggable box standing in for a light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxProxy {
    pub light: usize,
    pub position: Vec3,
    pub size: f32,
}

/// Parameters of the selected light as presented by the controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightControls {
    pub light: usize,
    pub left_right: f32,
    pub up_down: f32,
    pub intensity: f32,
    /// Cone angle in degrees.
    pub size: f32,
    pub focus: f32,
    pub color: String,
    pub help_lines: bool,
}

/// Effect of one control input on the rig.
#[derive(Debug, Clone, PartialEq)]
pub enum RigUpdate {
    Light(usize),
    Selected(LightControls),
    Helpers(bool),
    Ignored,
}

/// Helper wireframe drawn for a light when helpers are visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightHelper {
    pub light: usize,
    pub from: Vec3,
    pub to: Vec3,
    pub angle: f32,
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigFrame {
    pub frame: u64,
    pub planes: Vec<Plane>,
    pub ambient: AmbientLight,
    pub lights: Vec<SpotLight>,
    pub helpers: Vec<LightHelper>,
    pub proxies: Vec<BoxProxy>,
    pub selected: usize,
}

/// Static description of a rig.
#[derive(Debug, Clone, PartialEq)]
pub struct RigLayout {
    pub name: &'static str,
    pub planes: Vec<Plane>,
    pub ambient: AmbientLight,
    pub lights: Vec<SpotLight>,
    pub drag_proxies: bool,
    pub convention: AngleConvention,
    pub radius: f32,
}

impl RigLayout {
    /// One spotlight over a grey ground and a wide floor.
    pub fn single() -> Self {
        Self {
            name: "single",
            planes: default_planes(),
            ambient: AmbientLight {
                color: Vec3::ONE,
                intensity: 0.5,
            },
            lights: vec![SpotLight::new(Vec3::new(-50.0, 50.0, 50.0), 30.0, -45.0)],
            drag_proxies: false,
            convention: AngleConvention::Standard,
            radius: TARGET_RADIUS,
        }
    }

    /// Three spotlights with drag proxies.
    pub fn triple() -> Self {
        Self {
            name: "triple",
            planes: default_planes(),
            ambient: AmbientLight {
                color: Vec3::ONE,
                intensity: 0.5,
            },
            lights: vec![
                SpotLight::new(Vec3::new(-50.0, 50.0, 50.0), 30.0, -45.0),
                SpotLight::new(Vec3::new(50.0, 50.0, 50.0), 30.0, 45.0),
                SpotLight::new(Vec3::new(0.0, 50.0, -50.0), 30.0, 90.0),
            ],
            drag_proxies: true,
            convention: AngleConvention::Reversed,
            radius: TARGET_RADIUS,
        }
    }

    pub fn by_name(name: &str) -> Option<Self> {
        match name {
            "single" => Some(Self::single()),
            "triple" => Some(Self::triple()),
            _ => None,
        }
    }

    pub fn with_convention(mut self, convention: AngleConvention) -> Self {
        self.convention = convention;
        self
    }
}

fn default_planes() -> Vec<Plane> {
    vec![
        Plane {
            name: "floor".into(),
            size: 1000.0,
            height: -0.1,
            color: hex_rgb(0xF0_80_80),
        },
        Plane {
            name: "ground".into(),
            size: 100.0,
            height: 0.0,
            color: hex_rgb(0x80_80_80),
        },
    ]
}

fn hex_rgb(value: u32) -> Vec3 {
    Vec3::new(
        ((value >> 16) & 0xff) as f32 / 255.0,
        ((value >> 8) & 0xff) as f32 / 255.0,
        (value & 0xff) as f32 / 255.0,
    )
}

/// Parses `#rrggbb`, `rrggbb` or `#rgb` into `[0, 1]` components.
pub fn parse_hex_color(raw: &str) -> Result<Vec3> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('#').unwrap_or(trimmed);
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ViewerError::InvalidColor(raw.to_string()));
    }
    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return Err(ViewerError::InvalidColor(raw.to_string())),
    };
    let value =
        u32::from_str_radix(&expanded, 16).map_err(|_| ViewerError::InvalidColor(raw.to_string()))?;
    Ok(hex_rgb(value))
}

pub fn format_hex_color(color: Vec3) -> String {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!(
        "#{:02x}{:02x}{:02x}",
        channel(color.x),
        channel(color.y),
        channel(color.z)
    )
}

#[derive(Debug, Clone)]
pub struct LightingRig {
    layout: &'static str,
    planes: Vec<Plane>,
    ambient: AmbientLight,
    lights: Vec<SpotLight>,
    proxies: Vec<BoxProxy>,
    selected: usize,
    helpers_visible: bool,
    convention: AngleConvention,
    radius: f32,
    frames: u64,
}

impl LightingRig {
    pub fn new(layout: RigLayout) -> Self {
        let proxies = if layout.drag_proxies {
            layout
                .lights
                .iter()
                .enumerate()
                .map(|(light, spot)| BoxProxy {
                    light,
                    position: spot.position,
                    size: 5.0,
                })
                .collect()
        } else {
            Vec::new()
        };
        let mut rig = Self {
            layout: layout.name,
            planes: layout.planes,
            ambient: layout.ambient,
            lights: layout.lights,
            proxies,
            selected: 0,
            helpers_visible: true,
            convention: layout.convention,
            radius: layout.radius,
            frames: 0,
        };
        rig.aim_all();
        info!(
            "lighting rig `{}` built with {} light(s)",
            rig.layout,
            rig.lights.len()
        );
        rig
    }

    pub fn layout(&self) -> &str {
        self.layout
    }

    pub fn lights(&self) -> &[SpotLight] {
        &self.lights
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn selected(&self) -> &SpotLight {
        &self.lights[self.selected]
    }

    pub fn helpers_visible(&self) -> bool {
        self.helpers_visible
    }

    pub fn set_helpers_visible(&mut self, visible: bool) {
        self.helpers_visible = visible;
    }

    pub fn convention(&self) -> AngleConvention {
        self.convention
    }

    pub fn select_light(&mut self, index: usize) -> Result<LightControls> {
        if index >= self.lights.len() {
            return Err(ViewerError::LightIndex {
                index,
                count: self.lights.len(),
            });
        }
        self.selected = index;
        debug!("selected light {index}");
        Ok(self.controls())
    }

    /// Snapshot of the selected light as the controls should show it.
    pub fn controls(&self) -> LightControls {
        let light = self.selected();
        LightControls {
            light: self.selected,
            left_right: light.heading,
            up_down: light.target.y,
            intensity: light.intensity,
            size: light.angle.to_degrees(),
            focus: light.penumbra,
            color: format_hex_color(light.color),
            help_lines: self.helpers_visible,
        }
    }

    /// Writes the selected light's parameters into every control.
    pub fn refresh_controls(&self, surface: &mut dyn ControlSurface) -> Result<()> {
        let controls = self.controls();
        surface.set_value(LIGHT_SELECTOR, &controls.light.to_string())?;
        surface.set_value(LEFT_RIGHT, &controls.left_right.to_string())?;
        surface.set_value(UP_DOWN, &controls.up_down.to_string())?;
        surface.set_value(INTENSITY, &controls.intensity.to_string())?;
        surface.set_value(SIZE, &controls.size.to_string())?;
        surface.set_value(FOCUS, &controls.focus.to_string())?;
        surface.set_value(PICKER, &controls.color)?;
        surface.set_value(HELP_LINES, &controls.help_lines.to_string())?;
        Ok(())
    }

    /// Applies the raw value of `control` to the selected light.
    pub fn apply_input(&mut self, control: &str, raw: &str) -> Result<RigUpdate> {
        match control {
            LIGHT_SELECTOR => {
                let index = raw
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| ViewerError::InvalidLightSelection(raw.to_string()))?;
                return self.select_light(index).map(RigUpdate::Selected);
            }
            HELP_LINES => {
                let visible = parse_bool(raw);
                self.set_helpers_visible(visible);
                return Ok(RigUpdate::Helpers(visible));
            }
            PICKER => {
                let color = parse_hex_color(raw)?;
                self.lights[self.selected].color = color;
                return Ok(RigUpdate::Light(self.selected));
            }
            LEFT_RIGHT | UP_DOWN | INTENSITY | SIZE | FOCUS => {}
            other => return Err(ViewerError::UnboundControl(other.to_string())),
        }

        let Some(value) = raw.trim().parse::<f32>().ok().filter(|v| v.is_finite()) else {
            warn!("ignoring non-numeric value `{raw}` for `{control}`");
            return Ok(RigUpdate::Ignored);
        };
        let (radius, convention) = (self.radius, self.convention);
        let light = &mut self.lights[self.selected];
        match control {
            LEFT_RIGHT => {
                light.heading = value;
                light.aim(radius, convention);
            }
            UP_DOWN => light.target.y = value,
            INTENSITY => light.intensity = value.max(0.0),
            SIZE => light.angle = value.clamp(0.0, 90.0).to_radians(),
            FOCUS => light.penumbra = value.clamp(0.0, 1.0),
            other => return Err(ViewerError::UnboundControl(other.to_string())),
        }
        Ok(RigUpdate::Light(self.selected))
    }

    /// Moves a light (and its proxy) to `position`, keeping its heading.
    pub fn drag_proxy(&mut self, index: usize, position: Vec3) -> Result<()> {
        let count = self.lights.len();
        let proxy = self
            .proxies
            .iter_mut()
            .find(|proxy| proxy.light == index)
            .ok_or(ViewerError::LightIndex { index, count })?;
        proxy.position = position;
        let light = &mut self.lights[index];
        light.position = position;
        light.aim(self.radius, self.convention);
        Ok(())
    }

    /// Produces the next frame. Helpers are included only while visible.
    pub fn frame(&mut self) -> RigFrame {
        self.aim_all();
        self.frames += 1;
        let helpers = if self.helpers_visible {
            self.lights
                .iter()
                .enumerate()
                .map(|(light, spot)| LightHelper {
                    light,
                    from: spot.position,
                    to: spot.target,
                    angle: spot.angle,
                })
                .collect()
        } else {
            Vec::new()
        };
        RigFrame {
            frame: self.frames,
            planes: self.planes.clone(),
            ambient: self.ambient,
            lights: self.lights.clone(),
            helpers,
            proxies: self.proxies.clone(),
            selected: self.selected,
        }
    }

    fn aim_all(&mut self) {
        let (radius, convention) = (self.radius, self.convention);
        for light in &mut self.lights {
            light.aim(radius, convention);
        }
    }
}
