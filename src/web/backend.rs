use std::collections::HashMap;

use js_sys::{Float32Array, Function, Object, Promise, Reflect};
use log::info;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use crate::backend::{check_color_argument, Backend, DrawEntry, Setter, SurfaceHook};
use crate::error::{Result, ViewerError};
use crate::params::{Color, ParamValue};
use crate::surface::SurfaceId;

/// Backend reached through the ES module namespace of the drawing module.
pub struct JsBackend {
    module: Object,
    functions: HashMap<&'static str, Function>,
}

impl JsBackend {
    /// Runs the module's default export (its wasm initializer) and waits for it.
    pub async fn initialize(module: JsValue) -> Result<Self> {
        let module: Object = module
            .dyn_into()
            .map_err(|_| ViewerError::Initialization("backend module is not an object".into()))?;
        let init = Reflect::get(&module, &JsValue::from_str("default"))
            .map_err(|err| ViewerError::Initialization(describe(&err)))?;
        match init.dyn_ref::<Function>() {
            Some(init) => {
                let pending = init
                    .call0(&JsValue::UNDEFINED)
                    .map_err(|err| ViewerError::Initialization(describe(&err)))?;
                JsFuture::from(Promise::resolve(&pending))
                    .await
                    .map_err(|err| ViewerError::Initialization(describe(&err)))?;
            }
            None => info!("backend module has no default initializer; assuming it is ready"),
        }
        Ok(Self {
            module,
            functions: HashMap::new(),
        })
    }

    fn function(&mut self, name: &'static str) -> Result<Function> {
        if let Some(function) = self.functions.get(name) {
            return Ok(function.clone());
        }
        let function: Function = Reflect::get(&self.module, &JsValue::from_str(name))
            .map_err(|err| backend_error(name, &err))?
            .dyn_into()
            .map_err(|_| ViewerError::UnknownEntryPoint(name.to_string()))?;
        self.functions.insert(name, function.clone());
        Ok(function)
    }
}

impl Backend for JsBackend {
    fn draw(&mut self, entry: DrawEntry, surface: &SurfaceId, color: Option<Color>) -> Result<()> {
        check_color_argument(entry, color.as_ref())?;
        let function = self.function(entry.name())?;
        let surface = JsValue::from_str(surface.as_str());
        let result = match color {
            Some(color) => {
                let color: JsValue = Float32Array::from(&color[..]).into();
                function.call2(&JsValue::UNDEFINED, &surface, &color)
            }
            None => function.call1(&JsValue::UNDEFINED, &surface),
        };
        result.map(drop).map_err(|err| backend_error(entry.name(), &err))
    }

    fn set(&mut self, setter: Setter, value: ParamValue) -> Result<()> {
        let function = self.function(setter.name())?;
        let argument = match value {
            ParamValue::Int(value) => JsValue::from(value),
            ParamValue::Float(value) => JsValue::from(value),
            ParamValue::Bool(value) => JsValue::from_bool(value),
            ParamValue::Color(color) => Float32Array::from(&color[..]).into(),
        };
        function
            .call1(&JsValue::UNDEFINED, &argument)
            .map(drop)
            .map_err(|err| backend_error(setter.name(), &err))
    }

    fn attach(&mut self, hook: SurfaceHook, surface: &SurfaceId) -> Result<()> {
        let function = self.function(hook.name())?;
        let result = if hook.takes_surface() {
            function.call1(&JsValue::UNDEFINED, &JsValue::from_str(surface.as_str()))
        } else {
            function.call0(&JsValue::UNDEFINED)
        };
        result
            .map(drop)
            .map_err(|err| backend_error(hook.name(), &err))
    }
}

fn backend_error(entry: &'static str, err: &JsValue) -> ViewerError {
    ViewerError::Backend {
        entry,
        message: describe(err),
    }
}

pub(crate) fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}
