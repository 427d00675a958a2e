use std::env;
use std::fs;

use anyhow::{anyhow, Context, Result};
use log::info;
use pollster::block_on;

use webgl_viewer::{
    AngleConvention, CallLog, ControlSurface, FrameScheduler, LightingRig, LoopMode,
    ManualScheduler, ModuleLoader, PageSet, RecordingBackend, RigLayout, SceneController,
    StaticControls,
};

const USAGE: &str = "Usage: webgl-viewer [--pages FILE] <page> [--input ID=VALUE]... [--frames N]\n       webgl-viewer rig <single|triple> [--convention standard|reversed|swapped] [--input ID=VALUE]... [--frames N]\n       webgl-viewer [--pages FILE] --list";

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let options = CliOptions::parse(env::args().skip(1))?;
    let pages = match &options.pages {
        Some(path) => {
            let xml = fs::read_to_string(path)
                .with_context(|| format!("failed to read page file {path}"))?;
            PageSet::from_xml(&xml).with_context(|| format!("failed to parse page file {path}"))?
        }
        None => PageSet::builtin()?,
    };

    match &options.target {
        Target::List => {
            println!("Pages:");
            for page in pages.pages() {
                let draw = page.draw.map_or("module", |entry| entry.name());
                println!(" - {} ({draw})", page.name);
            }
            println!("Rigs:");
            println!(" - single");
            println!(" - triple");
            Ok(())
        }
        Target::Page(name) => run_page(&pages, name, &options),
        Target::Rig(layout) => run_rig(layout, &options),
    }
}

fn run_page(pages: &PageSet, name: &str, options: &CliOptions) -> Result<()> {
    let page = pages.get(name)?.clone();
    let log = CallLog::new();
    let module = block_on(
        ModuleLoader::new().initialize(async { Ok(RecordingBackend::new(log.clone())) }),
    )
    .context("failed to initialize backend")?;

    let mode = match page.mode {
        LoopMode::Continuous => "continuous",
        LoopMode::OnInput => "on-input",
        LoopMode::Once => "once",
        LoopMode::Module => "module",
    };
    println!("Page {} on surface {} ({mode})", page.name, page.surface);

    let mut controls = StaticControls::new();
    let mut controller = SceneController::new(module, page);
    controller.start(&mut controls)?;

    let mut scheduler = ManualScheduler::new();
    if controller.wants_frames() {
        scheduler.request_frame()?;
    }
    let mut inputs = options.inputs.iter();
    for _ in 0..options.frames {
        // One queued input per frame, applied before that frame draws.
        if let Some((id, value)) = inputs.next() {
            apply_page_input(&mut controller, &mut controls, id, value)?;
        }
        if scheduler.take_frame() {
            controller.on_frame(&mut scheduler)?;
        }
    }
    for (id, value) in inputs {
        apply_page_input(&mut controller, &mut controls, id, value)?;
    }

    println!("Backend calls:");
    for call in log.calls() {
        println!(" - {call}");
    }
    println!("Labels:");
    for (id, text) in controls.labels() {
        println!(" - {id}: {text}");
    }
    println!("Frames drawn: {}", controller.frames_drawn());
    Ok(())
}

fn apply_page_input(
    controller: &mut SceneController<RecordingBackend>,
    controls: &mut StaticControls,
    id: &str,
    value: &str,
) -> Result<()> {
    controls.set_value(id, value)?;
    controller
        .handle_input(id, controls)
        .with_context(|| format!("input `{id}={value}` failed"))?;
    Ok(())
}

fn run_rig(layout: &str, options: &CliOptions) -> Result<()> {
    let mut layout =
        RigLayout::by_name(layout).ok_or_else(|| anyhow!("unknown rig layout `{layout}`"))?;
    if let Some(name) = &options.convention {
        let convention = AngleConvention::from_name(name)
            .ok_or_else(|| anyhow!("unknown angle convention `{name}`"))?;
        layout = layout.with_convention(convention);
    }
    let mut rig = LightingRig::new(layout);
    info!("rig `{}` aims with {:?}", rig.layout(), rig.convention());
    for (id, value) in &options.inputs {
        let update = rig
            .apply_input(id, value)
            .with_context(|| format!("input `{id}={value}` failed"))?;
        info!("{id}={value} -> {update:?}");
    }

    let mut last = None;
    for _ in 0..options.frames.max(1) {
        last = Some(rig.frame());
    }
    let Some(frame) = last else {
        return Ok(());
    };

    println!(
        "Rig {}: {} light(s), selected {}",
        rig.layout(),
        frame.lights.len(),
        frame.selected
    );
    for (index, light) in frame.lights.iter().enumerate() {
        println!(
            " - light {index} pos=({:.2}, {:.2}, {:.2}) target=({:.2}, {:.2}, {:.2}) intensity={:.2} angle={:.1} penumbra={:.2} color={}",
            light.position.x,
            light.position.y,
            light.position.z,
            light.target.x,
            light.target.y,
            light.target.z,
            light.intensity,
            light.angle.to_degrees(),
            light.penumbra,
            webgl_viewer::lighting::format_hex_color(light.color),
        );
    }
    println!("Helpers: {}", frame.helpers.len());
    println!("Frames rendered: {}", frame.frame);
    Ok(())
}

#[derive(Debug, PartialEq)]
enum Target {
    List,
    Page(String),
    Rig(String),
}

#[derive(Debug)]
struct CliOptions {
    target: Target,
    pages: Option<String>,
    inputs: Vec<(String, String)>,
    frames: u64,
    convention: Option<String>,
}

impl CliOptions {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut args = args.into_iter();
        let mut target = None;
        let mut pages = None;
        let mut inputs = Vec::new();
        let mut frames = 0;
        let mut convention = None;
        let mut rig = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--list" => target = Some(Target::List),
                "--pages" => {
                    pages = Some(args.next().ok_or_else(|| anyhow!("--pages needs a file"))?);
                }
                "--input" => {
                    let pair = args
                        .next()
                        .ok_or_else(|| anyhow!("--input needs ID=VALUE"))?;
                    let (id, value) = pair
                        .split_once('=')
                        .ok_or_else(|| anyhow!("--input expects ID=VALUE, got `{pair}`"))?;
                    inputs.push((id.to_string(), value.to_string()));
                }
                "--convention" => {
                    convention = Some(
                        args.next()
                            .ok_or_else(|| anyhow!("--convention needs a name"))?,
                    );
                }
                "--frames" => {
                    let raw = args.next().ok_or_else(|| anyhow!("--frames needs a count"))?;
                    frames = raw
                        .parse()
                        .with_context(|| format!("invalid frame count `{raw}`"))?;
                }
                "rig" if target.is_none() && !rig => rig = true,
                other if other.starts_with("--") => {
                    return Err(anyhow!("Unknown argument: {other}\n{USAGE}"));
                }
                other if target.is_none() => {
                    target = Some(if rig {
                        Target::Rig(other.to_string())
                    } else {
                        Target::Page(other.to_string())
                    });
                }
                other => return Err(anyhow!("Unexpected argument: {other}\n{USAGE}")),
            }
        }

        let target = match target {
            Some(Target::List) if rig => return Err(anyhow!("{USAGE}")),
            Some(target) => target,
            None => return Err(anyhow!("{USAGE}")),
        };
        if convention.is_some() && !matches!(target, Target::Rig(_)) {
            return Err(anyhow!("--convention only applies to rigs\n{USAGE}"));
        }
        Ok(Self {
            target,
            pages,
            inputs,
            frames,
            convention,
        })
    }
}
