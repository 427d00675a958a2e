use assert_cmd::prelude::*;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

fn viewer() -> Command {
    Command::cargo_bin("webgl-viewer").expect("binary exists")
}

#[test]
fn sine_page_sets_resolution_then_redraws() {
    viewer()
        .args(["sin_wave", "--input", "resolution=25"])
        .assert()
        .success()
        .stdout(contains("Page sin_wave on surface sin_wave (on-input)"))
        .stdout(contains(" - s_update_resolution(25)\n - sin_draw(\"sin_wave\")"))
        .stdout(contains(" - resolution_text: resolution: 25"))
        .stdout(contains("Frames drawn: 0"));
}

#[test]
fn square_page_draws_default_colour_then_form_colour() {
    viewer()
        .args([
            "square",
            "--input",
            "red=255",
            "--input",
            "green=0",
            "--input",
            "blue=0",
            "--input",
            "color-changer=",
        ])
        .assert()
        .success()
        .stdout(contains(" - draw_square(\"square\", [0, 0.5, 0.9, 1])"))
        .stdout(contains(" - draw_square(\"square\", [1, 0, 0, 1])"));
}

#[test]
fn gradient_page_applies_input_between_frames() {
    viewer()
        .args(["gradient", "--input", "shape_sides=6", "--frames", "2"])
        .assert()
        .success()
        .stdout(contains(
            " - g_update_sides(6)\n - gradient_draw(\"gradient\")\n - gradient_draw(\"gradient\")",
        ))
        .stdout(contains(" - shape_sides_text: sides: 6"))
        .stdout(contains("Frames drawn: 2"));
}

#[test]
fn custom_page_file_replaces_builtin_set() {
    let mut pages = NamedTempFile::new().expect("temp pages");
    write!(
        pages,
        r#"<pages>
    <page name="spinner" surface="canvas" draw="draw" mode="continuous">
        <bind control="speed" setter="update_rotation_speed" label="speed_text" prefix="speed: "/>
    </page>
</pages>"#
    )
    .expect("write pages");

    viewer()
        .arg("--pages")
        .arg(pages.path())
        .args(["spinner", "--input", "speed=3.7", "--frames", "1"])
        .assert()
        .success()
        .stdout(contains(" - update_rotation_speed(3)"))
        .stdout(contains(" - draw(\"canvas\")"))
        .stdout(contains(" - speed_text: speed: 3.7"));

    viewer()
        .arg("--pages")
        .arg(pages.path())
        .arg("--list")
        .assert()
        .success()
        .stdout(contains(" - spinner (draw)").and(contains("sin_wave").not()));
}

#[test]
fn list_shows_builtin_pages_and_rigs() {
    viewer()
        .arg("--list")
        .assert()
        .success()
        .stdout(contains(" - point (point_draw)"))
        .stdout(contains(" - triangle (draw_triangle)"))
        .stdout(contains(" - triple"));
}

#[test]
fn unknown_page_and_unbound_control_fail() {
    viewer()
        .arg("hexagon")
        .assert()
        .failure()
        .stderr(contains("hexagon"));

    viewer()
        .args(["gradient", "--input", "wavelength=3"])
        .assert()
        .failure()
        .stderr(contains("wavelength"));
}

#[test]
fn single_rig_follows_controls() {
    viewer()
        .args([
            "rig",
            "single",
            "--input",
            "left_right=0",
            "--input",
            "intensity=2",
            "--input",
            "picker=#ff0000",
            "--input",
            "help_lines=false",
        ])
        .assert()
        .success()
        .stdout(contains("Rig single: 1 light(s), selected 0"))
        .stdout(contains(
            " - light 0 pos=(-50.00, 50.00, 50.00) target=(-20.00, 30.00, 50.00) intensity=2.00",
        ))
        .stdout(contains("color=#ff0000"))
        .stdout(contains("Helpers: 0"))
        .stdout(contains("Frames rendered: 1"));
}

#[test]
fn triple_rig_selects_light_and_rejects_bad_index() {
    viewer()
        .args(["rig", "triple", "--input", "light-selector=2", "--frames", "3"])
        .assert()
        .success()
        .stdout(contains("Rig triple: 3 light(s), selected 2"))
        .stdout(contains("Helpers: 3"))
        .stdout(contains("Frames rendered: 3"));

    viewer()
        .args(["rig", "triple", "--input", "light-selector=7"])
        .assert()
        .failure();
}

#[test]
fn rig_convention_flag_changes_target_placement() {
    viewer()
        .args([
            "rig",
            "single",
            "--convention",
            "swapped",
            "--input",
            "left_right=0",
        ])
        .assert()
        .success()
        .stdout(contains("target=(-50.00, 30.00, 80.00)"));

    viewer()
        .args(["rig", "single", "--convention", "sideways"])
        .assert()
        .failure()
        .stderr(contains("sideways"));
}

#[test]
fn module_driven_page_runs_startup_hooks_only() {
    viewer()
        .args(["user_input", "--frames", "2"])
        .assert()
        .success()
        .stdout(contains("Page user_input on surface user_input (module)"))
        .stdout(contains(" - user_init()\n - drag_init()"))
        .stdout(contains("Frames drawn: 0"));

    viewer()
        .arg("--list")
        .assert()
        .success()
        .stdout(contains(" - user_input (module)"));
}
