//! # Camera Controllers Example
//!
//! A small scene of Phong-lit primitives viewed through the three camera
//! controllers. Press 1 for the fixed camera, 2 for FPS (WASD/QE, hold the
//! left button to look around) and 3 for orbit (left drag rotates, right
//! drag pans, wheel dollies).
//!
//! Set `LOCO_RESOURCES` to a directory holding `images/skybox/{right,left,top,bottom,front,back}.png`
//! to get a skybox.
//!
//! ## Usage:
//! ```bash
//! cargo run --example camera_controllers
//! ```

use std::rc::Rc;

use loco::prelude::*;

fn build_scene(app: &mut Application) -> anyhow::Result<()> {
    let ctx = app.context().clone();

    let ground = PhongMaterial::new(
        "ground",
        Vector3::new(0.2, 0.2, 0.2),
        Vector3::new(0.4, 0.45, 0.4),
        Vector3::new(0.1, 0.1, 0.1),
        8.0,
    );
    let ground = Mesh::from_geometry(&ctx, "ground", &create_plane(20.0, 20.0, 4, 4), Rc::new(ground))?;
    app.scene_mut().add_model(Model::from_mesh(ground));

    let crate_mesh = Mesh::from_geometry(&ctx, "crate", &create_box(1.0, 1.0, 1.0), Rc::new(PhongMaterial::default()))?;
    let mut crate_model = Model::from_mesh(crate_mesh);
    crate_model.set_transform_trs(Vector3::new(-1.5, 0.0, 0.5), Deg(30.0), 1.0);
    app.scene_mut().add_model(crate_model);

    let ball_material = PhongMaterial::new(
        "ball",
        Vector3::new(0.1, 0.1, 0.3),
        Vector3::new(0.3, 0.4, 0.9),
        Vector3::new(0.9, 0.9, 0.9),
        64.0,
    );
    let ball = Mesh::from_geometry(&ctx, "ball", &create_sphere(0.75, 32, 16), Rc::new(ball_material))?;
    let mut ball_model = Model::from_mesh(ball);
    ball_model.set_translation(Vector3::new(1.5, 0.0, 0.75));
    app.scene_mut().add_model(ball_model);

    let marker = BasicMaterial::new("marker", Vector3::new(1.0, 0.9, 0.3));
    let marker = Mesh::from_geometry(&ctx, "marker", &create_sphere(0.1, 12, 6), Rc::new(marker))?;
    let mut marker_model = Model::from_mesh(marker);
    marker_model.set_translation(Vector3::new(0.0, -2.0, 3.0));
    app.scene_mut().add_model(marker_model);

    app.scene_mut().add_light(DirectionalLight::new(Vector3::new(-0.5, -0.3, -1.0)));
    app.scene_mut().add_light(PointLight::new(Vector3::new(0.0, -2.0, 3.0)));
    app.scene_mut().fog = Some(Fog::default());

    if !app.load_skybox("skybox") {
        log::info!("no skybox found, drawing without one");
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let mut config = EngineConfig::from_env();
    config.window = config.window.with_title("loco - camera controllers");
    let mut app = Application::new(config)?;

    let aspect = app.window().aspect();
    *app.camera_mut() = Camera::new(
        Point3::new(6.0, -6.0, 4.0),
        Point3::new(0.0, 0.0, 0.0),
        Vector3::unit_z(),
        ProjectionData {
            aspect,
            ..ProjectionData::default()
        },
    );
    let (width, height) = app.window().size();
    app.set_controller(OrbitController::new(app.camera(), width, height));
    build_scene(&mut app)?;

    app.run(|app, _dt| {
        let input = app.window().input();
        let choice = (1..=3).find(|&n| input.is_key_down(Key::Digit(n)));
        let (width, height) = app.window().size();
        match choice {
            Some(1) if app.controller().name() != "fixed" => app.set_controller(CameraControllerKind::fixed()),
            Some(2) if app.controller().name() != "fps" => {
                let controller = FpsController::new(app.camera());
                app.set_controller(controller);
            }
            Some(3) if app.controller().name() != "orbit" => {
                let controller = OrbitController::new(app.camera(), width, height);
                app.set_controller(controller);
            }
            _ => {}
        }

        let report = app.renderer().last_report();
        if !report.is_clean() {
            log::debug!("last frame: {} drawn, {} skipped", report.drawn, report.skipped);
        }
    })?;
    Ok(())
}
