//! TryOn - Fit a worn accessory to a tracked face
//!
//! Loads an accessory container, calibrates it, fits it against a frame of
//! face landmarks and reports the resulting placement and draw order.
//!
//! Usage: `tryon <accessory.glb> [landmarks.json] [--save-settings]`
//!
//! The landmark file is a JSON array of `[x, y, z]` points in anchor space.

mod settings;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use glam::{Mat4, Vec3};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use tryon_assets::{DirectorySource, GeometryId};
use tryon_fit::{AccessoryLoader, FrameOutput, OcclusionMaterial, TryOnSession};
use tryon_render::{DrawList, Mesh, OccluderMesh};

use settings::TryOnSettings;

fn read_landmarks(path: &Path) -> Result<Vec<Vec3>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read landmarks from {:?}", path))?;
    let points: Vec<[f32; 3]> =
        serde_json::from_str(&content).context("Landmark file is not an array of [x, y, z]")?;
    Ok(points.into_iter().map(Vec3::from_array).collect())
}

fn report(label: &str, frame: &FrameOutput) {
    let t = &frame.accessory;
    info!(
        "{}: accessory at ({:.4}, {:.4}, {:.4}) scale {:.4}",
        label, t.position.x, t.position.y, t.position.z, t.scale.x
    );
    info!(
        "{}: head width {:.4}, crown {:.4}, depth {:.4}",
        label, frame.head.head_width, frame.head.crown_height, frame.head.depth_offset
    );
    for (kind, transform) in frame.occluders.iter() {
        info!(
            "{}: {:?} occluder at ({:.4}, {:.4}, {:.4}) scale ({:.3}, {:.3}, {:.3})",
            label,
            kind,
            transform.position.x,
            transform.position.y,
            transform.position.z,
            transform.scale.x,
            transform.scale.y,
            transform.scale.z
        );
    }
}

fn main() -> Result<()> {
    let settings = TryOnSettings::load();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.general.level())
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let save_settings = args.iter().any(|a| a == "--save-settings");
    args.retain(|a| a != "--save-settings");

    if save_settings {
        let path = settings.save()?;
        info!("Wrote settings to {:?}", path);
    }

    let Some(accessory_id) = args.first().cloned() else {
        if save_settings {
            return Ok(());
        }
        bail!("usage: tryon <accessory.glb> [landmarks.json] [--save-settings]");
    };

    info!("Starting TryOn...");

    let source = Arc::new(DirectorySource::new(&settings.general.asset_dir));
    let loader = AccessoryLoader::new(source, settings.fit.reference_width)?;
    let mut session = TryOnSession::new(loader, settings.fit.clone());
    *session.adjust_mut() = settings.adjust;

    session.select_accessory(accessory_id.clone());
    let Some(initial) = session.wait_for_load() else {
        bail!("Accessory '{}' could not be activated", accessory_id);
    };
    report("initial", &initial);

    let Some(active) = session.slot().current() else {
        bail!("No active accessory");
    };

    let mut triangles = 0;
    for index in 0..active.scene.geometry_count() {
        let geometry = active.scene.geometry(GeometryId(index));
        match geometry.and_then(Mesh::from_geometry) {
            Some(mesh) => triangles += mesh.triangle_count(),
            None => warn!("Geometry {} has no renderable positions", index),
        }
    }
    info!(
        "Accessory '{}' has {} geometries, {} triangles",
        active.id,
        active.scene.geometry_count(),
        triangles
    );

    let landmarks = match args.get(1) {
        Some(path) => read_landmarks(Path::new(path))?,
        None => {
            info!("No landmark file given, fitting the nominal head");
            Vec::new()
        }
    };

    let Some(frame) = session.on_anchor_added(Mat4::IDENTITY, &landmarks) else {
        bail!("Fit produced no placement");
    };
    report("fitted", &frame);

    let constants = session.constants();
    let occluder_vertices: usize = frame
        .occluders
        .iter()
        .filter_map(|(kind, _)| OccluderMesh::for_kind(kind, constants))
        .map(|mesh| mesh.vertices.len())
        .sum();

    let draws = DrawList::build(&active.scene, &frame, &OcclusionMaterial::DEPTH_ONLY);
    let projection = Mat4::perspective_rh(60f32.to_radians(), 9.0 / 16.0, 0.01, 10.0);
    let push_constants = draws.push_constants(&active.scene, Mat4::IDENTITY, projection);
    info!(
        "Draw list: {} calls ({} occluder vertices, {} push constant bytes)",
        draws.len(),
        occluder_vertices,
        std::mem::size_of_val(push_constants.as_slice())
    );
    for item in &draws.items {
        info!(
            "  order {:>2} {:?} color_write={} blended={}",
            item.render_order, item.source, item.color_write, item.blended
        );
    }

    Ok(())
}
