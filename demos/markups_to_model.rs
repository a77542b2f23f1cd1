//! Build a smoothed surface model from a fiducial list
//!
//! ```text
//! markups_to_model points.fcsv surface.ply --name Tumor
//! RUST_LOG=debug markups_to_model points.xyz surface.obj --alpha 40
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use markupmodel_io::{read_fiducials, write_mesh};
use markupmodel_logic::{LinkOutcome, MarkupsToModelLogic};
use markupmodel_reconstruction::{Delaunay3DConfig, ReconstructionConfig};
use markupmodel_scene::{MarkupsFiducialNode, MarkupsToModelNode, Node, NodeRegistry, Scene};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "markups_to_model", about = "Turn a fiducial list into a closed surface model")]
struct Args {
    /// Fiducial list (.fcsv, .csv, .xyz or .txt)
    input: PathBuf,

    /// Output mesh (.ply or .obj)
    output: PathBuf,

    /// Name of the created model node
    #[arg(long, default_value = "CylinderModel")]
    name: String,

    /// Point count below which a warning is reported
    #[arg(long, default_value_t = 10)]
    min_points: usize,

    /// Keep only tetrahedra with circumradius up to this value (0 keeps the hull)
    #[arg(long, default_value_t = 0.0)]
    alpha: f64,

    /// Merge distance as a fraction of the bounding box diagonal
    #[arg(long, default_value_t = 0.001)]
    tolerance: f64,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let fiducials = read_fiducials(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    log::info!("Loaded {} fiducials from {}", fiducials.len(), args.input.display());

    let config = ReconstructionConfig::default()
        .with_model_name(args.name.clone())
        .with_min_point_count(args.min_points)
        .with_delaunay(
            Delaunay3DConfig::default()
                .with_alpha(args.alpha)
                .with_tolerance(args.tolerance),
        );
    let logic = MarkupsToModelLogic::new(config);

    let mut scene = Scene::new();
    logic.observe_scene(&mut scene);
    let markups = scene.add_node(MarkupsFiducialNode::from_fiducials("F", fiducials).into());
    let module = scene.add_node(MarkupsToModelNode::new("MarkupsToModel").into());

    if logic.set_markups_node(&mut scene, Some(&markups), Some(&module)) == LinkOutcome::Rejected {
        bail!("could not link markups to the module node");
    }

    let output = logic
        .update_output_model(&mut scene, &module)
        .context("surface reconstruction failed")?;
    for warning in &output.warnings {
        eprintln!("warning: {}", warning);
    }

    let Some(mesh) = scene
        .node(&output.model_node_id)
        .and_then(Node::as_model)
        .and_then(|model| model.mesh.as_ref())
    else {
        bail!("model node {} has no mesh", output.model_node_id);
    };

    write_mesh(mesh, &args.output).with_context(|| format!("writing {}", args.output.display()))?;

    let report = &output.report;
    println!("Model:        {} ({})", args.name, output.model_node_id);
    println!("Display:      {}", output.display_node_id);
    println!("Input points: {}", report.input_points);
    println!("Tetrahedra:   {}", report.tetrahedra);
    println!("Hull faces:   {}", report.boundary_faces);
    println!("Output:       {} vertices, {} faces", mesh.vertex_count(), mesh.face_count());
    println!("Closed:       {}", mesh.is_closed_manifold());
    println!("Volume:       {:.4}", mesh.signed_volume());
    println!("Written to    {}", args.output.display());

    Ok(())
}
