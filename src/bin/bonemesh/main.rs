//! Bonemesh CLI - skin sphere skeletons into meshes.
//!
//! Usage: bonemesh [--verbose] <COMMAND> [OPTIONS]
//!
//! Run `bonemesh --help` for available commands.

use std::f64::consts::PI;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use nalgebra::Point3;

use bonemesh::algo::remesh::RemeshOptions;
use bonemesh::algo::Progress;
use bonemesh::io::skeleton;
use bonemesh::mesh::{HalfEdgeMesh, MergePosition};
use bonemesh::skeleton::{NodeKind, SkeletalTree};
use bonemesh::{Session, Surface};

#[derive(Parser)]
#[command(name = "bonemesh")]
#[command(author, version, about = "Skin sphere skeletons into closed meshes", long_about = None)]
struct Cli {
    /// Log per-pass statistics
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a mesh from a skeleton and export it as OBJ
    Generate {
        /// Input skeleton (JSON)
        input: PathBuf,

        /// Output mesh file (OBJ)
        #[arg(short, long)]
        output: PathBuf,

        /// Number of Catmull-Clark iterations
        #[arg(short, long, default_value = "0")]
        subdivide: usize,

        /// Number of remeshing iterations
        #[arg(short, long, default_value = "0")]
        remesh: usize,

        /// Place collapsed vertices at the edge midpoint
        #[arg(long)]
        midpoint_collapse: bool,

        /// Triangulate before remeshing
        #[arg(long)]
        triangulate: bool,
    },

    /// Display skeleton and generated mesh statistics
    Info {
        /// Input skeleton (JSON)
        input: PathBuf,
    },

    /// Write a demo skeleton: one sphere with `branches` limbs
    Sample {
        /// Output skeleton file (JSON)
        output: PathBuf,

        /// Number of limbs on the central sphere
        #[arg(short, long, default_value = "2", value_parser = clap::value_parser!(u32).range(1..=8))]
        branches: u32,
    },
}

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Generate {
            input,
            output,
            subdivide,
            remesh,
            midpoint_collapse,
            triangulate,
        } => {
            let merge = if midpoint_collapse {
                MergePosition::Midpoint
            } else {
                MergePosition::Sum
            };
            let options = RemeshOptions::default()
                .with_iterations(remesh)
                .with_merge(merge)
                .with_triangulate(triangulate);
            cmd_generate(&input, &output, subdivide, &options)?;
        }

        Commands::Info { input } => {
            cmd_info(&input)?;
        }

        Commands::Sample { output, branches } => {
            cmd_sample(&output, branches as usize)?;
        }
    }

    Ok(())
}

/// Create a progress reporter that draws a bar on stderr.
fn create_progress() -> Progress {
    // Highest percentage drawn so far; the bar never moves backwards.
    let shown = Arc::new(AtomicUsize::new(0));

    Progress::new(move |current, total, stage| {
        if total == 0 {
            return;
        }

        let percent = if current >= total {
            100
        } else {
            (current * 100 + total / 2) / total
        };
        let previous = shown.fetch_max(percent, Ordering::Relaxed);
        if percent <= previous && percent != 100 {
            return;
        }

        let width = 30;
        let filled = (percent * width) / 100;
        eprint!(
            "\r[{}{}] {:3}% {:<24}",
            "=".repeat(filled),
            " ".repeat(width - filled),
            percent,
            stage
        );
        let _ = std::io::stderr().flush();

        if current >= total {
            eprintln!();
        }
    })
}

fn load_session(input: &Path) -> Result<Session, Box<dyn std::error::Error>> {
    let tree = skeleton::load(input)?;
    println!(
        "Loaded: {} spheres from {}",
        tree.len(),
        input.display()
    );
    Ok(Session::from_tree(tree))
}

fn cmd_generate(
    input: &Path,
    output: &Path,
    subdivisions: usize,
    options: &RemeshOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = load_session(input)?;

    let start = Instant::now();
    if let Surface::Polygons(soup) = session.generate()? {
        return Err(format!(
            "skin of {} polygons is not a manifold mesh, nothing to export",
            soup.len()
        )
        .into());
    }
    print_mesh_summary("Generated", session.mesh()?);

    if subdivisions > 0 {
        println!("Applying Catmull-Clark subdivision ({} iterations)...", subdivisions);
        session.subdivide_with_progress(subdivisions, &create_progress())?;
        print_mesh_summary("Subdivided", session.mesh()?);
    }

    if options.iterations > 0 {
        println!("Applying isotropic remeshing ({} iterations)...", options.iterations);
        let stats = session.remesh_with_progress(options, &create_progress())?;
        println!(
            "Remeshed: {} splits, {} collapses, {} flips",
            stats.split, stats.collapsed, stats.flipped
        );
        print_mesh_summary("Result", session.mesh()?);
    }
    let elapsed = start.elapsed();

    session.export_obj(output)?;
    println!("Saved: {} ({:.2?})", output.display(), elapsed);

    Ok(())
}

fn print_mesh_summary(label: &str, mesh: &HalfEdgeMesh) {
    println!(
        "{}: {} vertices, {} faces",
        label,
        mesh.num_vertices(),
        mesh.num_faces()
    );
}

fn cmd_info(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = load_session(input)?;
    let tree = session.tree();

    println!("File: {}", input.display());
    println!("Spheres: {}", tree.len());
    let count = |kind| tree.node_ids().filter(|&id| tree.kind(id) == kind).count();
    println!(
        "Joints: {}, limbs: {}, leaves: {}",
        count(NodeKind::Joint),
        count(NodeKind::Limb),
        count(NodeKind::Leaf)
    );
    let depth = tree.node_ids().map(|id| tree.depth(id)).max().unwrap_or(0);
    println!("Depth: {}", depth);

    if tree.is_empty() {
        return Ok(());
    }

    match session.generate()? {
        Surface::Mesh(mesh) => {
            println!("\nMesh:");
            println!("Vertices: {}", mesh.num_vertices());
            println!("Edges: {}", mesh.num_edges());
            println!("Faces: {}", mesh.num_faces());
            println!("Euler characteristic: {}", mesh.euler_characteristic());
            if mesh.is_closed() {
                println!("Topology: Closed (no boundary)");
            } else {
                println!("Topology: Open ({} boundary loops)", mesh.num_boundary_loops());
            }
            println!("Surface area: {:.6}", mesh.surface_area());
            println!("Average edge length: {:.6}", mesh.average_edge_length());
            if let Some((min, max)) = mesh.bounding_box() {
                println!(
                    "Bounding box: ({:.3}, {:.3}, {:.3}) to ({:.3}, {:.3}, {:.3})",
                    min.x, min.y, min.z, max.x, max.y, max.z
                );
            }
        }
        Surface::Polygons(soup) => {
            println!(
                "\nSkin: {} polygons over {} vertices (not a manifold mesh)",
                soup.len(),
                soup.positions().len()
            );
        }
        Surface::NotReady => {}
    }
    let interpolated = session
        .tree()
        .node_ids()
        .filter(|&id| session.tree().node(id).interpolated)
        .count();
    println!("Interpolated spheres: {}", interpolated);

    Ok(())
}

/// A central sphere with `branches` limbs. Two limbs give a Y; more are
/// spread evenly around the up-facing circle.
fn sample_tree(branches: usize) -> SkeletalTree {
    let mut tree = SkeletalTree::with_root(Point3::origin(), 0.5);
    let Some(root) = tree.root() else {
        return tree;
    };
    let reach = 1.5 * 2f64.sqrt();
    for k in 0..branches {
        let angle = match branches {
            1 => PI / 2.0,
            2 => 0.75 * PI - k as f64 * PI / 2.0,
            n => PI / 2.0 + 2.0 * PI * k as f64 / n as f64,
        };
        let tip = Point3::new(reach * angle.cos(), reach * angle.sin(), 0.0);
        tree.add_child(root, tip, 0.3);
    }
    tree
}

fn cmd_sample(output: &Path, branches: usize) -> Result<(), Box<dyn std::error::Error>> {
    let tree = sample_tree(branches);
    skeleton::save(&tree, output)?;
    println!("Saved: {} ({} spheres)", output.display(), tree.len());
    Ok(())
}
