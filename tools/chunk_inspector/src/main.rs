use std::env;
use std::path::PathBuf;

use glam::Vec3;
use noise::{NoiseFn, Perlin};
use tessera_shared::block::{default_registry, BlockId, BlockRegistry};
use tessera_shared::chunk::ChunkData;
use tessera_shared::color_noise::ColorNoise;
use tessera_shared::coords::{chunk_to_world, ChunkPos, LocalPos, CHUNK_SIZE};
use tessera_shared::expand::{expand_stream, StreamLayout};
use tessera_shared::face::Face;
use tessera_shared::lighting::{AmbientDiffuse, FragmentInput, LightingModel};
use tessera_shared::mesher::{build_chunk_quads, ChunkNeighbors, ChunkQuads};
use tessera_shared::packed::PackedFormat;
use tracing::{info, warn};

const USAGE: &str =
    "Usage: chunk_inspector [--blocks <blocks.toml>] [--chunk <x,y,z>] [--seed <u32>]";
const SEA_LEVEL: i32 = 9;

#[derive(Debug)]
struct Options {
    blocks: Option<PathBuf>,
    chunk: ChunkPos,
    seed: u32,
}

enum Command {
    Run(Options),
    Help,
}

fn main() {
    let _ = tracing_subscriber::fmt().with_target(false).try_init();

    let options = match parse_args(env::args().skip(1)) {
        Ok(Command::Run(options)) => options,
        Ok(Command::Help) => {
            println!("{USAGE}");
            return;
        }
        Err(err) => {
            eprintln!("chunk_inspector: {err}");
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    };

    if let Err(err) = run(&options) {
        eprintln!("chunk_inspector error: {err}");
        std::process::exit(1);
    }
}

fn parse_args(args: impl Iterator<Item = String>) -> Result<Command, String> {
    let mut options = Options {
        blocks: None,
        chunk: ChunkPos::ORIGIN,
        seed: 0,
    };

    let mut args = args;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--blocks" => options.blocks = Some(PathBuf::from(flag_value(&mut args, "--blocks")?)),
            "--chunk" => options.chunk = parse_chunk_pos(&flag_value(&mut args, "--chunk")?)?,
            "--seed" => {
                let value = flag_value(&mut args, "--seed")?;
                options.seed = value
                    .parse()
                    .map_err(|err| format!("invalid --seed '{value}': {err}"))?;
            }
            other => return Err(format!("unknown argument '{other}'")),
        }
    }
    Ok(Command::Run(options))
}

fn flag_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String, String> {
    args.next().ok_or_else(|| format!("{flag} expects a value"))
}

fn parse_chunk_pos(value: &str) -> Result<ChunkPos, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    let [x, y, z] = parts.as_slice() else {
        return Err(format!("invalid --chunk '{value}': expected x,y,z"));
    };
    let component = |part: &str| {
        part.parse::<i32>()
            .map_err(|err| format!("invalid --chunk '{value}': {err}"))
    };
    Ok(ChunkPos::new(component(x)?, component(y)?, component(z)?))
}

fn run(options: &Options) -> Result<(), String> {
    let registry = match &options.blocks {
        Some(path) => BlockRegistry::load(path)?,
        None => default_registry(),
    };

    let chunk = demo_chunk(&registry, options.chunk, options.seed)?;
    let quads = build_chunk_quads(&chunk, &registry, &ChunkNeighbors::default(), options.chunk);
    if quads.is_empty() {
        warn!("Chunk {:?} produced no quads", options.chunk);
        return Ok(());
    }

    report(&registry, &quads, options.seed);
    Ok(())
}

/// Rolling terrain: stone under dirt under grass, water filling dips below sea level.
fn demo_chunk(
    registry: &BlockRegistry,
    chunk_pos: ChunkPos,
    seed: u32,
) -> Result<ChunkData, String> {
    let lookup = |name: &str| {
        registry
            .get_by_name(name)
            .ok_or_else(|| format!("block registry has no '{name}' block"))
    };
    let stone = lookup("stone")?;
    let dirt = lookup("dirt")?;
    let grass = lookup("grass")?;
    let water = registry.get_by_name("water").unwrap_or(BlockId::AIR);

    let perlin = Perlin::new(seed);
    let mut chunk = ChunkData::new_empty();
    for lx in 0..CHUNK_SIZE as u8 {
        for lz in 0..CHUNK_SIZE as u8 {
            let column = chunk_to_world(chunk_pos, LocalPos::new(lx, 0, lz));
            let sample = perlin.get([f64::from(column.x) * 0.045, f64::from(column.z) * 0.045]);
            let height = 10 + (sample * 6.0).round() as i32;

            for ly in 0..CHUNK_SIZE as u8 {
                let world_y = column.y + i32::from(ly);
                let block = if world_y < height - 3 {
                    stone
                } else if world_y < height - 1 {
                    dirt
                } else if world_y == height - 1 {
                    grass
                } else if world_y < SEA_LEVEL {
                    water
                } else {
                    continue;
                };
                chunk.set(LocalPos::new(lx, ly, lz), block);
            }
        }
    }
    Ok(chunk)
}

fn report(registry: &BlockRegistry, quads: &ChunkQuads, seed: u32) {
    let format = PackedFormat::Stretched;
    let lighting = AmbientDiffuse::default();
    let tint = ColorNoise::new(seed);

    let mut face_counts = [0usize; 6];
    let mut vertex_count = 0usize;
    let mut brightness_sum = 0.0f64;
    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);

    for batch in &quads.batches {
        let instanced_records = batch.instanced_stream();
        for record in &instanced_records {
            face_counts[record.face(format).index() as usize] += 1;
        }

        let vertices = expand_stream(
            batch.per_vertex_stream(),
            format,
            StreamLayout::PerVertex,
            quads.chunk_pos,
        );
        let instanced = expand_stream(
            &instanced_records,
            format,
            StreamLayout::Instanced,
            quads.chunk_pos,
        );
        let same_geometry = instanced.len() == vertices.len()
            && instanced
                .iter()
                .zip(&vertices)
                .all(|(a, b)| a.position == b.position && a.normal == b.normal);
        if !same_geometry {
            warn!(
                "Block '{}' expands differently per-vertex and instanced",
                registry.get(batch.block).name
            );
        }

        for vertex in &vertices {
            let color = lighting.shade(&FragmentInput {
                world_position: vertex.position,
                world_normal: vertex.normal,
                base_color: tint.tint(batch.base_color, vertex.position.as_ivec3()),
                ao: vertex.ao,
            });
            brightness_sum += f64::from(color.element_sum() / 3.0);
            min = min.min(vertex.position);
            max = max.max(vertex.position);
        }
        vertex_count += vertices.len();

        info!(
            "  {:<10} {:>5} quads, base color {:?}",
            registry.get(batch.block).name,
            batch.quad_count(),
            batch.base_color.to_array()
        );
    }

    info!(
        "Chunk {:?}: {} quads, {} vertices, {} batches",
        quads.chunk_pos,
        quads.quad_count(),
        vertex_count,
        quads.batches.len()
    );
    for face in Face::ALL {
        info!("  {:?}: {} quads", face, face_counts[face.index() as usize]);
    }
    info!("World bounds {:?} .. {:?}", min.as_ivec3(), max.as_ivec3());
    info!(
        "Average brightness {:.3}",
        brightness_sum / vertex_count.max(1) as f64
    );
}
