use hikari::{
    closure::{Label, ShaderClosure},
    config::KernelConfig,
    expect,
    math::{vec2, vec3, Spectrum},
    path_state::PathState,
    rng::{lcg_init, lcg_step_f32},
    shader::ShaderData,
};

use std::io::prelude::*;
use std::path::PathBuf;
use std::time::Instant;

const ITERATIONS: usize = 2000000;

fn setup_logger() -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}:{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.level(),
                record.target(),
                record.line().unwrap_or(0),
                message
            ))
        })
        // .level(log::LevelFilter::Debug)
        .level(log::LevelFilter::Info)
        .chain(std::io::stdout())
        .chain(std::fs::File::create("hikari_bench.log")?)
        .apply()?;
    Ok(())
}

fn report(name: &str, elapsed_ns: u128) {
    let elapsed_ms = (elapsed_ns as f64) * 1e-6;
    let ns_per_iter = (elapsed_ns as f64) / (ITERATIONS as f64);
    println!(
        "{:<12} took {:6.1} ms total, {:0.2} ns per iteration",
        name, elapsed_ms, ns_per_iter
    );
}

fn layered_surface(sd: &mut ShaderData) {
    let n = vec3(0.0, 0.0, 1.0);
    sd.closures.clear();
    sd.closures
        .push(ShaderClosure::diffuse(Spectrum::from(0.3), n));
    sd.closures
        .push(ShaderClosure::ggx_reflection(Spectrum::from(0.2), n, 0.3));
    sd.closures
        .push(ShaderClosure::diffuse(Spectrum::from(0.2), n));
    sd.closures
        .push(ShaderClosure::ggx_reflection(Spectrum::from(0.1), n, 0.3));
    sd.closures
        .push(ShaderClosure::emission(Spectrum::from(1.0)));
}

fn bench_merge(config: &KernelConfig) {
    let mut sd = ShaderData::new(config);
    let start = Instant::now();
    for _ in 0..ITERATIONS {
        layered_surface(&mut sd);
        sd.merge_closures();
        if sd.closures.len() != 3 {
            panic!("We only wanted to force the loop to be executed!")
        }
    }
    report("Merge", start.elapsed().as_nanos());
}

fn bench_bsdf_sample(config: &KernelConfig) {
    let mut sd = ShaderData::new(config);
    sd.ng = vec3(0.0, 0.0, 1.0);
    sd.n = sd.ng;
    sd.i = vec3(0.2, 0.1, 1.0).normalized();
    layered_surface(&mut sd);
    sd.merge_closures();

    let mut rng = lcg_init(0x2a);
    let mut pdf_sum = 0.0;
    let start = Instant::now();
    for _ in 0..ITERATIONS {
        sd.randb_closure = lcg_step_f32(&mut rng);
        let u = vec2(lcg_step_f32(&mut rng), lcg_step_f32(&mut rng));
        pdf_sum += sd.bsdf_sample(config, u).pdf;
    }
    report("Bsdf sample", start.elapsed().as_nanos());
    if pdf_sum.is_nan() {
        panic!("We only wanted to force the loop to be executed!")
    }
}

fn bench_path_state(config: &KernelConfig) {
    let sd = ShaderData::new(config);
    let labels = [
        Label::REFLECT | Label::DIFFUSE,
        Label::REFLECT | Label::GLOSSY,
        Label::TRANSMIT | Label::TRANSPARENT,
        Label::TRANSMIT | Label::SINGULAR,
    ];

    let mut continued = 0;
    let start = Instant::now();
    for i in 0..ITERATIONS {
        let mut state = PathState::new(config, i as u32, 0);
        for label in labels {
            state.next(config, label);
            if state.terminate_probability(config, &sd, Spectrum::from(0.5)) > 0.0 {
                continued += 1;
            }
        }
    }
    report("Path state", start.elapsed().as_nanos());
    if continued == 0 {
        panic!("We only wanted to force the loop to be executed!")
    }
}

fn main() {
    if let Err(why) = setup_logger() {
        panic!("{}", why);
    };

    let config = match std::env::args().nth(1) {
        Some(path) => expect!(
            KernelConfig::from_yaml_file(&PathBuf::from(path)),
            "Failed to load kernel config"
        ),
        None => KernelConfig::default(),
    };
    log::info!(
        "Closure capacity {}, max bounce {}",
        config.limits.closure_capacity,
        config.integrator.max_bounce
    );

    bench_merge(&config);
    bench_bsdf_sample(&config);
    bench_path_state(&config);

    println!("Press enter to quit...");
    // Read a single byte and discard
    let _ = std::io::stdin().read(&mut [0u8]);
}
