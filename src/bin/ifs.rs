// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use clap::{App, Arg, ArgMatches};
use failure::Error;
use std::ops::RangeInclusive;
use std::path::Path;
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ifs::{
    render_threaded, Evaluator, Point, Preset, RandomEvaluator, Raster, Region, Selection, Shading,
};

// "640x480" or "-1.5,2" style arguments.
fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    let (left, right) = s.split_once(separator)?;
    Some((left.trim().parse().ok()?, right.trim().parse().ok()?))
}

fn parse_point(s: &str) -> Option<Point> {
    parse_pair(s, ',').map(|(x, y)| Point::new(x, y))
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    parse_pair::<T>(s, separator)
        .map(|_| ())
        .ok_or_else(|| err.to_string())
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    range: RangeInclusive<T>,
    parse_err: &str,
    range_err: &str,
) -> Result<(), String> {
    let value = T::from_str(s).map_err(|_| parse_err.to_string())?;
    if range.contains(&value) {
        Ok(())
    } else {
        Err(range_err.to_string())
    }
}

const OUTPUT: &str = "output";
const PRESET: &str = "preset";
const SIZE: &str = "size";
const LEFTLOWER: &str = "leftlower";
const RIGHTUPPER: &str = "rightupper";
const POINTS: &str = "points";
const ITERATIONS: &str = "iterations";
const ITERATION: &str = "iteration";
const BURN_IN: &str = "burn-in";
const THREADS: &str = "threads";
const SEED: &str = "seed";
const SHADING: &str = "shading";

fn args<'a>() -> ArgMatches<'a> {
    let max_threads = num_cpus::get();

    App::new("ifs")
        .version("0.1.0")
        .about("Iterated function system renderer")
        .arg(
            Arg::with_name(OUTPUT)
                .required(true)
                .long(OUTPUT)
                .short("o")
                .takes_value(true)
                .help("Output file; the format follows the extension"),
        )
        .arg(
            Arg::with_name(PRESET)
                .long(PRESET)
                .short("p")
                .takes_value(true)
                .possible_values(&["sierpinski", "fern"])
                .default_value("fern")
                .help("System to render"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("500x500")
                .validator(|s| validate_pair::<u16>(&s, 'x', "Could not parse output image size"))
                .help("Size of output image"),
        )
        .arg(
            Arg::with_name(LEFTLOWER)
                .long(LEFTLOWER)
                .short("l")
                .takes_value(true)
                .allow_hyphen_values(true)
                .requires(RIGHTUPPER)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse left lower corner"))
                .help("Left lower corner of the plotted region (default: the preset's)"),
        )
        .arg(
            Arg::with_name(RIGHTUPPER)
                .long(RIGHTUPPER)
                .short("r")
                .takes_value(true)
                .allow_hyphen_values(true)
                .requires(LEFTLOWER)
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse right upper corner"))
                .help("Right upper corner of the plotted region (default: the preset's)"),
        )
        .arg(
            Arg::with_name(POINTS)
                .long(POINTS)
                .short("n")
                .takes_value(true)
                .default_value("10000")
                .validator(|s| {
                    validate_range(
                        &s,
                        1_usize..=10_000_000,
                        "Could not parse point count",
                        "Point count must be between 1 and 10000000",
                    )
                })
                .help("Number of random seed points"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("100")
                .validator(|s| {
                    validate_range(
                        &s,
                        1_usize..=1_000_000,
                        "Could not parse iteration count",
                        "Iteration count must be between 1 and 1000000",
                    )
                })
                .help("Number of iterations per seed point"),
        )
        .arg(
            Arg::with_name(ITERATION)
                .long(ITERATION)
                .takes_value(true)
                .conflicts_with(BURN_IN)
                .validator(|s| {
                    usize::from_str(&s)
                        .map(|_| ())
                        .map_err(|_| "Could not parse iteration index".to_string())
                })
                .help("Plot only the point after this many steps (default: the last)"),
        )
        .arg(
            Arg::with_name(BURN_IN)
                .long(BURN_IN)
                .short("b")
                .takes_value(true)
                .validator(|s| {
                    usize::from_str(&s)
                        .map(|_| ())
                        .map_err(|_| "Could not parse burn-in".to_string())
                })
                .help("Plot every point after discarding this many (25 is a good start)"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .default_value("1")
                .validator(move |s| {
                    validate_range(
                        &s,
                        1..=max_threads,
                        "Could not parse thread count",
                        &format!("Thread count must be between 1 and {}", max_threads),
                    )
                })
                .help("Number of threads to use in the evaluator"),
        )
        .arg(
            Arg::with_name(SEED)
                .long(SEED)
                .takes_value(true)
                .validator(|s| {
                    u64::from_str(&s)
                        .map(|_| ())
                        .map_err(|_| "Could not parse seed".to_string())
                })
                .help("Seed for a reproducible render"),
        )
        .arg(
            Arg::with_name(SHADING)
                .long(SHADING)
                .takes_value(true)
                .possible_values(&["white", "transform", "blend"])
                .default_value("white")
                .help("How plotted pixels are coloured"),
        )
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, Error>
where
    T::Err: std::fmt::Display,
{
    let raw = matches
        .value_of(name)
        .ok_or_else(|| failure::err_msg(format!("missing --{}", name)))?;
    T::from_str(raw).map_err(|e| failure::err_msg(format!("bad --{} '{}': {}", name, raw, e)))
}

fn run(matches: &ArgMatches) -> Result<(), Error> {
    let preset: Preset = value(matches, PRESET)?;
    let shading: Shading = value(matches, SHADING)?;
    let points: usize = value(matches, POINTS)?;
    let iterations: usize = value(matches, ITERATIONS)?;
    let threads: usize = value(matches, THREADS)?;

    let (width, height) = matches
        .value_of(SIZE)
        .and_then(|s| parse_pair::<u16>(s, 'x'))
        .ok_or_else(|| failure::err_msg("Error parsing image dimensions"))?;

    let region = match (matches.value_of(LEFTLOWER), matches.value_of(RIGHTUPPER)) {
        (Some(ll), Some(ru)) => {
            let leftlower =
                parse_point(ll).ok_or_else(|| failure::err_msg("Error parsing left lower point"))?;
            let rightupper = parse_point(ru)
                .ok_or_else(|| failure::err_msg("Error parsing right upper point"))?;
            Region::from_corners(leftlower, rightupper)
        }
        _ => preset.region(),
    };

    let selection = if matches.is_present(ITERATION) {
        Selection::Iteration(value(matches, ITERATION)?)
    } else if matches.is_present(BURN_IN) {
        Selection::Tail {
            burn_in: value(matches, BURN_IN)?,
        }
    } else {
        Selection::Last
    };

    // Validate everything before the expensive part.
    let mut raster = Raster::from_region(width as usize, height as usize, region)?;
    let system = preset.system();
    let mut evaluator = RandomEvaluator::new(system.clone(), points, iterations)?
        .with_threads(threads)?;
    if matches.is_present(SEED) {
        evaluator = evaluator.with_seed(value(matches, SEED)?);
    }
    if let Selection::Iteration(i) = selection {
        if i > iterations {
            return Err(failure::err_msg(format!(
                "--iteration {} is past --iterations {}",
                i, iterations
            )));
        }
    }

    info!(%preset, points, iterations, threads, "evaluating");
    let orbits = evaluator.run();
    let stats = render_threaded(&orbits, &system, &mut raster, selection, shading, threads)?;
    info!(
        plotted = stats.plotted,
        dropped = stats.dropped,
        visited = raster.visited(),
        "rendered"
    );

    let output = value::<String>(matches, OUTPUT)?;
    raster.into_image().save(Path::new(&output))?;
    info!(%output, "wrote image");
    Ok(())
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let matches = args();
    if let Err(e) = run(&matches) {
        eprintln!("Render failure: {}", e);
        std::process::exit(1);
    }
}
