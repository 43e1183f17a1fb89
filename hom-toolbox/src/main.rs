use std::fs;
use std::fs::File;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::{App, Arg, ArgMatches, SubCommand};
use ndarray_npy::NpzWriter;

use hom_toolbox::estimators::hom::{hom_dual, hom_single, DualHomParams, ManualGeometry};
use hom_toolbox::estimators::{g2::g2, IntegrationRequest};
use hom_toolbox::peak_locator;
use hom_toolbox::Histogram;

/// How the histogram is laid out in a whitespace-separated text file.
enum Layout {
    /// One value per line (or a flat stream of values).
    List,
    /// Histogram is one row of the file.
    Lines(usize),
    /// Histogram is one column of the file, with optional header rows.
    Columns { column: usize, skip_rows: usize },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_target(false).init();

    let matches = build_cli().get_matches();
    match matches.subcommand() {
        ("g2", Some(sub)) => {
            let hist = load_histogram(sub.value_of("file").unwrap(), &layout_from(sub)?)?;
            let request = resolve_request(&hist, sub)?;
            let res = g2(&hist, &request)?;
            println!("g2(0) = {:.4} ± {:.4}", res.statistic, res.uncertainty);
        }
        ("hom", Some(sub)) => {
            let hist = load_histogram(sub.value_of("file").unwrap(), &layout_from(sub)?)?;
            let request = resolve_request(&hist, sub)?;
            let res = hom_single(&hist, &request)?;
            println!("V = {:.4} ± {:.4}", res.statistic, res.uncertainty);
        }
        ("hom2", Some(sub)) => run_dual(sub)?,
        _ => bail!("no subcommand given; see --help"),
    }
    Ok(())
}

fn build_cli() -> App<'static, 'static> {
    let geometry_args = [
        Arg::with_name("central")
            .long("central")
            .takes_value(true)
            .help("Bin index of the zero-delay peak (default: inferred)"),
        Arg::with_name("width")
            .long("width")
            .takes_value(true)
            .help("Full peak width in bins (default: inferred)"),
        Arg::with_name("separation")
            .long("separation")
            .takes_value(true)
            .help("Side-peak separation in bins (default: inferred)"),
        Arg::with_name("peaks")
            .long("peaks")
            .takes_value(true)
            .default_value("6")
            .help("Number of side peaks per side used for normalisation"),
        Arg::with_name("no-baseline")
            .long("no-baseline")
            .help("Skip baseline estimation and subtraction"),
        Arg::with_name("layout")
            .long("layout")
            .takes_value(true)
            .possible_values(&["list", "lines", "columns"])
            .default_value("list")
            .help("Text layout of the histogram file"),
        Arg::with_name("row")
            .long("row")
            .takes_value(true)
            .default_value("0")
            .help("Row holding the histogram (layout = lines)"),
        Arg::with_name("column")
            .long("column")
            .takes_value(true)
            .default_value("0")
            .help("Column holding the histogram (layout = columns)"),
        Arg::with_name("skip-rows")
            .long("skip-rows")
            .takes_value(true)
            .default_value("0")
            .help("Header rows to skip (layout = columns)"),
    ];

    App::new("homstat")
        .about("Photon-statistics metrics from coincidence histograms")
        .subcommand(
            SubCommand::with_name("g2")
                .about("Second order coherence g2(0) of one histogram")
                .arg(Arg::with_name("file").required(true).help("Histogram file"))
                .args(&geometry_args)
                .arg(
                    Arg::with_name("skip-first-peak")
                        .long("skip-first-peak")
                        .help("Exclude the side peaks nearest the center from the reference"),
                ),
        )
        .subcommand(
            SubCommand::with_name("hom")
                .about("HOM visibility from one histogram")
                .arg(Arg::with_name("file").required(true).help("Histogram file"))
                .args(&geometry_args)
                .arg(
                    Arg::with_name("skip-first-peak")
                        .long("skip-first-peak")
                        .help("Exclude the side peaks nearest the center from the reference"),
                ),
        )
        .subcommand(
            SubCommand::with_name("hom2")
                .about("HOM visibility from an ortho/para histogram pair")
                .arg(Arg::with_name("ortho").required(true).help("Orthogonal-polarisation histogram"))
                .arg(Arg::with_name("para").required(true).help("Parallel-polarisation histogram"))
                .args(&geometry_args)
                .arg(
                    Arg::with_name("npz")
                        .long("npz")
                        .takes_value(true)
                        .help("Write the normalised curves to this .npz archive"),
                ),
        )
}

fn run_dual(sub: &ArgMatches) -> Result<()> {
    let layout = layout_from(sub)?;
    let ortho = load_histogram(sub.value_of("ortho").unwrap(), &layout)?;
    let para = load_histogram(sub.value_of("para").unwrap(), &layout)?;

    let central = parse_opt::<usize>(sub, "central")?;
    let width = parse_opt::<usize>(sub, "width")?;
    let separation = parse_opt::<usize>(sub, "separation")?;
    let geometry = match (central, separation, width) {
        (Some(central_index), Some(separation), Some(peak_width)) => Some(ManualGeometry {
            central_index,
            separation,
            peak_width,
        }),
        (None, None, None) => None,
        _ => bail!("manual geometry needs all of --central, --separation and --width"),
    };

    let params = DualHomParams {
        num_side_peaks: parse_opt::<usize>(sub, "peaks")?.unwrap_or(6),
        subtract_baseline: !sub.is_present("no-baseline"),
        geometry,
    };
    let res = hom_dual(&ortho, &para, &params)?;
    println!("V = {:.4} ± {:.4}", res.visibility, res.uncertainty);

    if let Some(out) = sub.value_of("npz") {
        let file = File::create(out).with_context(|| format!("cannot create {}", out))?;
        let mut npz = NpzWriter::new(file);
        npz.add_array("ortho_norm", &res.ortho)?;
        npz.add_array("para_norm", &res.para)?;
        npz.finish()?;
        println!("normalised curves written to {}", out);
    }
    Ok(())
}

fn layout_from(matches: &ArgMatches) -> Result<Layout> {
    Ok(match matches.value_of("layout").unwrap_or("list") {
        "lines" => Layout::Lines(parse_opt(matches, "row")?.unwrap_or(0)),
        "columns" => Layout::Columns {
            column: parse_opt(matches, "column")?.unwrap_or(0),
            skip_rows: parse_opt(matches, "skip-rows")?.unwrap_or(0),
        },
        _ => Layout::List,
    })
}

fn load_histogram<P: AsRef<Path>>(path: P, layout: &Layout) -> Result<Histogram> {
    let path = path.as_ref();
    let text =
        fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    parse_histogram(&text, layout).with_context(|| format!("malformed histogram in {}", path.display()))
}

/// Parses a whitespace-separated numeric text dump. Covers the common
/// correlator exports: a flat count list, a two-row index/histogram dump
/// (`--layout lines --row 1`, the Swabian shape) and multi-column ASCII
/// with header lines (`--layout columns --skip-rows N`, the HydraHarp
/// shape). Skipped header rows are never parsed, so they may hold
/// arbitrary text; blank lines and `#` comments are ignored everywhere.
fn parse_histogram(text: &str, layout: &Layout) -> Result<Histogram> {
    let skip = match layout {
        Layout::Columns { skip_rows, .. } => *skip_rows,
        _ => 0,
    };

    let mut rows: Vec<Vec<f64>> = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        if lineno < skip {
            continue;
        }
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let row = line
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<f64>()
                    .with_context(|| format!("line {}: not a number: {:?}", lineno + 1, token))
            })
            .collect::<Result<Vec<f64>>>()?;
        rows.push(row);
    }

    let counts: Vec<f64> = match layout {
        Layout::List => rows.into_iter().flatten().collect(),
        Layout::Lines(row) => rows
            .into_iter()
            .nth(*row)
            .with_context(|| format!("file has no row {}", row))?,
        Layout::Columns { column, .. } => rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                row.get(*column)
                    .copied()
                    .with_context(|| format!("row {} has no column {}", i, column))
            })
            .collect::<Result<Vec<f64>>>()?,
    };

    Ok(Histogram::from_counts(&counts)?)
}

/// Manual flags override the automatically located geometry field by
/// field; location is skipped entirely when all three are given.
fn resolve_request(hist: &Histogram, matches: &ArgMatches) -> Result<IntegrationRequest> {
    let central = parse_opt::<usize>(matches, "central")?;
    let width = parse_opt::<usize>(matches, "width")?;
    let separation = parse_opt::<usize>(matches, "separation")?;
    let num_side_peaks = parse_opt::<usize>(matches, "peaks")?.unwrap_or(6);

    let mut request = match (central, width, separation) {
        (Some(central_index), Some(peak_width), Some(separation)) => IntegrationRequest {
            central_index,
            peak_width,
            separation,
            num_side_peaks,
            subtract_baseline: true,
            skip_first_side_peak: false,
        },
        _ => {
            let geometry = peak_locator::locate(hist).context(
                "automatic peak location failed; pass --central, --width and --separation",
            )?;
            let mut request = IntegrationRequest::from_geometry(&geometry, num_side_peaks);
            if let Some(c) = central {
                request.central_index = c;
            }
            if let Some(w) = width {
                request.peak_width = w;
            }
            if let Some(s) = separation {
                request.separation = s;
            }
            request
        }
    };

    request.subtract_baseline = !matches.is_present("no-baseline");
    request.skip_first_side_peak = matches.is_present("skip-first-peak");
    Ok(request)
}

fn parse_opt<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<Option<T>>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match matches.value_of(name) {
        Some(raw) => Ok(Some(
            raw.parse::<T>()
                .with_context(|| format!("invalid value for --{}: {:?}", name, raw))?,
        )),
        None => Ok(None),
    }
}
