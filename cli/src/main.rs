use std::error::Error;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use clap::{ArgAction, Parser, ValueEnum};
use formtree::{ArrayNotation, BuildOptions, FlattenOptions, Schema};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "formtree", version, about = "Rebuild nested JSON from form data")]
struct Args {
    /// Input file path (.json or urlencoded text). Omit or use '-' to read from stdin.
    input: Option<String>,

    /// Output file path (prints to stdout if omitted).
    #[arg(short, long, value_name = "file")]
    output: Option<String>,

    /// JSON schema used to coerce values (integer, number, boolean, time formats).
    #[arg(short, long, value_name = "file")]
    schema: Option<String>,

    /// Input format: auto, urlencoded, json (default: auto).
    #[arg(long = "input-format", value_enum, value_name = "format", default_value_t = InputFormat::Auto)]
    input_format: InputFormat,

    /// Skip fields whose value is the empty string.
    #[arg(long = "remove-empty-string")]
    remove_empty_string: bool,

    /// Field that may repeat and should be collected into an array.
    #[arg(long = "duplicate-key", value_name = "path", action = ArgAction::Append)]
    duplicate_keys: Vec<String>,

    /// Indentation size for JSON output; 0 prints compact JSON (default: 2).
    #[arg(long, value_name = "number", default_value_t = 2)]
    indent: usize,

    /// Read a JSON tree and print it as urlencoded form data instead.
    #[arg(long)]
    flatten: bool,

    /// Array spelling when flattening: indexed, appended (default: indexed).
    #[arg(long = "array-notation", value_enum, value_name = "mode", default_value_t = ArrayNotationArg::Indexed)]
    array_notation: ArrayNotationArg,

    /// Log more detail to stderr (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    Auto,
    Urlencoded,
    Json,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ArrayNotationArg {
    Indexed,
    Appended,
}

impl From<ArrayNotationArg> for ArrayNotation {
    fn from(value: ArrayNotationArg) -> Self {
        match value {
            ArrayNotationArg::Indexed => ArrayNotation::Indexed,
            ArrayNotationArg::Appended => ArrayNotation::Appended,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Build,
    Flatten,
}

#[derive(Debug)]
enum InputSource {
    Stdin,
    File(String),
}

fn main() {
    if let Err(err) = run() {
        eprintln!("ERROR  {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    init_tracing(args.verbose);
    let (input_text, input_source) = read_input(args.input.as_deref())?;

    if args.flatten {
        run_flatten(&args, &input_text, &input_source)
    } else {
        run_build(&args, &input_text, &input_source)
    }
}

fn init_tracing(verbose: u8) {
    let default_filter = match verbose {
        0 => "warn",
        1 => "formtree=debug",
        _ => "formtree=trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn run_build(args: &Args, input: &str, input_source: &InputSource) -> Result<(), Box<dyn Error>> {
    let options = BuildOptions::new()
        .with_remove_empty_string(args.remove_empty_string)
        .with_duplicate_keys(args.duplicate_keys.iter().cloned());

    let format = resolve_format(args.input_format, input_source);
    debug!(?format, "building tree");
    let mut tree = match format {
        InputFormat::Json => {
            let Value::Object(map) = serde_json::from_str::<Value>(input)? else {
                return Err("json input must be an object of path/value pairs".into());
            };
            formtree::build_from_map(&map, &options)?
        }
        _ => formtree::build_from_urlencoded(input, &options)?,
    };

    if let Some(path) = args.schema.as_deref() {
        let schema = Schema::from_json_str(&fs::read_to_string(path)?)?;
        formtree::coerce(&mut tree, &schema)?;
    }

    emit(args, Mode::Build, input_source, |writer| {
        write_json(writer, &tree, args.indent)
    })
}

fn run_flatten(args: &Args, input: &str, input_source: &InputSource) -> Result<(), Box<dyn Error>> {
    let tree: Value = serde_json::from_str(input)?;
    let options = FlattenOptions::new().with_array_notation(args.array_notation.into());
    let encoded = formtree::to_urlencoded_with_options(&tree, &options)?;

    emit(args, Mode::Flatten, input_source, |writer| {
        writer.write_all(encoded.as_bytes())?;
        Ok(())
    })
}

/// Writes the result to the chosen target and confirms file output.
fn emit<F>(args: &Args, mode: Mode, input_source: &InputSource, write: F) -> Result<(), Box<dyn Error>>
where
    F: FnOnce(&mut dyn Write) -> Result<(), Box<dyn Error>>,
{
    let target = OutputTarget::from_arg(args.output.as_deref());
    target.write_with(write)?;
    if let OutputTarget::File(path) = &target {
        report_status(mode, input_source, path);
    }
    Ok(())
}

fn resolve_format(format: InputFormat, input_source: &InputSource) -> InputFormat {
    if format != InputFormat::Auto {
        return format;
    }
    match input_source {
        InputSource::Stdin => InputFormat::Urlencoded,
        InputSource::File(path) => match Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("json") => InputFormat::Json,
            _ => InputFormat::Urlencoded,
        },
    }
}

fn read_input(input: Option<&str>) -> Result<(String, InputSource), Box<dyn Error>> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok((buf, InputSource::Stdin))
        }
        Some(path) => {
            let buf = fs::read_to_string(path)?;
            Ok((buf, InputSource::File(path.to_string())))
        }
    }
}

#[derive(Clone, Debug)]
enum OutputTarget {
    Stdout,
    File(String),
}

impl OutputTarget {
    fn from_arg(output: Option<&str>) -> Self {
        match output {
            Some(path) if path != "-" => OutputTarget::File(path.to_string()),
            _ => OutputTarget::Stdout,
        }
    }

    fn write_with<F>(&self, write: F) -> Result<(), Box<dyn Error>>
    where
        F: FnOnce(&mut dyn Write) -> Result<(), Box<dyn Error>>,
    {
        match self {
            OutputTarget::File(path) => write(&mut fs::File::create(path)?),
            OutputTarget::Stdout => write(&mut io::stdout().lock()),
        }
    }
}

fn write_json(writer: &mut dyn Write, value: &Value, indent: usize) -> Result<(), Box<dyn Error>> {
    if indent == 0 {
        serde_json::to_writer(writer, value)?;
        return Ok(());
    }

    let indent_bytes = vec![b' '; indent];
    let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent_bytes);
    let mut serializer = serde_json::Serializer::with_formatter(writer, formatter);
    value.serialize(&mut serializer)?;
    Ok(())
}

fn report_status(mode: Mode, input_source: &InputSource, output_path: &str) {
    let input_label = match input_source {
        InputSource::Stdin => "stdin",
        InputSource::File(path) => path.as_str(),
    };
    let verb = match mode {
        Mode::Build => "Built",
        Mode::Flatten => "Flattened",
    };
    println!("✔ {verb} {input_label} → {output_path}");
}
