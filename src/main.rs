#![deny(clippy::unwrap_used)]
#![warn(clippy::all, clippy::perf, clippy::missing_const_for_fn)]

use clap::Parser;
use log::{debug, info, LevelFilter};
use meshview_core::prelude::*;
use meshview_shared::exporter::{self, converted_name};
use meshview_shared::loader::route;
use meshview_shared::prelude::*;
use simple_logger::SimpleLogger;


#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(required = true, help = "The model file to load (.stl or .obj)")]
    input: String,
    #[arg(
        short = 'o',
        conflicts_with = "convert",
        help = "Export the loaded model to this path. The extension picks the format (.stl or .obj)"
    )]
    output: Option<String>,
    #[arg(
        long = "convert",
        value_parser = parse_format,
        help = "Export next to the input as <name>_converted.<format> (stl or obj)"
    )]
    convert: Option<FormatKind>,
    #[arg(short = 'v', action = clap::ArgAction::Count, conflicts_with = "message", help = "Sets the level of verbosity")]
    verbose: u8,
    #[arg(short = 's', conflicts_with = "settings_json", help = "Sets the settings file to use")]
    settings_file_path: Option<String>,
    #[arg(short = 'S', help = "The contents of a hjson settings file.")]
    settings_json: Option<String>,
    #[arg(
        short = 'm',
        help = "Use the Message System (useful for interprocess communication)"
    )]
    message: bool,
    #[arg(
        long = "render-mode",
        default_value = "solid",
        help = "Render mode handed to the viewer with the model (solid or wireframe)"
    )]
    render_mode: RenderMode,
    #[arg(
        short = 'j',
        help = "Sets the number of threads to use in the thread pool (defaults to number of CPUs)"
    )]
    thread_count: Option<usize>,
}

fn parse_format(s: &str) -> Result<FormatKind, String> {
    route(s).map_err(|err| err.to_string())
}

fn main() {
    let args: Args = Args::parse();

    // set number of cores for rayon
    if let Some(number_of_threads) = args.thread_count {
        rayon::ThreadPoolBuilder::new()
            .num_threads(number_of_threads)
            .build_global()
            .expect("Only call to build global");
    }

    let send_messages = args.message;

    if !send_messages {
        // Vary the output based on how many times the user used the "verbose" flag
        // (i.e. 'myprog -v -v -v' or 'myprog -vvv' vs 'myprog -v'
        SimpleLogger::new()
            .with_level(match args.verbose {
                0 => LevelFilter::Error,
                1 => LevelFilter::Warn,
                2 => LevelFilter::Info,
                3 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            })
            .init()
            .expect("Only Logger Setup");
    }

    let settings = handle_err_or_return(load_settings_from_args(&args), send_messages);

    let data = handle_err_or_return(
        input::read_model_file(&args.input, &settings),
        send_messages,
    );

    if send_messages {
        handle_err_or_return(run(&args, &settings, &data, &mut MessageCallbacks), send_messages);
    } else {
        let mut callbacks = ProfilingCallbacks::new();
        handle_err_or_return(run(&args, &settings, &data, &mut callbacks), send_messages);
        info!("Done in {} ms", callbacks.total_elapsed_millis());
    }
}

fn load_settings_from_args(args: &Args) -> Result<Settings, DecodeError> {
    if let Some(json) = &args.settings_json {
        load_settings(None, json)
    } else if let Some(path) = &args.settings_file_path {
        let settings_json = input::load_settings_json(path)?;
        load_settings(Some(path), &settings_json)
    } else {
        debug!("No settings given, using defaults");
        Ok(Settings::default())
    }
}

fn run(
    args: &Args,
    settings: &Settings,
    data: &[u8],
    callbacks: &mut impl PipelineCallbacks,
) -> Result<(), DecodeError> {
    let model = load_pipeline(data, &args.input, args.render_mode, settings, callbacks)?;

    let destination = args
        .output
        .clone()
        .or_else(|| args.convert.map(|format| converted_name(&args.input, format)));

    match destination {
        Some(path) => {
            let (name, encoded) = export_pipeline(&model, Some(&path), settings, callbacks)?;
            callbacks.handle_state_update("Saving");
            exporter::save(&name, &encoded)?;
            info!("Saved {}", name);
        }
        // in message mode the receiver gets the STL bytes to save itself
        None if args.message => {
            export_pipeline(&model, None, settings, callbacks)?;
        }
        None => {}
    }

    Ok(())
}

fn handle_err_or_return<T>(res: Result<T, DecodeError>, send_message: bool) -> T {
    match res {
        Ok(data) => data,
        Err(err) => {
            if send_message {
                send_error_message(err);
            } else {
                show_error_message(&err);
            }
            std::process::exit(-1);
        }
    }
}
