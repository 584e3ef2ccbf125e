use crate::session::{InputError, Session};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Reading of the header, markup and query lines, and answering of the queries
mod session;

#[derive(Debug)]
struct Args {
    /// Read from this file instead of stdin. `-` also means stdin.
    pub input: Option<String>,
    pub trace: bool,
}

fn main() {
    let args = match parse_args(pico_args::Arguments::from_env()) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("usage: tagquery [--trace] [INPUT]");
            process::exit(2);
        }
    };
    if args.trace {
        tracing_subscriber::fmt::fmt()
            .with_span_events(FmtSpan::ACTIVE)
            .with_max_level(Level::DEBUG)
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(io::stderr)
            .finish()
            .init();
        info!("Logger initialized");
    }

    if let Err(e) = run(&args) {
        error!("{}", e);
        eprintln!("error: {}", e);
        process::exit(1);
    }
}

fn parse_args(mut pargs: pico_args::Arguments) -> Result<Args, pico_args::Error> {
    let args = Args {
        trace: pargs.contains(["-t", "--trace"]),
        input: pargs.opt_free_from_str()?,
    };
    let rest = pargs.finish();
    if !rest.is_empty() {
        return Err(pico_args::Error::ArgumentParsingFailed {
            cause: format!("unexpected arguments: {:?}", rest),
        });
    }
    Ok(args)
}

#[cfg(test)]
fn args_from(args: &[&str]) -> Result<Args, pico_args::Error> {
    parse_args(pico_args::Arguments::from_vec(
        args.iter().map(std::ffi::OsString::from).collect(),
    ))
}

#[cfg(test)]
#[test]
fn test_parse_args() {
    let args = args_from(&[]).unwrap();
    assert_eq!((args.input, args.trace), (None, false));

    let args = args_from(&["--trace", "input.txt"]).unwrap();
    assert_eq!((args.input.as_deref(), args.trace), (Some("input.txt"), true));

    let args = args_from(&["-t", "-"]).unwrap();
    assert_eq!((args.input.as_deref(), args.trace), (Some("-"), true));

    let err = args_from(&["one.txt", "two.txt"]).unwrap_err();
    assert!(matches!(err, pico_args::Error::ArgumentParsingFailed { .. }));
    assert!(err.to_string().contains("two.txt"));
}

fn run(args: &Args) -> Result<(), InputError> {
    let session = match args.input.as_deref() {
        None | Some("-") => Session::read(io::stdin().lock())?,
        Some(path) => Session::read(BufReader::new(File::open(path)?))?,
    };
    info!(queries = session.queries.len(), "Answering queries");

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    session.answer(&mut out)?;
    out.flush()?;
    Ok(())
}
