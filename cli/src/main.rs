use std::env;
use std::io;
use std::io::Write;
use std::process;

use shallowchart::{ChartParser, Grammar, Sentence};
use shallowchart::Err;
use tracing_subscriber::EnvFilter;

fn usage(prog_name: &str) -> String {
  format!(
    r"Usage: {} FILE [options]

Reads one tagged sentence per line from stdin, as space separated
form/lemma/TAG tokens. Extra /lemma/TAG pairs on a token are the tagger's
further k-best alternatives.

Options:
  -h, --help    Print this message
  -c, --chart   Print the parse chart of each alternative (defaults to not printing)

Set RUST_LOG (e.g. RUST_LOG=shallowchart=debug) for parser diagnostics.",
    prog_name
  )
}

fn parse(parser: &ChartParser, id: usize, line: &str, print_chart: bool) -> Result<(), Err> {
  let mut sentence = Sentence::from_tagged(id.to_string(), line)?;
  if sentence.is_empty() {
    return Ok(());
  }

  if print_chart {
    for k in 0..sentence.num_kbest() {
      let mut chart = parser.chart(&sentence, k)?;
      chart.parse()?;
      println!("chart {}:\n{}", k, chart);
    }
  }

  let parsed = parser.analyze(&mut sentence);
  println!(
    "Parsed {} of {} alternative{}",
    parsed,
    sentence.num_kbest(),
    if sentence.num_kbest() == 1 { "" } else { "s" }
  );

  for k in 0..sentence.num_kbest() {
    match sentence.parse_tree(k) {
      Some(t) => println!("{}\n", t),
      None => println!("(no tree for alternative {})\n", k),
    }
  }

  Ok(())
}

struct Args {
  filename: String,
  print_chart: bool,
}

impl Args {
  fn make_error_message(msg: &str, prog_name: impl AsRef<str>) -> String {
    format!("argument error: {}.\n\n{}", msg, usage(prog_name.as_ref()))
  }

  fn parse(v: Vec<String>) -> Result<Self, String> {
    let mut iter = v.into_iter();
    let prog_name = match iter.next() {
      Some(p) => p,
      None => return Err(Self::make_error_message("bad argument vector", "shallowchart")),
    };

    let mut filename: Option<String> = None;
    let mut print_chart = false;

    for o in iter {
      if o == "-h" || o == "--help" {
        println!("{}", usage(&prog_name));
        process::exit(0);
      } else if o == "-c" || o == "--chart" {
        print_chart = true;
      } else if filename.is_none() {
        filename = Some(o);
      } else {
        return Err(Self::make_error_message("invalid arguments", prog_name));
      }
    }

    match filename {
      Some(filename) => Ok(Self {
        filename,
        print_chart,
      }),
      None => Err(Self::make_error_message("missing filename", prog_name)),
    }
  }
}

fn main() -> Result<(), Err> {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .with_writer(io::stderr)
    .init();

  let opts = match Args::parse(env::args().collect()) {
    Ok(opts) => opts,
    Err(msg) => {
      eprintln!("{}", msg);
      process::exit(255);
    }
  };

  let g = Grammar::read_from_file(&opts.filename)?;
  let parser = ChartParser::new(&g);
  tracing::info!(file = %opts.filename, start = g.start_symbol(), "grammar ready");

  let mut input = String::new();
  let mut id = 0;
  loop {
    print!("> ");
    io::stdout().flush()?;

    input.clear();
    if io::stdin().read_line(&mut input)? == 0 {
      // ctrl+d
      return Ok(());
    }

    id += 1;
    if let Err(e) = parse(&parser, id, input.trim(), opts.print_chart) {
      eprintln!("error: {}", e);
    }
  }
}
