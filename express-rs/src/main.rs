use express::cli;
use express::{compile, Lookup};

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("express: {e}");
            eprintln!("{}", cli::USAGE);
            std::process::exit(1);
        }
    };

    init_tracing(args.debug);

    let (mut vars, warnings) = match cli::load_vars(&args) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("express: {e}");
            std::process::exit(1);
        }
    };
    for w in &warnings {
        eprintln!("express: warning: {w}");
    }

    let mut expr = match compile(&args.expression) {
        Ok(expr) => expr,
        Err(e) => {
            println!("parse failed: {e}");
            std::process::exit(1);
        }
    };

    if args.show_rpn {
        println!("rpn = {expr}");
    }

    let lookup = vars.as_mut().map(|v| v as &mut dyn Lookup);
    println!("result = {}", expr.evaluate(lookup));
}

/// Log to stderr. `RUST_LOG` wins; `-d` alone means `express=debug`, and
/// otherwise only warnings are shown.
fn init_tracing(debug: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let fallback = if debug { "express=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_level(true)
                .without_time(),
        )
        .with(filter)
        .init();
}
