mod args;
mod run;

fn main() {
    let argv: Vec<String> = std::env::args().collect();
    let invocation = match args::parse(argv) {
        Ok(inv) => inv,
        Err(e) => {
            // clap's own help/version branches print to stdout and exit 0;
            // everything else is a usage error, exit 1 per §6.
            let _ = e.print();
            std::process::exit(if e.exit_code() == 0 { 0 } else { 1 });
        }
    };

    std::process::exit(run::execute(&invocation));
}
