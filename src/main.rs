// src/main.rs

use utrun::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level) {
        eprintln!("utrun error: {err:?}");
        std::process::exit(1);
    }

    match run(args).await {
        Ok(outcome) if outcome.success() => {}
        Ok(_) => std::process::exit(1),
        Err(err) => {
            eprintln!("utrun error: {err:?}");
            std::process::exit(1);
        }
    }
}
