//! `kvsh` 바이너리 진입점.

use kvsh::interface::cli::{AppComposition, Cli, RunMode, run_batch, run_repl};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let action = match Cli::parse_action() {
        Ok(action) => action,
        Err(msg) => {
            eprintln!("error: {msg}");
            std::process::exit(1);
        }
    };

    let composition = match AppComposition::open(action.store) {
        Ok(composition) => composition,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    };

    let code = match action.mode {
        RunMode::Batch(tokens) => run_batch(&composition, &tokens),
        RunMode::Interactive => match run_repl(&composition) {
            Ok(()) => 0,
            Err(err) => {
                eprintln!("error: {err:#}");
                1
            }
        },
    };

    // process::exit 는 소멸자를 건너뛰므로 저장소를 먼저 닫는다.
    drop(composition);
    std::process::exit(code);
}
