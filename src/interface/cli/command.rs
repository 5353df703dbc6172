//! CLI 명령 파싱 모듈.

use std::path::PathBuf;

use clap::Parser;
use clap::error::ErrorKind;

use crate::domain::statement::SYNTAX_HELP;
use crate::infrastructure::store::StoreOptions;

#[derive(Debug, Parser)]
#[command(name = "kvsh", version)]
#[command(about = "Inspect and edit an embedded key-value store")]
#[command(after_help = SYNTAX_HELP)]
pub struct Cli {
    /// The store's index directory
    #[arg(long, value_name = "PATH")]
    dir: Option<PathBuf>,

    /// The store's value directory, if different from the index directory
    #[arg(long, value_name = "PATH")]
    value_dir: Option<PathBuf>,

    /// Statement to run once; no statement starts the interactive shell
    #[arg(value_name = "STATEMENT", trailing_var_arg = true)]
    statement: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Interactive,
    Batch(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliAction {
    pub store: StoreOptions,
    pub mode: RunMode,
}

impl Cli {
    /// 프로세스 인자를 해석한다.
    /// `--help`/`--version`은 출력 후 0으로, 해석 불가능한 인자는 1로 종료한다.
    pub fn parse_action() -> Result<CliAction, String> {
        let cli = match Cli::try_parse() {
            Ok(cli) => cli,
            Err(err) => match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
                _ => {
                    let _ = err.print();
                    std::process::exit(1);
                }
            },
        };
        cli.into_action()
    }

    pub fn into_action(self) -> Result<CliAction, String> {
        let Some(dir) = self.dir else {
            return Err("--dir not supplied".to_string());
        };

        let mode = if self.statement.is_empty() {
            RunMode::Interactive
        } else {
            RunMode::Batch(self.statement)
        };

        Ok(CliAction {
            store: StoreOptions::new(dir, self.value_dir),
            mode,
        })
    }
}
