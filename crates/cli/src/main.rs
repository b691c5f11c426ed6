use std::process::ExitCode;

fn main() -> ExitCode {
    stocktalk_cli::run()
}
