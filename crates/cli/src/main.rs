use std::process::ExitCode;

fn main() -> ExitCode {
    meesaya_cli::run()
}
