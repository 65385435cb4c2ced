use std::process::ExitCode;

fn main() -> ExitCode {
    footprint_cli::run()
}
