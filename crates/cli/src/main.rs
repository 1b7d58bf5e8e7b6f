use std::process::ExitCode;

fn main() -> ExitCode {
    foody_cli::run()
}
