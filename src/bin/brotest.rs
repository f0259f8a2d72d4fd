use std::process::ExitCode;

fn main() -> ExitCode {
    brotest::cli::run()
}
