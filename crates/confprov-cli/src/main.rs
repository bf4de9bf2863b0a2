use std::process::ExitCode;

fn main() -> ExitCode {
    confprov_cli::run()
}
