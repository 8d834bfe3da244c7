use std::process::ExitCode;

fn main() -> ExitCode {
    digsafe_cli::run()
}
