use std::process::ExitCode;

fn main() -> ExitCode {
    licaudit::app::startup::startup()
}
