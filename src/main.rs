use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(err) = odgrowth::app::run() {
        eprintln!("odgrowth: {err}");
        return ExitCode::from(err.exit_code());
    }
    ExitCode::SUCCESS
}
