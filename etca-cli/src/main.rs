use std::process::ExitCode;

fn main() -> ExitCode {
    match etca_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("etca-dis: {err}");
            ExitCode::FAILURE
        }
    }
}
