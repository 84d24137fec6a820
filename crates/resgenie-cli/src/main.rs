use std::process;

fn main() {
    match resgenie_cli::run() {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("resgenie error: {err:#}");
            process::exit(1);
        }
    }
}
