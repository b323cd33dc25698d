use house_schedule::cli::Cli;
use log::error;

fn main() {
    // Logging is started inside handle_command_line once the config is loaded.
    // RUST_LOG overrides the configured level:
    // ERROR → WARN → INFO → DEBUG → TRACE
    if let Err(err) = Cli::handle_command_line() {
        error!("{:?}", err);
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
