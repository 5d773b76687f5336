//! Binary entrypoint for the relay bot server.

use std::process::ExitCode;

use relay_bot::start_relay_bot;

fn main() -> ExitCode {
    start_relay_bot::run()
}
