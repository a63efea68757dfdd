//! Binary entrypoint that starts the Health Hub server.

use std::process::ExitCode;

use health_hub_chat::start_health_hub;

fn main() -> ExitCode {
    start_health_hub::run()
}
