//! Health Hub server binary.
//! Run with: cargo run --bin health-hub-server

use std::process::ExitCode;

use health_hub_chat::start_health_hub;

fn main() -> ExitCode {
    start_health_hub::run()
}
