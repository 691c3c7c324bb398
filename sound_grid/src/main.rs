//! sound_grid — installation entry point.

use sound_grid::app::run;
use sound_grid::config::{InstallationConfig, CONFIG_ENV};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║          Sound Grid — hand-tracked layered soundscape        ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    #[cfg(feature = "leap")]
    println!("  Mode: LeapMotion hardware");
    #[cfg(not(feature = "leap"))]
    println!("  Mode: Mouse simulation  (use --features leap for hardware)");
    println!("  Config: set {} to a JSON file to override defaults", CONFIG_ENV);
    println!();
    println!("  Space = start / pause    F = fist    H = second hand    Q = quit");
    println!();

    let cfg = match InstallationConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            log::error!("[{}] {}", e.error_code(), e);
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cfg) {
        log::error!("[{}] {}", e.error_code(), e);
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
