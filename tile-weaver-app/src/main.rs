//! # Tile Weaver (Binary)
//!
//! Main executable entry point.

fn main() {
    std::process::exit(match tile_weaver_app::main() {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    });
}
