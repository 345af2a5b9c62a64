// Main entry point that forwards to the tile-weaver-app binary
fn main() {
    // Exit with the same code as the app
    std::process::exit(match tile_weaver_app::main() {
        Ok(_) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    });
}
