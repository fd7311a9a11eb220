fn main() {
    if let Err(e) = integrityd::run() {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
