fn main() {
    if let Err(err) = fishpad_lib::run() {
        log::error!("fishpad failed: {err:#}");
        eprintln!("fishpad failed: {err:#}");
        std::process::exit(1);
    }
}
