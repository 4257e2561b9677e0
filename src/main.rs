fn main() {
    if let Err(err) = shape_probe::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
