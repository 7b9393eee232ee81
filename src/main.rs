fn main() {
    if let Err(err) = proxsave::cli::run() {
        eprintln!("{:#}", err);
        std::process::exit(2);
    }
}
