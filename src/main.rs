fn main() {
    if let Err(e) = bizsearch::app::run_cli() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
