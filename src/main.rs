fn main() {
    if let Err(err) = proctor_lib::run() {
        eprintln!("{err:#}");
        std::process::exit(1);
    }
}
