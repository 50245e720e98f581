fn main() {
    if let Err(err) = bracket_topology::run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
