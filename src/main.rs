fn main() {
    if let Err(err) = dq_charts::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
