fn main() {
    if let Err(err) = order_insights::run() {
        eprintln!("error: {err:#}");
        if let Some(hint) = order_insights::failure_hint(&err) {
            eprintln!("{hint}");
        }
        std::process::exit(1);
    }
}
