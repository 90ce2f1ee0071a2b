fn main() {
    if let Err(err) = wipeout_render::run() {
        eprintln!("Application error: {err}");
    }
}
