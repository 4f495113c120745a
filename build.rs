fn main() {
    // Export ESP-IDF link arguments when the espidf feature is active.
    // Host builds (--no-default-features) skip this and link nothing.
    if std::env::var("CARGO_FEATURE_ESPIDF").is_ok() {
        embuild::espidf::sysenv::output();
    }
}
