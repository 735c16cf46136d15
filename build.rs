fn main() {
    // ESP-IDF link/env glue is only needed for firmware builds; host-side
    // test builds compile with no default features and skip it.
    if std::env::var_os("CARGO_FEATURE_ESPIDF").is_some() {
        embuild::espidf::sysenv::output();
    }
}
