fn main() {
    attest::cli::run();
}
