fn main() {
    avm_conformance::cli::run();
}
