fn main() {
    std::process::exit(rounds::run());
}
