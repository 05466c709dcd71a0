fn main() {
    std::process::exit(towebm::concat::ffcat_main());
}
