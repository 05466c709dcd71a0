use towebm::formats::OPUS;

fn main() {
    std::process::exit(towebm::cli::audio_main(
        "toopus",
        "Converts audio tracks to Opus using ffmpeg",
        &OPUS,
    ));
}
