use towebm::formats::FLAC;

fn main() {
    std::process::exit(towebm::cli::audio_main(
        "toflac",
        "Converts audio tracks to FLAC using ffmpeg",
        &FLAC,
    ));
}
