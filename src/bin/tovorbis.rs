use towebm::formats::VORBIS;

fn main() {
    std::process::exit(towebm::cli::audio_main(
        "tovorbis",
        "Converts audio tracks to Vorbis using ffmpeg",
        &VORBIS,
    ));
}
