use towebm::formats::VP9;

fn main() {
    std::process::exit(towebm::cli::video_main(
        "towebm",
        "Converts videos to WebM (VP9 and Opus) using a two-pass ffmpeg encode",
        &VP9,
    ));
}
