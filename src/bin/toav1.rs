use towebm::formats::AV1_SVT;

fn main() {
    std::process::exit(towebm::cli::video_main(
        "toav1",
        "Converts videos to AV1 (SVT-AV1 and Opus) using ffmpeg",
        &AV1_SVT,
    ));
}
