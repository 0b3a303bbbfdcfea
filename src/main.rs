// Reply Cabin — binary entry point.
// All logic lives in the library crate.

#[tokio::main(flavor = "current_thread")]
async fn main() -> std::process::ExitCode {
    reply_cabin_lib::run().await
}
