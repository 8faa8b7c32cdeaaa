// Commands and the display refresh share one thread, like the meter's event loop.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    taximeter_lib::run().await
}
