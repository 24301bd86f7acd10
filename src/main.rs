fn main() -> anyhow::Result<()> {
    brrt_pipeline::cli::run_cli()
}
