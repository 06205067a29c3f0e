fn main() -> anyhow::Result<()> {
    skyway_lib::run()
}
