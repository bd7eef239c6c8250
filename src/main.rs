use anyhow::Result;

fn main() -> Result<()> {
    env_logger::init();
    theme_backdrop::run_from_env()
}
