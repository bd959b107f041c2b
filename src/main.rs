use anyhow::Result;

fn main() -> Result<()> {
    wubinput::cli::run()
}
