use yearline::run;

fn main() -> anyhow::Result<()> {
    run()
}
