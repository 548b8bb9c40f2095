use quote_ngin::WorldConfig;

fn main() -> anyhow::Result<()> {
    let config = match std::env::args().nth(1).as_deref() {
        Some("cube") => WorldConfig::rotating_cube(),
        _ => WorldConfig::default(),
    };
    quote_ngin::run(config)
}
