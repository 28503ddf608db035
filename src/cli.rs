//! Command-line argument parsing for cheapcharge

/// Parse command line arguments
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Args {
    pub once: bool,
    pub dry_run: bool,
    pub validate: bool,
    pub help: bool,
}

pub fn parse_args() -> Args {
    let args: Vec<String> = std::env::args().collect();
    parse_args_from(&args)
}

/// Parse an argument list whose first element is the program name
pub fn parse_args_from(args: &[String]) -> Args {
    let mut result = Args::default();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--once" => result.once = true,
            "--dry-run" => {
                result.dry_run = true;
                result.once = true; // A dry run never loops
            }
            "--validate" => result.validate = true,
            "--help" | "-h" => result.help = true,
            _ => {}
        }
    }

    result
}

pub fn print_help() {
    println!("cheapcharge - Schedule battery charging in the cheapest Agile slots\n");
    println!("USAGE:");
    println!("    cheapcharge [OPTIONS]\n");
    println!("OPTIONS:");
    println!("    --once          Plan and program tomorrow's charging, then exit");
    println!("    --dry-run       Log tomorrow's plan without contacting the inverter (implies --once)");
    println!("    --validate      Validate configuration and exit");
    println!("    --help, -h      Show this help message\n");
    println!("Without options, runs daily at RUN_HOUR_UTC (default 17:00 UTC).\n");
    println!("ENVIRONMENT:");
    println!("    GROWATT_USERNAME, GROWATT_PASSWORD, SERIAL_NUMBER (required)");
    println!("    COST_THRESHOLD (pence, default 25), OCTOPUS_URL, GROWATT_URL,");
    println!("    CHARGE_POWER_PERCENT, CHARGE_STOP_PERCENT, RUN_HOUR_UTC");
}
