//! growout entry point: CLI wiring over the analytics engine.

use std::path::Path;
use std::process;

use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

use growout::analytics::{
    DashboardPeriod, anticipate_harvests, cage_history, dashboard, overall_summary,
};
use growout::analytics::series::sampling_point;
use growout::config::AnalyticsConfig;
use growout::dataset::{FarmData, Scope};
use growout::feeding::adherence::week_bounds;
use growout::feeding::{ScheduleBook, generate_feeding_schedule, weekly_adherence};
use growout::io::export::{export_harvest_csv, export_history_csv};
use growout::model::{CageId, InvestorId};

/// Parsed CLI arguments.
struct CliArgs {
    dataset_path: Option<String>,
    config_path: Option<String>,
    preset: Option<String>,
    cage: Option<CageId>,
    investor: Option<InvestorId>,
    today: Option<NaiveDate>,
    history_out: Option<String>,
    harvest_out: Option<String>,
    dashboard: Option<DashboardPeriod>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    #[cfg(feature = "api")]
    serve: bool,
    #[cfg(feature = "api")]
    port: u16,
}

fn print_help() {
    eprintln!("growout - growth and feeding analytics for cage aquaculture");
    eprintln!();
    eprintln!("Usage: growout --dataset <path> [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --dataset <path>         Farm dataset (TOML)");
    eprintln!("  --config <path>          Load analytics settings from TOML config file");
    eprintln!("  --preset <name>          Use a built-in preset (default, nursery, grow_out)");
    eprintln!("  --cage <id>              Print history and a suggested schedule for one cage");
    eprintln!("  --investor <id>          Only show one investor's cages");
    eprintln!("  --today <YYYY-MM-DD>     Reference date (default: local date)");
    eprintln!("  --history-out <path>     Export the --cage history to CSV");
    eprintln!("  --harvest-out <path>     Export the harvest outlook to CSV");
    eprintln!("  --dashboard <period>     Period dashboard (day, week, 30days, month, custom)");
    eprintln!("  --from <YYYY-MM-DD>      Start of a custom dashboard period");
    eprintln!("  --to <YYYY-MM-DD>        End of a custom dashboard period");
    #[cfg(feature = "api")]
    {
        eprintln!("  --serve                  Start REST API server after the report");
        eprintln!("  --port <u16>             API server port (default: 3000)");
    }
    eprintln!("  --help                   Show this help message");
    eprintln!();
    eprintln!("If no --config or --preset is given, the default settings are used.");
}

fn next_value(args: &[String], i: &mut usize, flag: &str, what: &str) -> String {
    *i += 1;
    if *i >= args.len() {
        eprintln!("error: {flag} requires a {what} argument");
        process::exit(1);
    }
    args[*i].clone()
}

fn date_value(args: &[String], i: &mut usize, flag: &str) -> NaiveDate {
    let v = next_value(args, i, flag, "date");
    NaiveDate::parse_from_str(&v, "%Y-%m-%d").unwrap_or_else(|_| {
        eprintln!("error: {flag} value \"{v}\" is not a YYYY-MM-DD date");
        process::exit(1);
    })
}

fn parse_args() -> CliArgs {
    let args: Vec<String> = std::env::args().collect();
    let mut cli = CliArgs {
        dataset_path: None,
        config_path: None,
        preset: None,
        cage: None,
        investor: None,
        today: None,
        history_out: None,
        harvest_out: None,
        dashboard: None,
        from: None,
        to: None,
        #[cfg(feature = "api")]
        serve: false,
        #[cfg(feature = "api")]
        port: 3000,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                process::exit(0);
            }
            "--dataset" => cli.dataset_path = Some(next_value(&args, &mut i, "--dataset", "path")),
            "--config" => cli.config_path = Some(next_value(&args, &mut i, "--config", "path")),
            "--preset" => cli.preset = Some(next_value(&args, &mut i, "--preset", "name")),
            "--cage" => {
                let v = next_value(&args, &mut i, "--cage", "u64");
                if let Ok(id) = v.parse::<CageId>() {
                    cli.cage = Some(id);
                } else {
                    eprintln!("error: --cage value \"{v}\" is not a valid cage id");
                    process::exit(1);
                }
            }
            "--investor" => {
                let v = next_value(&args, &mut i, "--investor", "u64");
                if let Ok(id) = v.parse::<InvestorId>() {
                    cli.investor = Some(id);
                } else {
                    eprintln!("error: --investor value \"{v}\" is not a valid investor id");
                    process::exit(1);
                }
            }
            "--today" => cli.today = Some(date_value(&args, &mut i, "--today")),
            "--from" => cli.from = Some(date_value(&args, &mut i, "--from")),
            "--to" => cli.to = Some(date_value(&args, &mut i, "--to")),
            "--dashboard" => {
                let v = next_value(&args, &mut i, "--dashboard", "period");
                match v.parse::<DashboardPeriod>() {
                    Ok(period) => cli.dashboard = Some(period),
                    Err(e) => {
                        eprintln!("error: {e}");
                        process::exit(1);
                    }
                }
            }
            "--history-out" => {
                cli.history_out = Some(next_value(&args, &mut i, "--history-out", "path"));
            }
            "--harvest-out" => {
                cli.harvest_out = Some(next_value(&args, &mut i, "--harvest-out", "path"));
            }
            #[cfg(feature = "api")]
            "--serve" => {
                cli.serve = true;
            }
            #[cfg(feature = "api")]
            "--port" => {
                let v = next_value(&args, &mut i, "--port", "u16");
                if let Ok(p) = v.parse::<u16>() {
                    cli.port = p;
                } else {
                    eprintln!("error: --port value \"{v}\" is not a valid u16");
                    process::exit(1);
                }
            }
            other => {
                eprintln!("error: unknown argument \"{other}\"");
                print_help();
                process::exit(1);
            }
        }
        i += 1;
    }

    cli
}

fn load_config(cli: &CliArgs) -> AnalyticsConfig {
    // --config takes priority, then --preset, then defaults
    let loaded = if let Some(ref path) = cli.config_path {
        AnalyticsConfig::from_toml_file(Path::new(path))
    } else if let Some(ref name) = cli.preset {
        AnalyticsConfig::from_preset(name)
    } else {
        Ok(AnalyticsConfig::defaults())
    };
    let config = loaded.unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    let errors = config.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    config
}

fn print_cage(data: &FarmData, config: &AnalyticsConfig, cage_id: CageId, now: NaiveDateTime) {
    let Some(cage) = data.cage(cage_id) else {
        eprintln!("error: cage {cage_id} not found");
        process::exit(1);
    };

    println!("\n--- Cage {cage_id} History ---");
    let rows = cage_history(data, cage_id, config.feeding.feeding_rate_percent)
        .unwrap_or_else(|e| {
            eprintln!("error: {e}");
            process::exit(1);
        });
    for row in &rows {
        println!("{row}");
    }

    let latest = data.latest_sampling(cage_id).map(|s| sampling_point(data, s));
    let spec = generate_feeding_schedule(cage, latest.as_ref(), &config.feeding, now);
    println!("\n--- Suggested Schedule ---");
    println!(
        "{} ({}, {:.2} kg/day)",
        spec.name,
        spec.method.as_str(),
        spec.total_daily_amount
    );
    for (time, amount) in spec.times.iter().zip(&spec.amounts) {
        println!("  {}  {:.2} kg", time.format("%H:%M"), amount);
    }
}

fn print_dashboard(data: &FarmData, period: DashboardPeriod, cli: &CliArgs, today: NaiveDate) {
    let period = match period {
        DashboardPeriod::Custom { .. } => DashboardPeriod::Custom {
            start: cli.from,
            end: cli.to,
        },
        other => other,
    };
    match period.resolve(today) {
        Ok(range) => println!("\n{}", dashboard(data, range)),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

fn print_adherence(data: &FarmData, config: &AnalyticsConfig, now: NaiveDateTime) {
    let cage_ids: Vec<CageId> = data.cages.iter().map(|c| c.id).collect();
    let book = ScheduleBook::new();
    let generated = book.auto_generate(data, &cage_ids, false, &config.feeding, now);
    for err in &generated.errors {
        tracing::warn!("{err}");
    }

    let (start, end) = week_bounds(now.date());
    match weekly_adherence(data, &book, start, end) {
        Ok(report) => {
            let s = &report.summary;
            println!("\n--- Feeding Adherence {start} to {end} ---");
            println!("Cages:             {}", s.total_cages);
            println!("Active schedules:  {}", s.active_schedules);
            println!("Scheduled feed:    {:.2} kg", s.total_scheduled_feed_kg);
            println!("Consumed feed:     {:.2} kg", s.total_feed_consumed_kg);
            println!("Avg adherence:     {:.1}%", s.average_adherence_pct);
        }
        Err(e) => eprintln!("error: {e}"),
    }
}

fn main() {
    growout::logging::init();
    let cli = parse_args();
    let config = load_config(&cli);

    let Some(ref dataset_path) = cli.dataset_path else {
        eprintln!("error: --dataset is required");
        print_help();
        process::exit(1);
    };
    let data = FarmData::from_toml_file(Path::new(dataset_path)).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    });
    let scope = cli.investor.map_or_else(Scope::all, Scope::investor);
    let data = data.scoped(&scope);

    let now = match cli.today {
        Some(day) => day.and_time(NaiveTime::MIN),
        None => Local::now().naive_local(),
    };

    let outlook = anticipate_harvests(&data, &config.harvest);
    println!("--- Harvest Outlook ---");
    for h in &outlook {
        println!("{h}");
    }

    if let Some(cage_id) = cli.cage {
        print_cage(&data, &config, cage_id, now);
    }

    println!("\n{}", overall_summary(&data));
    if let Some(period) = cli.dashboard {
        print_dashboard(&data, period, &cli, now.date());
    }
    print_adherence(&data, &config, now);

    if let Some(ref path) = cli.harvest_out {
        if let Err(e) = export_harvest_csv(&outlook, Path::new(path)) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Harvest outlook written to {path}");
    }

    if let Some(ref path) = cli.history_out {
        let Some(cage_id) = cli.cage else {
            eprintln!("error: --history-out needs --cage");
            process::exit(1);
        };
        let rows = cage_history(&data, cage_id, config.feeding.feeding_rate_percent)
            .and_then(|rows| export_history_csv(&rows, Path::new(path)));
        if let Err(e) = rows {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("History written to {path}");
    }

    // Start API server if requested
    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let mut state = growout::api::AppState::new(data, config);
        if cli.today.is_some() {
            state.fixed_now = Some(now);
        }
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("error: failed to create tokio runtime: {e}");
            process::exit(1);
        });
        if let Err(e) = rt.block_on(growout::api::serve(Arc::new(state), addr)) {
            eprintln!("error: API server failed: {e}");
            process::exit(1);
        }
    }
}
