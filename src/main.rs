use std::path::PathBuf;

#[derive(Debug, Default)]
struct CliArgs {
    config_dir: Option<PathBuf>,
    app: Option<String>,
    interval_ms: Option<u64>,
    no_trivia: bool,
}

fn main() -> anyhow::Result<()> {
    let args = parse_args(std::env::args().skip(1).collect())?;

    let root = match args.config_dir {
        Some(dir) => dir,
        None => tune_remote::config::config_root()?,
    };
    let mut settings = tune_remote::config::load_settings(&root)?;
    if let Some(app) = args.app {
        settings.player_app = app;
    }
    if let Some(interval_ms) = args.interval_ms {
        settings.poll_interval_ms = interval_ms;
    }
    if args.no_trivia {
        settings.trivia.enabled = false;
    }

    tune_remote::app::run(tune_remote::app::AppStartupOptions {
        config_root: root,
        settings,
    })
}

fn parse_args(args: Vec<String>) -> anyhow::Result<CliArgs> {
    let mut out = CliArgs::default();
    let mut index = 0;
    while index < args.len() {
        match args[index].as_str() {
            "--config-dir" => {
                index += 1;
                out.config_dir = Some(PathBuf::from(required_value(&args, index, "--config-dir")?));
            }
            "--app" => {
                index += 1;
                out.app = Some(required_value(&args, index, "--app")?);
            }
            "--interval" => {
                index += 1;
                let raw = required_value(&args, index, "--interval")?;
                let Ok(value) = raw.parse::<u64>() else {
                    anyhow::bail!("--interval expects milliseconds, got {raw}");
                };
                out.interval_ms = Some(value);
            }
            "--no-trivia" => out.no_trivia = true,
            "-h" | "--help" => {
                print_help();
                std::process::exit(0);
            }
            other => anyhow::bail!("unknown argument {other}"),
        }
        index += 1;
    }
    Ok(out)
}

fn required_value(args: &[String], index: usize, flag: &str) -> anyhow::Result<String> {
    let Some(value) = args.get(index) else {
        anyhow::bail!("{flag} requires a value");
    };
    if value.trim().is_empty() {
        anyhow::bail!("{flag} cannot be empty");
    }
    Ok(value.trim().to_string())
}

fn print_help() {
    println!("tune-remote");
    println!("  --config-dir path   Settings and log directory");
    println!("  --app name          Player application to control (default Music)");
    println!("  --interval ms       Poll period in milliseconds (default 1000)");
    println!("  --no-trivia         Disable track trivia lookups");
}
