use anyhow::{anyhow, Context};
use clap::{ArgAction, Parser, Subcommand};
use rewarded_core::{build_completion_url, parse_reward_offer, CompletionUrlParams, RewardedError};
use rewarded_sdk::RewardedConfig;
use serde_json::{json, Value as JsonValue};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "rewarded", about = "Rewarded ad reward and completion tooling", version)]
struct Cli {
    /// TOML config; defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    json: bool,

    #[arg(long, short, global = true)]
    quiet: bool,

    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Builds the server-side completion URL for a reward.
    CompletionUrl {
        #[arg(long)]
        base_url: String,
        #[arg(long)]
        reward_name: String,
        #[arg(long)]
        reward_amount: String,
        #[arg(long)]
        customer_id: Option<String>,
        #[arg(long)]
        class_name: Option<String>,
        #[arg(long)]
        custom_data: Option<String>,
    },
    /// Parses reward headers the way an ad response is read.
    ParseRewards {
        #[arg(long)]
        currencies: Option<String>,
        #[arg(long)]
        legacy_name: Option<String>,
        #[arg(long)]
        legacy_amount: Option<String>,
    },
    /// Prints when each completion attempt would be sent.
    RetrySchedule,
    /// Prints the default config as TOML.
    ExampleConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);
    match run(&cli) {
        Ok(output) => {
            emit_output(&cli, output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            emit_error(&cli, &err);
            ExitCode::from(1)
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => log::LevelFilter::Error,
        (false, 0) => log::LevelFilter::Warn,
        (false, 1) => log::LevelFilter::Info,
        (false, 2) => log::LevelFilter::Debug,
        (false, _) => log::LevelFilter::Trace,
    };
    let _ = env_logger::Builder::new().filter_level(level).parse_default_env().try_init();
}

fn load_config(cli: &Cli) -> anyhow::Result<RewardedConfig> {
    match &cli.config {
        Some(path) => RewardedConfig::load_from_path(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(RewardedConfig::default()),
    }
}

fn run(cli: &Cli) -> anyhow::Result<JsonValue> {
    match &cli.command {
        Command::CompletionUrl {
            base_url,
            reward_name,
            reward_amount,
            customer_id,
            class_name,
            custom_data,
        } => {
            let config = load_config(cli)?;
            let url = completion_url(
                &config,
                base_url,
                reward_name,
                reward_amount,
                customer_id.as_deref(),
                class_name.as_deref(),
                custom_data.as_deref(),
            )?;
            Ok(json!({ "url": url }))
        }
        Command::ParseRewards { currencies, legacy_name, legacy_amount } => {
            let offer = parse_reward_offer(
                currencies.as_deref(),
                legacy_name.as_deref(),
                legacy_amount.as_deref(),
            )?;
            Ok(json!({
                "available": offer.available,
                "selected": offer.selected,
                "requires_selection": offer.requires_selection(),
            }))
        }
        Command::RetrySchedule => {
            let config = load_config(cli)?;
            Ok(retry_schedule(&config))
        }
        Command::ExampleConfig => Ok(json!({ "toml": RewardedConfig::example_toml()? })),
    }
}

fn completion_url(
    config: &RewardedConfig,
    base_url: &str,
    reward_name: &str,
    reward_amount: &str,
    customer_id: Option<&str>,
    class_name: Option<&str>,
    custom_data: Option<&str>,
) -> anyhow::Result<String> {
    if let Some(data) = custom_data {
        if data.len() > config.custom_data_max_length_bytes {
            log::warn!(
                "custom data is {} bytes, above the {} byte limit",
                data.len(),
                config.custom_data_max_length_bytes
            );
        }
    }
    build_completion_url(&CompletionUrlParams {
        base_url,
        customer_id,
        reward_name: Some(reward_name),
        reward_amount: Some(reward_amount),
        class_name,
        custom_data,
        sdk_version: &config.sdk_version,
        api_version: &config.api_version,
    })
    .ok_or_else(|| anyhow!("base_url must not be empty"))
}

fn retry_schedule(config: &RewardedConfig) -> JsonValue {
    let policy = config.completion.retry_policy();
    let mut starts_at = Duration::ZERO;
    let mut attempts = Vec::new();
    for attempt in 0..policy.max_retries() {
        let delay = policy.retry_delay(i64::from(attempt));
        attempts.push(json!({
            "attempt": attempt + 1,
            "starts_at_ms": duration_ms(starts_at),
            "next_after_ms": duration_ms(delay),
        }));
        starts_at += delay;
    }
    json!({
        "max_retries": policy.max_retries(),
        "request_timeout_ms": duration_ms(policy.request_timeout()),
        "attempts": attempts,
    })
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn machine_code(err: &anyhow::Error) -> &'static str {
    err.downcast_ref::<RewardedError>().map_or("cli_error", |err| err.code().as_str())
}

fn emit_output(cli: &Cli, value: JsonValue) {
    if cli.quiet {
        return;
    }
    let envelope = json!({
        "ok": true,
        "result": value,
    });
    let serialized = if cli.json {
        serde_json::to_string_pretty(&envelope)
    } else {
        serde_json::to_string(&envelope)
    };
    match serialized {
        Ok(serialized) => println!("{serialized}"),
        Err(err) => {
            println!("{{\"ok\":true,\"result\":null,\"warning\":\"serialization failed: {err}\"}}")
        }
    }
}

fn emit_error(cli: &Cli, err: &anyhow::Error) {
    if cli.json {
        let envelope = json!({
            "ok": false,
            "error": {
                "machine_code": machine_code(err),
                "message": format!("{err:#}"),
            },
        });
        match serde_json::to_string_pretty(&envelope) {
            Ok(serialized) => eprintln!("{serialized}"),
            Err(ser_err) => eprintln!(
                "{{\"ok\":false,\"error\":{{\"machine_code\":\"{}\",\"serialization\":\"{ser_err}\"}}}}",
                machine_code(err)
            ),
        }
        return;
    }
    eprintln!("error [{}]: {err:#}", machine_code(err));
}
